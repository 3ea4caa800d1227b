//! Data models
//!
//! Rust structs representing database entities and derived aggregates.

mod assessment;
mod subject;
mod summary;

pub use assessment::{Assessment, AssessmentCreate, PhotoSlot};
pub use subject::{Sex, Subject, SubjectCreate};
pub use summary::{compute_summary_statistics, SummaryStatistics};
