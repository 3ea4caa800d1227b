//! Database module
//!
//! SQLite connection pool and schema migrations for the assessment store.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};
