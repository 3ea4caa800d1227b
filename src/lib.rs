//! Fitness Assessment Tracker (fitrack) Library
//!
//! Assessment store, paginated report engine and MCP tools.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod report;
pub mod tools;
