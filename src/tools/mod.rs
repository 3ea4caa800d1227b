//! Fitrack Tools module
//!
//! MCP tool implementations for subjects, assessments and reports.

pub mod assessments;
pub mod reports;
pub mod status;
pub mod subjects;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::migrations::run_migrations;
    use crate::db::Database;

    pub fn test_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        db
    }
}
