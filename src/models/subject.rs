//! Subject model
//!
//! The person being assessed. Appears in report headers and the info box.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Biological sex as recorded at assessment time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            "other" | "o" => Some(Sex::Other),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

/// A subject (student) with a biometric profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub goal: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCreate {
    pub name: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub goal: Option<String>,
}

impl Subject {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: Option<String> = row.get("sex")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            sex: sex.as_deref().and_then(Sex::from_str),
            height_cm: row.get("height_cm")?,
            goal: row.get("goal")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &SubjectCreate) -> DbResult<Self> {
        if data.name.trim().is_empty() {
            return Err(DbError::Invalid {
                field: "name",
                message: "subject name cannot be empty".to_string(),
            });
        }

        conn.execute(
            r#"
            INSERT INTO subjects (name, age, sex, height_cm, goal)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.name.trim(),
                data.age,
                data.sex.map(|s| s.as_str()),
                data.height_cm,
                data.goal,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM subjects WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(subject) => Ok(Some(subject)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List subjects alphabetically
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM subjects ORDER BY name COLLATE NOCASE, id")?;
        let subjects = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    /// Delete a subject and (by cascade) all of their assessments
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM subjects WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_get_subject() {
        let conn = setup();
        let created = Subject::create(
            &conn,
            &SubjectCreate {
                name: "  Ana ".to_string(),
                age: Some(29),
                sex: Some(Sex::Female),
                height_cm: Some(165.0),
                goal: Some("Fat loss".to_string()),
            },
        )
        .unwrap();

        assert_eq!(created.name, "Ana");
        let fetched = Subject::get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched.sex, Some(Sex::Female));
        assert_eq!(fetched.height_cm, Some(165.0));
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let conn = setup();
        let result = Subject::create(
            &conn,
            &SubjectCreate {
                name: "   ".to_string(),
                age: None,
                sex: None,
                height_cm: None,
                goal: None,
            },
        );
        assert!(matches!(result, Err(DbError::Invalid { field: "name", .. })));
    }

    #[test]
    fn test_sex_parsing() {
        assert_eq!(Sex::from_str("F"), Some(Sex::Female));
        assert_eq!(Sex::from_str("male"), Some(Sex::Male));
        assert_eq!(Sex::from_str("unknown"), None);
    }
}
