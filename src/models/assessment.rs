//! Assessment model
//!
//! One body-composition snapshot: weight, body fat, BMI, lean/fat mass,
//! circumferences, physical tests, notes and up to four progress photos.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Canonical body angle for a progress photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoSlot {
    Front,
    RightSide,
    LeftSide,
    Back,
}

impl PhotoSlot {
    /// Grid order: front, right side, left side, back
    pub const ALL: [PhotoSlot; 4] = [
        PhotoSlot::Front,
        PhotoSlot::RightSide,
        PhotoSlot::LeftSide,
        PhotoSlot::Back,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSlot::Front => "front",
            PhotoSlot::RightSide => "right_side",
            PhotoSlot::LeftSide => "left_side",
            PhotoSlot::Back => "back",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "front" => Some(PhotoSlot::Front),
            "right_side" | "right" => Some(PhotoSlot::RightSide),
            "left_side" | "left" => Some(PhotoSlot::LeftSide),
            "back" => Some(PhotoSlot::Back),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PhotoSlot::Front => "Front",
            PhotoSlot::RightSide => "Right Side",
            PhotoSlot::LeftSide => "Left Side",
            PhotoSlot::Back => "Back",
        }
    }

    /// Position in the 2x2 grid as (row, column)
    pub fn grid_cell(&self) -> (usize, usize) {
        match self {
            PhotoSlot::Front => (0, 0),
            PhotoSlot::RightSide => (0, 1),
            PhotoSlot::LeftSide => (1, 0),
            PhotoSlot::Back => (1, 1),
        }
    }
}

/// A single assessment of one subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub subject_id: i64,
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub bmi: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    #[serde(default)]
    pub circumferences: BTreeMap<String, f64>,
    #[serde(default)]
    pub tests: BTreeMap<String, f64>,
    pub notes: Option<String>,
    /// Base64 payloads keyed by slot
    #[serde(default)]
    pub photos: BTreeMap<PhotoSlot, String>,
}

/// Data for creating a new assessment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentCreate {
    pub subject_id: i64,
    pub date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub bmi: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    #[serde(default)]
    pub circumferences: BTreeMap<String, f64>,
    #[serde(default)]
    pub tests: BTreeMap<String, f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: BTreeMap<PhotoSlot, String>,
}

impl Assessment {
    /// Empty assessment for the given subject and date
    pub fn new(subject_id: i64, date: NaiveDate) -> Self {
        Self {
            id: 0,
            subject_id,
            date,
            weight_kg: None,
            body_fat_pct: None,
            bmi: None,
            lean_mass_kg: None,
            fat_mass_kg: None,
            circumferences: BTreeMap::new(),
            tests: BTreeMap::new(),
            notes: None,
            photos: BTreeMap::new(),
        }
    }

    pub fn has_photos(&self) -> bool {
        self.photos.values().any(|p| !p.trim().is_empty())
    }

    fn from_row(row: &Row) -> rusqlite::Result<(Self, String, String)> {
        let date: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let assessment = Self {
            id: row.get("id")?,
            subject_id: row.get("subject_id")?,
            date,
            weight_kg: row.get("weight_kg")?,
            body_fat_pct: row.get("body_fat_pct")?,
            bmi: row.get("bmi")?,
            lean_mass_kg: row.get("lean_mass_kg")?,
            fat_mass_kg: row.get("fat_mass_kg")?,
            circumferences: BTreeMap::new(),
            tests: BTreeMap::new(),
            notes: row.get("notes")?,
            photos: BTreeMap::new(),
        };
        // JSON columns are decoded by the caller so serde errors surface as DbError::Json
        Ok((assessment, row.get("circumferences")?, row.get("tests")?))
    }

    fn hydrate(conn: &Connection, raw: (Self, String, String)) -> DbResult<Self> {
        let (mut assessment, circumferences, tests) = raw;
        assessment.circumferences = serde_json::from_str(&circumferences)?;
        assessment.tests = serde_json::from_str(&tests)?;
        assessment.photos = Self::load_photos(conn, assessment.id)?;
        Ok(assessment)
    }

    fn load_photos(conn: &Connection, assessment_id: i64) -> DbResult<BTreeMap<PhotoSlot, String>> {
        let mut stmt =
            conn.prepare("SELECT slot, payload FROM assessment_photos WHERE assessment_id = ?1")?;
        let rows = stmt
            .query_map([assessment_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(slot, payload)| PhotoSlot::from_str(&slot).map(|s| (s, payload)))
            .collect())
    }

    /// Insert an assessment and its photos atomically
    pub fn create(conn: &Connection, data: &AssessmentCreate) -> DbResult<Self> {
        let date = data
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO assessments (
                subject_id, date, weight_kg, body_fat_pct, bmi, lean_mass_kg, fat_mass_kg,
                circumferences, tests, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.subject_id,
                date.format("%Y-%m-%d").to_string(),
                data.weight_kg,
                data.body_fat_pct,
                data.bmi,
                data.lean_mass_kg,
                data.fat_mass_kg,
                serde_json::to_string(&data.circumferences)?,
                serde_json::to_string(&data.tests)?,
                data.notes,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for (slot, payload) in &data.photos {
            if payload.trim().is_empty() {
                continue;
            }
            tx.execute(
                "INSERT INTO assessment_photos (assessment_id, slot, payload) VALUES (?1, ?2, ?3)",
                params![id, slot.as_str(), payload],
            )?;
        }
        tx.commit()?;

        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM assessments WHERE id = ?1")?;

        let raw = match stmt.query_row([id], Self::from_row) {
            Ok(raw) => raw,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::hydrate(conn, raw).map(Some)
    }

    /// Assessment history for a subject, oldest first
    pub fn list_for_subject(conn: &Connection, subject_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM assessments WHERE subject_id = ?1 ORDER BY date ASC, id ASC",
        )?;
        let raws = stmt
            .query_map([subject_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(|raw| Self::hydrate(conn, raw)).collect()
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM assessments WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{Subject, SubjectCreate};

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let subject = Subject::create(
            &conn,
            &SubjectCreate {
                name: "Ana".to_string(),
                age: None,
                sex: None,
                height_cm: Some(165.0),
                goal: None,
            },
        )
        .unwrap();
        (conn, subject.id)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_create_round_trips_maps_and_photos() {
        let (conn, subject_id) = setup();
        let mut data = AssessmentCreate {
            subject_id,
            date: Some(date("2024-03-01")),
            weight_kg: Some(70.0),
            ..Default::default()
        };
        data.circumferences.insert("waist".to_string(), 80.5);
        data.tests.insert("push_ups".to_string(), 22.0);
        data.photos.insert(PhotoSlot::Front, "aGVsbG8=".to_string());
        data.photos.insert(PhotoSlot::Back, "   ".to_string());

        let created = Assessment::create(&conn, &data).unwrap();
        assert_eq!(created.circumferences.get("waist"), Some(&80.5));
        assert_eq!(created.tests.get("push_ups"), Some(&22.0));
        assert_eq!(created.photos.len(), 1);
        assert!(created.has_photos());
    }

    #[test]
    fn test_list_for_subject_is_ascending() {
        let (conn, subject_id) = setup();
        for d in ["2024-03-31", "2024-03-01", "2024-03-15"] {
            Assessment::create(
                &conn,
                &AssessmentCreate {
                    subject_id,
                    date: Some(date(d)),
                    ..Default::default()
                },
            )
            .unwrap();
        }

        let history = Assessment::list_for_subject(&conn, subject_id).unwrap();
        let dates: Vec<_> = history.iter().map(|a| a.date).collect();
        assert_eq!(dates, vec![date("2024-03-01"), date("2024-03-15"), date("2024-03-31")]);
    }

    #[test]
    fn test_deleting_subject_cascades() {
        let (conn, subject_id) = setup();
        let created = Assessment::create(
            &conn,
            &AssessmentCreate {
                subject_id,
                date: Some(date("2024-03-01")),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(Subject::delete(&conn, subject_id).unwrap());
        assert!(Assessment::get_by_id(&conn, created.id).unwrap().is_none());
    }

    #[test]
    fn test_photo_slot_parsing() {
        assert_eq!(PhotoSlot::from_str("right-side"), Some(PhotoSlot::RightSide));
        assert_eq!(PhotoSlot::from_str("LEFT"), Some(PhotoSlot::LeftSide));
        assert_eq!(PhotoSlot::from_str("top"), None);
        assert_eq!(PhotoSlot::Back.grid_cell(), (1, 1));
    }
}
