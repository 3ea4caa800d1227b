//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
    }

    Ok(())
}

/// Migration v1: subjects and assessments
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- SUBJECTS
        -- People being assessed
        -- ============================================
        CREATE TABLE subjects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER,
            sex TEXT CHECK(sex IN ('male', 'female', 'other')),
            height_cm REAL,
            goal TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_subjects_name ON subjects(name);

        -- ============================================
        -- ASSESSMENTS
        -- One body-composition snapshot per row
        -- ============================================
        CREATE TABLE assessments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
            date TEXT NOT NULL,                  -- YYYY-MM-DD

            weight_kg REAL,
            body_fat_pct REAL,
            bmi REAL,
            lean_mass_kg REAL,
            fat_mass_kg REAL,

            -- JSON objects: name -> value
            circumferences TEXT NOT NULL DEFAULT '{}',
            tests TEXT NOT NULL DEFAULT '{}',

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_assessments_subject_date ON assessments(subject_id, date);
        "#,
    )?;

    Ok(())
}

/// Migration v2: progress photos, one row per canonical slot
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE assessment_photos (
            assessment_id INTEGER NOT NULL REFERENCES assessments(id) ON DELETE CASCADE,
            slot TEXT NOT NULL CHECK(slot IN ('front', 'right_side', 'left_side', 'back')),
            payload TEXT NOT NULL,               -- base64, with or without data-URI prefix
            PRIMARY KEY (assessment_id, slot)
        );
        "#,
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
