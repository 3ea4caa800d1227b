//! Subject MCP Tools
//!
//! Create, look up and remove the people whose assessments are tracked.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Assessment, Subject, SubjectCreate};

/// Subject summary for listing
#[derive(Debug, Serialize)]
pub struct SubjectSummary {
    pub id: i64,
    pub name: String,
    pub age: Option<u32>,
    pub goal: Option<String>,
}

impl From<&Subject> for SubjectSummary {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name.clone(),
            age: subject.age,
            goal: subject.goal.clone(),
        }
    }
}

/// Full subject detail with assessment range
#[derive(Debug, Serialize)]
pub struct SubjectDetail {
    #[serde(flatten)]
    pub subject: Subject,
    pub sex_display: Option<String>,
    pub assessment_count: usize,
    pub first_assessment: Option<String>,
    pub last_assessment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListSubjectsResponse {
    pub subjects: Vec<SubjectSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteSubjectResponse {
    pub success: bool,
    pub deleted_id: i64,
}

// ============================================================================
// Tool Functions
// ============================================================================

pub fn add_subject(db: &Database, data: SubjectCreate) -> Result<Subject, String> {
    if data.name.trim().is_empty() {
        return Err("Subject name cannot be empty".to_string());
    }
    if let Some(height) = data.height_cm {
        if !(50.0..=260.0).contains(&height) {
            return Err(format!("Height {} cm is out of range (50-260)", height));
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let subject = Subject::create(&conn, &data).map_err(|e| format!("Failed to create subject: {}", e))?;
    tracing::info!(id = subject.id, name = %subject.name, "Subject created");
    Ok(subject)
}

pub fn get_subject(db: &Database, id: i64) -> Result<Option<SubjectDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let subject = match Subject::get_by_id(&conn, id).map_err(|e| format!("Failed to get subject: {}", e))? {
        Some(subject) => subject,
        None => return Ok(None),
    };
    let history =
        Assessment::list_for_subject(&conn, id).map_err(|e| format!("Failed to load assessments: {}", e))?;

    Ok(Some(SubjectDetail {
        sex_display: subject.sex.map(|s| s.display_name().to_string()),
        assessment_count: history.len(),
        first_assessment: history.first().map(|a| a.date.to_string()),
        last_assessment: history.last().map(|a| a.date.to_string()),
        subject,
    }))
}

pub fn list_subjects(db: &Database) -> Result<ListSubjectsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let subjects = Subject::list(&conn).map_err(|e| format!("Failed to list subjects: {}", e))?;

    let summaries: Vec<SubjectSummary> = subjects.iter().map(SubjectSummary::from).collect();
    let total = summaries.len();
    Ok(ListSubjectsResponse {
        subjects: summaries,
        total,
    })
}

/// Delete a subject together with every assessment recorded for them
pub fn delete_subject(db: &Database, id: i64) -> Result<DeleteSubjectResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = Subject::delete(&conn, id).map_err(|e| format!("Failed to delete subject: {}", e))?;
    if !deleted {
        return Err(format!("Subject {} not found", id));
    }
    Ok(DeleteSubjectResponse {
        success: true,
        deleted_id: id,
    })
}
