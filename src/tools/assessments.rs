//! Assessment MCP Tools
//!
//! Record body assessments (measurements, circumferences, performance tests,
//! progress photos) and read a subject's history back.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::Database;
use crate::models::{compute_summary_statistics, Assessment, AssessmentCreate, Subject, SummaryStatistics};

/// Response for add_assessment
#[derive(Debug, Serialize)]
pub struct AddAssessmentResponse {
    pub id: i64,
    pub subject_id: i64,
    pub date: String,
    pub bmi: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    pub photo_slots: Vec<String>,
}

/// Assessment without photo payloads, for listing
#[derive(Debug, Serialize)]
pub struct AssessmentSummary {
    pub id: i64,
    pub date: String,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub bmi: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    pub circumferences: BTreeMap<String, f64>,
    pub tests: BTreeMap<String, f64>,
    pub notes: Option<String>,
    pub photo_slots: Vec<String>,
}

impl From<&Assessment> for AssessmentSummary {
    fn from(a: &Assessment) -> Self {
        Self {
            id: a.id,
            date: a.date.to_string(),
            weight_kg: a.weight_kg,
            body_fat_pct: a.body_fat_pct,
            bmi: a.bmi,
            lean_mass_kg: a.lean_mass_kg,
            fat_mass_kg: a.fat_mass_kg,
            circumferences: a.circumferences.clone(),
            tests: a.tests.clone(),
            notes: a.notes.clone(),
            photo_slots: a.photos.keys().map(|s| s.as_str().to_string()).collect(),
        }
    }
}

/// Response for list_assessments
#[derive(Debug, Serialize)]
pub struct ListAssessmentsResponse {
    pub subject_id: i64,
    pub subject_name: String,
    pub assessments: Vec<AssessmentSummary>,
    pub total: usize,
    pub summary: SummaryStatistics,
}

#[derive(Debug, Serialize)]
pub struct DeleteAssessmentResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fill BMI and lean/fat mass when they can be derived from what was measured
fn fill_derived(data: &mut AssessmentCreate, height_cm: Option<f64>) {
    if data.bmi.is_none() {
        if let (Some(weight), Some(height)) = (data.weight_kg, height_cm) {
            let meters = height / 100.0;
            data.bmi = Some(round1(weight / (meters * meters)));
        }
    }
    if let (Some(weight), Some(fat_pct)) = (data.weight_kg, data.body_fat_pct) {
        let fat_mass = weight * fat_pct / 100.0;
        data.fat_mass_kg.get_or_insert(round1(fat_mass));
        data.lean_mass_kg.get_or_insert(round1(weight - fat_mass));
    }
}

fn validate(data: &AssessmentCreate) -> Result<(), String> {
    let positive = [("weight_kg", data.weight_kg), ("bmi", data.bmi), ("lean_mass_kg", data.lean_mass_kg)];
    for (field, value) in positive {
        if let Some(v) = value {
            if !v.is_finite() || v <= 0.0 {
                return Err(format!("{} must be a positive number", field));
            }
        }
    }
    if let Some(fat) = data.body_fat_pct {
        if !(0.0..=75.0).contains(&fat) {
            return Err("body_fat_pct must be between 0 and 75".to_string());
        }
    }
    if let Some((name, _)) = data.circumferences.iter().find(|(_, v)| !v.is_finite() || **v <= 0.0) {
        return Err(format!("Circumference '{}' must be a positive number", name));
    }
    Ok(())
}

// ============================================================================
// Tool Functions
// ============================================================================

pub fn add_assessment(db: &Database, mut data: AssessmentCreate) -> Result<AddAssessmentResponse, String> {
    validate(&data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let subject = Subject::get_by_id(&conn, data.subject_id)
        .map_err(|e| format!("Failed to get subject: {}", e))?
        .ok_or_else(|| format!("Subject {} not found", data.subject_id))?;

    fill_derived(&mut data, subject.height_cm);
    let assessment =
        Assessment::create(&conn, &data).map_err(|e| format!("Failed to create assessment: {}", e))?;

    tracing::info!(
        id = assessment.id,
        subject = %subject.name,
        date = %assessment.date,
        photos = assessment.photos.len(),
        "Assessment recorded"
    );

    Ok(AddAssessmentResponse {
        id: assessment.id,
        subject_id: assessment.subject_id,
        date: assessment.date.to_string(),
        bmi: assessment.bmi,
        lean_mass_kg: assessment.lean_mass_kg,
        fat_mass_kg: assessment.fat_mass_kg,
        photo_slots: assessment.photos.keys().map(|s| s.as_str().to_string()).collect(),
    })
}

/// Assessment history for a subject, oldest first, with summary statistics
pub fn list_assessments(db: &Database, subject_id: i64) -> Result<ListAssessmentsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let subject = Subject::get_by_id(&conn, subject_id)
        .map_err(|e| format!("Failed to get subject: {}", e))?
        .ok_or_else(|| format!("Subject {} not found", subject_id))?;

    let history = Assessment::list_for_subject(&conn, subject_id)
        .map_err(|e| format!("Failed to list assessments: {}", e))?;
    let summary = compute_summary_statistics(&history);
    let assessments: Vec<AssessmentSummary> = history.iter().map(AssessmentSummary::from).collect();
    let total = assessments.len();

    Ok(ListAssessmentsResponse {
        subject_id,
        subject_name: subject.name,
        assessments,
        total,
        summary,
    })
}

pub fn delete_assessment(db: &Database, id: i64) -> Result<DeleteAssessmentResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = Assessment::delete(&conn, id).map_err(|e| format!("Failed to delete assessment: {}", e))?;
    if !deleted {
        return Err(format!("Assessment {} not found", id));
    }
    Ok(DeleteAssessmentResponse {
        success: true,
        deleted_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhotoSlot, SubjectCreate};
    use crate::tools::subjects::add_subject;
    use crate::tools::test_support::test_db;
    use chrono::NaiveDate;

    fn subject(db: &Database) -> i64 {
        add_subject(
            db,
            SubjectCreate {
                name: "Ana".to_string(),
                age: None,
                sex: None,
                height_cm: Some(160.0),
                goal: None,
            },
        )
        .unwrap()
        .id
    }

    fn entry(subject_id: i64, day: u32, weight: f64) -> AssessmentCreate {
        AssessmentCreate {
            subject_id,
            date: NaiveDate::from_ymd_opt(2024, 3, day),
            weight_kg: Some(weight),
            body_fat_pct: Some(25.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_metrics_filled() {
        let db = test_db();
        let id = subject(&db);
        let added = add_assessment(&db, entry(id, 1, 64.0)).unwrap();
        assert_eq!(added.bmi, Some(25.0));
        assert_eq!(added.fat_mass_kg, Some(16.0));
        assert_eq!(added.lean_mass_kg, Some(48.0));
    }

    #[test]
    fn test_list_is_ascending_with_summary() {
        let db = test_db();
        let id = subject(&db);
        add_assessment(&db, entry(id, 20, 68.5)).unwrap();
        add_assessment(&db, entry(id, 1, 70.0)).unwrap();

        let listed = list_assessments(&db, id).unwrap();
        assert_eq!(listed.total, 2);
        assert_eq!(listed.assessments[0].date, "2024-03-01");
        assert_eq!(listed.summary.weight_delta, Some(-1.5));
    }

    #[test]
    fn test_photo_slots_listed_without_payloads() {
        let db = test_db();
        let id = subject(&db);
        let mut data = entry(id, 1, 70.0);
        data.photos = BTreeMap::from([(PhotoSlot::Front, "aGVsbG8=".to_string())]);
        let added = add_assessment(&db, data).unwrap();
        assert_eq!(added.photo_slots, vec!["front"]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let db = test_db();
        let id = subject(&db);
        assert!(add_assessment(&db, entry(999, 1, 70.0)).is_err());
        assert!(add_assessment(&db, entry(id, 1, -3.0)).is_err());

        let mut fat = entry(id, 1, 70.0);
        fat.body_fat_pct = Some(120.0);
        assert!(add_assessment(&db, fat).is_err());
        assert!(delete_assessment(&db, 12345).is_err());
    }
}
