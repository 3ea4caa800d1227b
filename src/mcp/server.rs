//! Fitrack MCP Server Implementation
//!
//! Exposes subject, assessment and report tools over MCP.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{AssessmentCreate, PhotoSlot, Sex, SubjectCreate};
use crate::report::ReportConfig;
use crate::tools::assessments;
use crate::tools::reports;
use crate::tools::status::StatusTracker;
use crate::tools::subjects;

/// Fitrack MCP Service
#[derive(Clone)]
pub struct FitrackService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    report_config: Arc<ReportConfig>,
    output_dir: PathBuf,
    tool_router: ToolRouter<FitrackService>,
}

impl FitrackService {
    pub fn new(database_path: PathBuf, database: Database, report_config: ReportConfig, output_dir: PathBuf) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path, output_dir.clone()))),
            database,
            report_config: Arc::new(report_config),
            output_dir,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_date(date: Option<&str>) -> Result<Option<NaiveDate>, McpError> {
    date.map(|d| {
        NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|e| McpError::invalid_params(format!("Invalid date '{}': {}", d, e), None))
    })
    .transpose()
}

// ============================================================================
// Subject Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddSubjectParams {
    pub name: String,
    pub age: Option<u32>,
    /// "male" or "female"
    pub sex: Option<String>,
    pub height_cm: Option<f64>,
    pub goal: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SubjectIdParams {
    pub id: i64,
}

// ============================================================================
// Assessment Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddAssessmentParams {
    pub subject_id: i64,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub bmi: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    /// Site name to centimeters, e.g. {"waist": 82.5}
    #[serde(default)]
    pub circumferences: BTreeMap<String, f64>,
    /// Performance test name to result, e.g. {"push_ups": 25}
    #[serde(default)]
    pub tests: BTreeMap<String, f64>,
    pub notes: Option<String>,
    /// Slot (front, right_side, left_side, back) to base64 or data-URI image
    #[serde(default)]
    pub photos: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListAssessmentsParams {
    pub subject_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteAssessmentParams {
    pub id: i64,
}

// ============================================================================
// Report Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateEvolutionReportParams {
    pub subject_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateChartReportParams {
    pub subject_id: i64,
    /// weight, body_fat, bmi or lean_mass
    pub metric: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FitrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the fitrack service including build info, database status, output directory and process information")]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for recording assessments and generating reports. Call this when starting a session or when unsure how to use the tools.")]
    fn report_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::REPORT_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(REPORT_INSTRUCTIONS)]))
    }

    // --- Subjects ---

    #[tool(description = "Register a new subject (the person being assessed)")]
    fn add_subject(&self, Parameters(p): Parameters<AddSubjectParams>) -> Result<CallToolResult, McpError> {
        let sex = match p.sex.as_deref() {
            Some(s) => Some(Sex::from_str(s).ok_or_else(|| {
                McpError::invalid_params(format!("Invalid sex '{}'. Use male or female", s), None)
            })?),
            None => None,
        };
        let data = SubjectCreate {
            name: p.name,
            age: p.age,
            sex,
            height_cm: p.height_cm,
            goal: p.goal,
        };
        let result = subjects::add_subject(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a subject with assessment count and date range")]
    fn get_subject(&self, Parameters(p): Parameters<SubjectIdParams>) -> Result<CallToolResult, McpError> {
        let result = subjects::get_subject(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(detail) => to_json(&detail),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Subject not found", "id": {}}}"#,
                p.id
            ))])),
        }
    }

    #[tool(description = "List all subjects")]
    fn list_subjects(&self) -> Result<CallToolResult, McpError> {
        let result = subjects::list_subjects(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a subject and every assessment recorded for them")]
    fn delete_subject(&self, Parameters(p): Parameters<SubjectIdParams>) -> Result<CallToolResult, McpError> {
        let result = subjects::delete_subject(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Assessments ---

    #[tool(description = "Record an assessment: body measurements, circumferences, performance tests and progress photos. BMI and lean/fat mass are derived when omitted.")]
    fn add_assessment(&self, Parameters(p): Parameters<AddAssessmentParams>) -> Result<CallToolResult, McpError> {
        let mut photos = BTreeMap::new();
        for (slot, payload) in p.photos {
            let slot = PhotoSlot::from_str(&slot).ok_or_else(|| {
                McpError::invalid_params(
                    format!("Invalid photo slot '{}'. Use front, right_side, left_side or back", slot),
                    None,
                )
            })?;
            photos.insert(slot, payload);
        }
        let data = AssessmentCreate {
            subject_id: p.subject_id,
            date: parse_date(p.date.as_deref())?,
            weight_kg: p.weight_kg,
            body_fat_pct: p.body_fat_pct,
            bmi: p.bmi,
            lean_mass_kg: p.lean_mass_kg,
            fat_mass_kg: p.fat_mass_kg,
            circumferences: p.circumferences,
            tests: p.tests,
            notes: p.notes,
            photos,
        };
        let result = assessments::add_assessment(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List a subject's assessments (oldest first, photo payloads omitted) with summary statistics")]
    fn list_assessments(&self, Parameters(p): Parameters<ListAssessmentsParams>) -> Result<CallToolResult, McpError> {
        let result = assessments::list_assessments(&self.database, p.subject_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete an assessment")]
    fn delete_assessment(&self, Parameters(p): Parameters<DeleteAssessmentParams>) -> Result<CallToolResult, McpError> {
        let result = assessments::delete_assessment(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Reports ---

    #[tool(description = "Generate the multi-page Evolution Report PDF for a subject and write it to the output directory")]
    async fn generate_evolution_report(
        &self,
        Parameters(p): Parameters<GenerateEvolutionReportParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = reports::generate_evolution_report(&self.database, &self.report_config, &self.output_dir, p.subject_id)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Generate a single-page PDF with one metric chart (weight, body_fat, bmi or lean_mass) for a subject")]
    async fn generate_chart_report(
        &self,
        Parameters(p): Parameters<GenerateChartReportParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = reports::generate_chart_report(
            &self.database,
            &self.report_config,
            &self.output_dir,
            p.subject_id,
            &p.metric,
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for FitrackService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fitrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Fitness Assessment Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Fitness Assessment Tracker (fitrack) - body assessments and evolution reports. \
                 IMPORTANT: Call report_instructions before recording assessments. \
                 Subjects: add/get/list/delete_subject. \
                 Assessments: add/list/delete_assessment. \
                 Reports: generate_evolution_report (multi-page PDF), generate_chart_report (one chart, one page). \
                 Status: status."
                    .into(),
            ),
        }
    }
}
