//! Report generation tools
//!
//! Load a subject's history from the store, compose the PDF through the
//! report engine and write it to the output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::db::Database;
use crate::models::{compute_summary_statistics, Assessment, Subject};
use crate::report::{self, ChartSource, Metric, MetricChart, ReportConfig};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub subject: String,
    pub assessments: usize,
    pub date_range: String,
    pub bytes: usize,
    pub message: String,
}

fn load_subject_history(db: &Database, subject_id: i64) -> Result<(Subject, Vec<Assessment>), String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let subject = Subject::get_by_id(&conn, subject_id)
        .map_err(|e| format!("Failed to get subject: {}", e))?
        .ok_or_else(|| format!("Subject {} not found", subject_id))?;
    let history = Assessment::list_for_subject(&conn, subject_id)
        .map_err(|e| format!("Failed to load assessments: {}", e))?;
    if history.is_empty() {
        return Err(format!("No assessments recorded for {}", subject.name));
    }
    Ok((subject, history))
}

fn date_range(history: &[Assessment]) -> String {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
        _ => String::new(),
    }
}

fn write_pdf(path: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(path, bytes).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// "evolution_report_ana_2024-03-31.pdf" -> "chart_weight_ana_2024-03-31.pdf"
fn chart_filename(metric: Metric, subject_name: &str, date: NaiveDate) -> String {
    let evolution = report::report_filename(subject_name, date);
    let suffix = evolution.trim_start_matches("evolution_report_");
    format!("chart_{}_{}", metric.as_str(), suffix)
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Generate the multi-page Evolution Report for a subject
pub async fn generate_evolution_report(
    db: &Database,
    config: &ReportConfig,
    output_dir: &Path,
    subject_id: i64,
) -> Result<GenerateReportResponse, String> {
    let (subject, history) = load_subject_history(db, subject_id)?;
    let stats = compute_summary_statistics(&history);
    let charts = report::default_charts(&history, config);

    let bytes = report::generate_evolution_report(config, &subject, &history, &stats, charts)
        .await
        .map_err(|e| format!("Failed to generate report: {}", e))?;

    let path: PathBuf = output_dir.join(report::report_filename(&subject.name, Local::now().date_naive()));
    write_pdf(&path, &bytes)?;
    tracing::info!(subject = %subject.name, path = %path.display(), bytes = bytes.len(), "Evolution report written");

    Ok(GenerateReportResponse {
        success: true,
        file_path: path.display().to_string(),
        subject: subject.name.clone(),
        assessments: history.len(),
        date_range: date_range(&history),
        bytes: bytes.len(),
        message: format!(
            "Evolution report generated for {} with {} assessments",
            subject.name,
            history.len()
        ),
    })
}

/// Generate a one-page printout of a single metric chart
pub async fn generate_chart_report(
    db: &Database,
    config: &ReportConfig,
    output_dir: &Path,
    subject_id: i64,
    metric: &str,
) -> Result<GenerateReportResponse, String> {
    let metric = Metric::from_str(metric).ok_or_else(|| {
        format!("Unknown metric '{}'. Use weight, body_fat, bmi or lean_mass", metric)
    })?;
    let (subject, history) = load_subject_history(db, subject_id)?;

    let chart = MetricChart::for_metric(metric, &history, config);
    if !chart.has_data() {
        return Err(format!("No {} values recorded for {}", metric.display_name(), subject.name));
    }
    let chart: Arc<dyn ChartSource> = Arc::new(chart);
    let title = format!("{} Evolution", metric.display_name());

    let bytes = report::generate_single_chart_report(config, chart, &subject, &title)
        .await
        .map_err(|e| format!("Failed to generate chart report: {}", e))?;

    let path = output_dir.join(chart_filename(metric, &subject.name, Local::now().date_naive()));
    write_pdf(&path, &bytes)?;
    tracing::info!(subject = %subject.name, metric = metric.as_str(), path = %path.display(), "Chart report written");

    Ok(GenerateReportResponse {
        success: true,
        file_path: path.display().to_string(),
        subject: subject.name.clone(),
        assessments: history.len(),
        date_range: date_range(&history),
        bytes: bytes.len(),
        message: format!("{} printed for {}", title, subject.name),
    })
}
