//! Fitrack Status Tool
//!
//! Runtime status of the service plus the usage guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Assessment and report workflow for AI assistants
pub const REPORT_INSTRUCTIONS: &str = r#"
# Fitrack Assessment and Report Instructions

## Workflow

1. `add_subject` once per person (name required; height in cm enables automatic BMI)
2. `add_assessment` for every evaluation session
3. `generate_evolution_report` to produce the multi-page PDF for a subject
4. `generate_chart_report` for a single-page printout of one metric chart

## Assessments

- Dates use ISO format: YYYY-MM-DD (defaults to today)
- `weight_kg`, `body_fat_pct`, `bmi`, `lean_mass_kg`, `fat_mass_kg` are all optional
- BMI is derived from weight and the subject's height when omitted
- Lean and fat mass are derived from weight and body fat when omitted
- `circumferences` maps a site to centimeters, e.g. `{"waist": 82.5, "right_arm": 31}`
- `tests` maps a performance test to its result, e.g. `{"push_ups": 25}`
- `photos` maps a slot (`front`, `right_side`, `left_side`, `back`) to a base64 or data-URI image

## Reports

The evolution report contains, in order:
- Title block and personal data
- Key indicators (change between first and latest assessment)
- Weight, body fat, BMI and circumference charts
- Assessment history table (most recent first)
- Progress photos (2x2 grid, or initial vs latest comparison)
- Circumference and performance test comparison tables
- Observations and recommendations

Charts that cannot be rendered are replaced by a placeholder; the report is
still produced. Reports are written to the configured output directory and
the tool returns the file path.

Chart metrics for `generate_chart_report`: `weight`, `body_fat`, `bmi`, `lean_mass`.

## Quick Reference

| Task | Tool |
|------|------|
| Register a person | `add_subject` |
| Subject details | `get_subject` |
| All subjects | `list_subjects` |
| Remove a subject and their history | `delete_subject` |
| Record an assessment | `add_assessment` |
| History with summary | `list_assessments` |
| Remove an assessment | `delete_assessment` |
| Full PDF report | `generate_evolution_report` |
| One-chart PDF | `generate_chart_report` |
"#;

/// Runtime status of the fitrack service
#[derive(Debug, Clone, Serialize)]
pub struct FitrackStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Where generated PDFs are written
    pub output_dir: String,
    pub reports_on_disk: usize,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    output_dir: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            output_dir,
        }
    }

    pub fn get_status(&self) -> FitrackStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let reports_on_disk = std::fs::read_dir(&self.output_dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "pdf"))
                    .count()
            })
            .unwrap_or(0);

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FitrackStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            output_dir: self.output_dir.display().to_string(),
            reports_on_disk,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_with_missing_paths() {
        let tracker = StatusTracker::new(
            PathBuf::from("/nonexistent/fitrack.db"),
            PathBuf::from("/nonexistent/reports"),
        );
        let status = tracker.get_status();
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.reports_on_disk, 0);
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_instructions_name_every_tool() {
        for tool in ["add_subject", "add_assessment", "generate_evolution_report", "generate_chart_report"] {
            assert!(REPORT_INSTRUCTIONS.contains(tool));
        }
    }
}
