//! Report configuration
//!
//! Page geometry and image acquisition tuning. Loaded from a JSON file when
//! `FITRACK_REPORT_CONFIG` is set; every field falls back to its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ReportError, ReportResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Page width in millimetres (A4 portrait by default).
    pub page_width_mm: f32,
    /// Page height in millimetres.
    pub page_height_mm: f32,
    /// Uniform page margin in millimetres.
    pub margin_mm: f32,
    /// Wait before rasterizing a chart so a pending re-render can land.
    /// This is a tuning knob, not a guarantee that the chart finished drawing.
    pub chart_settle_delay_ms: u64,
    /// Upper bound for a single chart rasterization.
    pub chart_timeout_ms: u64,
    /// Pixel density multiplier for chart snapshots.
    pub chart_scale: f32,
    /// Snapshots smaller than this (either side, in pixels) count as empty.
    pub min_chart_px: u32,
    /// Logical chart size in pixels, before `chart_scale`.
    pub chart_width_px: u32,
    pub chart_height_px: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 15.0,
            chart_settle_delay_ms: 500,
            chart_timeout_ms: 15_000,
            chart_scale: 2.0,
            min_chart_px: 16,
            chart_width_px: 800,
            chart_height_px: 320,
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file, filling missing fields with defaults
    pub fn load(path: &Path) -> ReportResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        let dims = [self.page_width_mm, self.page_height_mm, self.margin_mm];
        if dims.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ReportError::InvalidGeometry(
                "page dimensions and margin must be finite and non-negative".to_string(),
            ));
        }
        if self.margin_mm * 2.0 >= self.page_width_mm.min(self.page_height_mm) {
            return Err(ReportError::InvalidGeometry(format!(
                "margin {}mm leaves no content area on a {}x{}mm page",
                self.margin_mm, self.page_width_mm, self.page_height_mm
            )));
        }
        if !(self.chart_scale.is_finite() && self.chart_scale > 0.0) {
            return Err(ReportError::InvalidGeometry(format!(
                "chart scale must be positive, got {}",
                self.chart_scale
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.chart_settle_delay_ms)
    }

    pub fn chart_timeout(&self) -> Duration {
        Duration::from_millis(self.chart_timeout_ms)
    }
}
