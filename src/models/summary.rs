//! Summary statistics
//!
//! Aggregates over an assessment history. The report engine only formats
//! these values; it never recomputes them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Assessment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub record_count: usize,
    /// Days between the first and last assessment
    pub day_span: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,

    /// last - first, present only when both ends carry the metric
    pub weight_delta: Option<f64>,
    pub body_fat_delta: Option<f64>,
    pub bmi_delta: Option<f64>,
    pub lean_mass_delta: Option<f64>,

    pub average_weight: Option<f64>,
    pub average_body_fat: Option<f64>,
    pub average_bmi: Option<f64>,
}

fn delta(first: Option<f64>, last: Option<f64>) -> Option<f64> {
    match (first, last) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some(round2(b - a)),
        _ => None,
    }
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let values: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Round to two decimals so float noise (68.5 - 70.0) never shows up in labels
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute summary statistics from an ascending history
pub fn compute_summary_statistics(records: &[Assessment]) -> SummaryStatistics {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return SummaryStatistics::default(),
    };
    let has_range = records.len() >= 2;
    let pick = |f: fn(&Assessment) -> Option<f64>| {
        if has_range {
            delta(f(first), f(last))
        } else {
            None
        }
    };

    SummaryStatistics {
        record_count: records.len(),
        day_span: (last.date - first.date).num_days(),
        first_date: Some(first.date),
        last_date: Some(last.date),
        weight_delta: pick(|a| a.weight_kg),
        body_fat_delta: pick(|a| a.body_fat_pct),
        bmi_delta: pick(|a| a.bmi),
        lean_mass_delta: pick(|a| a.lean_mass_kg),
        average_weight: average(records.iter().map(|a| a.weight_kg)),
        average_body_fat: average(records.iter().map(|a| a.body_fat_pct)),
        average_bmi: average(records.iter().map(|a| a.bmi)),
    }
}
