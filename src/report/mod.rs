//! Paginated report layout engine
//!
//! Builds the multi-page Evolution Report (and the single-chart printout)
//! from a subject, its assessment history and chart references. Layout runs
//! against an in-memory `Document`; `pdf` serializes the sealed result.

pub mod acquisition;
pub mod charts;
pub mod composer;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod pdf;
pub mod sections;
pub mod single_page;
pub mod style;

pub use acquisition::{ChartSource, ImageAcquisition, ProgressEvent, RasterAsset};
pub use charts::MetricChart;
pub use composer::{ChartReferences, EvolutionInput, ReportComposer};
pub use config::ReportConfig;
pub use document::Document;
pub use error::{AcquisitionError, ReportError, ReportResult};
pub use geometry::GeometryContext;
pub use metrics::Metric;
pub use single_page::SinglePagePrintComposer;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{Assessment, Subject, SummaryStatistics};

/// Compose the Evolution Report and serialize it to PDF bytes
pub async fn generate_evolution_report(
    config: &ReportConfig,
    subject: &Subject,
    records: &[Assessment],
    stats: &SummaryStatistics,
    charts: ChartReferences,
) -> ReportResult<Vec<u8>> {
    let input = EvolutionInput {
        subject,
        records,
        stats,
        charts,
    };
    let document = ReportComposer::new(config.clone()).compose(&input).await?;
    pdf::render_pdf(&document, &format!("Evolution Report - {}", subject.name))
}

/// Compose a one-page printout of a single chart and serialize it to PDF bytes
pub async fn generate_single_chart_report(
    config: &ReportConfig,
    chart: Arc<dyn ChartSource>,
    subject: &Subject,
    title: &str,
) -> ReportResult<Vec<u8>> {
    let document = SinglePagePrintComposer::new(config.clone())
        .compose(chart, subject, title)
        .await?;
    pdf::render_pdf(&document, title)
}

/// Chart references for every chart section the records can feed
pub fn default_charts(records: &[Assessment], config: &ReportConfig) -> ChartReferences {
    let chart = |metric: Metric| -> Option<Arc<dyn ChartSource>> {
        Some(Arc::new(MetricChart::for_metric(metric, records, config)))
    };
    let circumferences = records
        .iter()
        .any(|r| !r.circumferences.is_empty())
        .then(|| Arc::new(MetricChart::circumferences(records, config)) as Arc<dyn ChartSource>);

    ChartReferences {
        weight: chart(Metric::Weight),
        body_fat: chart(Metric::BodyFat),
        bmi: chart(Metric::Bmi),
        circumferences,
    }
}

/// "Ana Souza", 2024-03-31 -> "evolution_report_ana_souza_2024-03-31.pdf"
pub fn report_filename(subject_name: &str, date: NaiveDate) -> String {
    let mut slug = String::new();
    for c in subject_name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    let slug = if slug.is_empty() { "subject" } else { slug };
    format!("evolution_report_{}_{}.pdf", slug, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn test_report_filename_slug() {
        assert_eq!(report_filename("Ana Souza", date()), "evolution_report_ana_souza_2024-03-31.pdf");
        assert_eq!(report_filename("  João  da   Silva ", date()), "evolution_report_joão_da_silva_2024-03-31.pdf");
        assert_eq!(report_filename("O'Neil-Smith!", date()), "evolution_report_o_neil_smith_2024-03-31.pdf");
        assert_eq!(report_filename("***", date()), "evolution_report_subject_2024-03-31.pdf");
    }

    #[test]
    fn test_default_charts_skip_circumferences_without_data() {
        let records = vec![Assessment::new(1, date())];
        let charts = default_charts(&records, &ReportConfig::default());
        assert!(charts.weight.is_some());
        assert!(charts.circumferences.is_none());
    }

    #[tokio::test]
    async fn test_generate_evolution_report_writes_pdf() {
        let subject = Subject {
            id: 1,
            name: "Ana".to_string(),
            ..Default::default()
        };
        let mut first = Assessment::new(1, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        first.weight_kg = Some(70.0);
        let mut last = Assessment::new(1, date());
        last.weight_kg = Some(68.5);
        let records = vec![first, last];
        let stats = crate::models::compute_summary_statistics(&records);

        let config = crate::report::acquisition::test_support::fast_config();
        let bytes = generate_evolution_report(&config, &subject, &records, &stats, ChartReferences::default())
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
