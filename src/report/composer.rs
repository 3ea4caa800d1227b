//! Evolution Report composition
//!
//! The report is a fixed plan of `(predicate, section)` entries executed in
//! order against one `GeometryContext`. Entries whose predicate rejects the
//! input are skipped. After the last section the document is finalized,
//! which stamps the "i / N" page counter on every page.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::mpsc;

use super::acquisition::{ChartSource, ImageAcquisition, ProgressEvent};
use super::config::ReportConfig;
use super::document::{Document, Rgb};
use super::error::{ReportError, ReportResult};
use super::geometry::GeometryContext;
use super::metrics::{
    circumference_delta_color, format_delta, format_value, humanize, test_delta_color, Metric, Trend,
};
use super::sections::{
    Cell, ChartSection, Column, InfoBox, InfoPair, KpiCard, KpiCardGrid, PhotoColumn, PhotoComparisonSection,
    Section, TableSection, TextBlock, TitleBlock,
};
use super::style::{COLOR_OBSERVATIONS_FILL, COLOR_RECOMMENDATIONS_FILL};
use crate::models::{Assessment, Subject, SummaryStatistics};

/// Chart references supplied by the caller, one per chart section
#[derive(Clone, Default)]
pub struct ChartReferences {
    pub weight: Option<Arc<dyn ChartSource>>,
    pub body_fat: Option<Arc<dyn ChartSource>>,
    pub bmi: Option<Arc<dyn ChartSource>>,
    pub circumferences: Option<Arc<dyn ChartSource>>,
}

impl ChartReferences {
    pub fn for_metric(&self, metric: Metric) -> Option<Arc<dyn ChartSource>> {
        match metric {
            Metric::Weight => self.weight.clone(),
            Metric::BodyFat => self.body_fat.clone(),
            Metric::Bmi => self.bmi.clone(),
            Metric::LeanMass => None,
        }
    }
}

/// Everything the Evolution Report is built from
pub struct EvolutionInput<'a> {
    pub subject: &'a Subject,
    /// Ascending by date: `first()` is the oldest assessment
    pub records: &'a [Assessment],
    pub stats: &'a SummaryStatistics,
    pub charts: ChartReferences,
}

type Predicate = fn(&EvolutionInput<'_>) -> bool;

fn always(_: &EvolutionInput<'_>) -> bool {
    true
}

fn has_trend(input: &EvolutionInput<'_>) -> bool {
    input.records.len() >= 2
}

fn has_circumference_chart(input: &EvolutionInput<'_>) -> bool {
    input.charts.circumferences.is_some()
}

fn has_photos(input: &EvolutionInput<'_>) -> bool {
    input.records.iter().any(Assessment::has_photos)
}

fn has_circumferences(input: &EvolutionInput<'_>) -> bool {
    input.records.iter().any(|r| !r.circumferences.is_empty())
}

fn has_tests(input: &EvolutionInput<'_>) -> bool {
    input.records.iter().any(|r| !r.tests.is_empty())
}

struct PlanEntry<'a> {
    predicate: Predicate,
    section: Box<dyn Section + 'a>,
}

pub struct ReportComposer {
    config: ReportConfig,
    generated_at: NaiveDateTime,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl ReportComposer {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            generated_at: Local::now().naive_local(),
            progress: None,
        }
    }

    /// Pin the "Generated on" timestamp
    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Lay out the full Evolution Report and return the finalized document
    pub async fn compose(&self, input: &EvolutionInput<'_>) -> ReportResult<Document> {
        if input.subject.name.trim().is_empty() {
            return Err(ReportError::InvalidInput("subject name is empty".to_string()));
        }
        if input.records.windows(2).any(|w| w[0].date > w[1].date) {
            tracing::warn!(subject = %input.subject.name, "Assessments are not in ascending date order");
        }

        let mut ctx = GeometryContext::new(&self.config)?;
        let mut acquisition = ImageAcquisition::new(&self.config);
        if let Some(sender) = &self.progress {
            acquisition = acquisition.with_progress(sender.clone());
        }

        tracing::info!(
            subject = %input.subject.name,
            records = input.records.len(),
            "Composing evolution report"
        );

        for entry in self.plan(input) {
            if !(entry.predicate)(input) {
                tracing::debug!(section = entry.section.name(), "Section skipped");
                continue;
            }
            entry.section.render(&mut ctx, &acquisition).await?;
            acquisition.emit(ProgressEvent::SectionRendered {
                name: entry.section.name(),
                page: ctx.page_count(),
            });
        }

        let mut document = ctx.finish();
        document.finalize();
        acquisition.emit(ProgressEvent::Finalized {
            pages: document.page_count(),
        });
        tracing::info!(pages = document.page_count(), "Evolution report composed");
        Ok(document)
    }

    fn plan<'a>(&self, input: &EvolutionInput<'a>) -> Vec<PlanEntry<'a>> {
        let mut plan = vec![
            PlanEntry {
                predicate: always,
                section: Box::new(TitleBlock {
                    title: "Evolution Report".to_string(),
                    subtitle: input.subject.name.clone(),
                    generated_at: self.generated_at,
                }),
            },
            PlanEntry {
                predicate: always,
                section: Box::new(info_box(input)),
            },
            PlanEntry {
                predicate: has_trend,
                section: Box::new(kpi_grid(input.stats)),
            },
        ];

        for metric in Metric::CHARTED {
            plan.push(PlanEntry {
                predicate: has_trend,
                section: Box::new(ChartSection::new(
                    format!("{} Evolution", metric.display_name()),
                    input.charts.for_metric(metric),
                )),
            });
        }

        plan.extend([
            PlanEntry {
                predicate: has_circumference_chart,
                section: Box::new(ChartSection::new(
                    "Circumference Evolution",
                    input.charts.circumferences.clone(),
                )),
            },
            PlanEntry {
                predicate: always,
                section: Box::new(history_table(input.records)),
            },
            PlanEntry {
                predicate: has_photos,
                section: Box::new(photo_section(input.records)),
            },
            PlanEntry {
                predicate: has_circumferences,
                section: Box::new(comparison_table(
                    "Circumference Comparison",
                    "Measurement",
                    "cm",
                    input.records,
                    circumferences_of,
                    circumference_delta_color,
                )),
            },
            PlanEntry {
                predicate: has_tests,
                section: Box::new(comparison_table(
                    "Performance Tests",
                    "Test",
                    "",
                    input.records,
                    tests_of,
                    |_, delta| test_delta_color(delta),
                )),
            },
            PlanEntry {
                predicate: has_trend,
                section: Box::new(
                    TextBlock::new(observations(input))
                        .with_heading("Analysis")
                        .boxed("Observations", COLOR_OBSERVATIONS_FILL),
                ),
            },
            PlanEntry {
                predicate: has_trend,
                section: Box::new(
                    TextBlock::new(recommendations(input.stats))
                        .boxed("Recommendations", COLOR_RECOMMENDATIONS_FILL),
                ),
            },
        ]);
        plan
    }
}

// ============================================================================
// Section builders
// ============================================================================

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn pair(left: (&str, String), right: (&str, String)) -> InfoPair {
    InfoPair {
        left: (left.0.to_string(), left.1),
        right: (right.0.to_string(), right.1),
    }
}

fn info_box(input: &EvolutionInput<'_>) -> InfoBox {
    let subject = input.subject;
    let stats = input.stats;
    let period = match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => format!("{} - {}", format_date(Some(first)), format_date(Some(last))),
        _ => "-".to_string(),
    };

    InfoBox {
        heading: "Personal Data".to_string(),
        rows: vec![
            pair(
                ("Name", subject.name.clone()),
                ("Height", subject.height_cm.map_or("-".to_string(), |h| format!("{:.0} cm", h))),
            ),
            pair(
                ("Age", subject.age.map_or("-".to_string(), |a| format!("{} years", a))),
                ("Sex", subject.sex.map_or("-", |s| s.display_name()).to_string()),
            ),
            pair(
                ("Goal", subject.goal.clone().unwrap_or_else(|| "-".to_string())),
                ("Assessments", input.records.len().to_string()),
            ),
            pair(("Period", period), ("Last", format_date(stats.last_date))),
        ],
    }
}

fn kpi_grid(stats: &SummaryStatistics) -> KpiCardGrid {
    KpiCardGrid {
        heading: "Key Indicators".to_string(),
        cards: Metric::KPI_ORDER
            .iter()
            .map(|metric| KpiCard {
                label: metric.display_name().to_string(),
                delta: metric.delta(stats),
                unit: metric.unit().to_string(),
            })
            .collect(),
    }
}

/// Full history, most recent assessment first
fn history_table(records: &[Assessment]) -> TableSection {
    let rows = records
        .iter()
        .rev()
        .map(|r| {
            vec![
                Cell::from(r.date.format("%d/%m/%Y").to_string()),
                Cell::from(format_value(r.weight_kg)),
                Cell::from(format_value(r.body_fat_pct)),
                Cell::from(format_value(r.bmi)),
                Cell::from(format_value(r.lean_mass_kg)),
                Cell::from(format_value(r.fat_mass_kg)),
                Cell::from(r.notes.clone().unwrap_or_default()),
            ]
        })
        .collect();

    TableSection {
        title: Some("Assessment History".to_string()),
        columns: vec![
            Column::new("Date", 24.0),
            Column::new("Weight (kg)", 22.0).right(),
            Column::new("Body Fat (%)", 22.0).right(),
            Column::new("BMI", 16.0).right(),
            Column::new("Lean (kg)", 22.0).right(),
            Column::new("Fat (kg)", 22.0).right(),
            Column::new("Notes", 52.0).truncated(32),
        ],
        rows,
    }
}

fn photo_column<'a>(label: &str, record: &'a Assessment) -> PhotoColumn<'a> {
    PhotoColumn {
        label: label.to_string(),
        date: record.date,
        photos: &record.photos,
    }
}

/// One column for a single photographed assessment, else first vs latest
fn photo_section(records: &[Assessment]) -> PhotoComparisonSection<'_> {
    let photographed: Vec<&Assessment> = records.iter().filter(|r| r.has_photos()).collect();

    let (heading, columns) = match photographed.as_slice() {
        [] => ("Progress Photos", Vec::new()),
        [only] => ("Progress Photos", vec![photo_column("Assessment", only)]),
        [first, .., last] => (
            "Photo Comparison",
            vec![photo_column("Initial", first), photo_column("Latest", last)],
        ),
    };

    PhotoComparisonSection {
        heading: heading.to_string(),
        columns,
    }
}

fn circumferences_of(record: &Assessment) -> &BTreeMap<String, f64> {
    &record.circumferences
}

fn tests_of(record: &Assessment) -> &BTreeMap<String, f64> {
    &record.tests
}

/// First vs latest value per key, each key compared across the records that carry it
fn comparison_table(
    title: &str,
    key_header: &str,
    unit: &str,
    records: &[Assessment],
    values: fn(&Assessment) -> &BTreeMap<String, f64>,
    color: fn(&str, Option<f64>) -> Rgb,
) -> TableSection {
    let keys: BTreeSet<&String> = records.iter().flat_map(|r| values(r).keys()).collect();
    let suffix = if unit.is_empty() { String::new() } else { format!(" ({})", unit) };

    let rows = keys
        .into_iter()
        .map(|key| {
            let first = records.iter().position(|r| values(r).contains_key(key));
            let last = records.iter().rposition(|r| values(r).contains_key(key));
            let value_at = |i: Option<usize>| i.and_then(|i| values(&records[i]).get(key).copied());

            let delta = match (first, last) {
                (Some(a), Some(b)) if a != b => match (value_at(first), value_at(last)) {
                    (Some(x), Some(y)) => Some(y - x),
                    _ => None,
                },
                _ => None,
            };

            vec![
                Cell::from(humanize(key)),
                Cell::from(format_value(value_at(first))),
                Cell::from(format_value(value_at(last))),
                Cell::colored(format_delta(delta, unit), color(key, delta)),
            ]
        })
        .collect();

    TableSection {
        title: Some(title.to_string()),
        columns: vec![
            Column::new(key_header, 65.0),
            Column::new(format!("Initial{}", suffix), 35.0).right(),
            Column::new(format!("Latest{}", suffix), 35.0).right(),
            Column::new("Change", 45.0).right(),
        ],
        rows,
    }
}

// ============================================================================
// Analysis text
// ============================================================================

fn bmi_category(bmi: f64) -> &'static str {
    match bmi {
        b if b < 18.5 => "underweight",
        b if b < 25.0 => "within the normal range",
        b if b < 30.0 => "in the overweight range",
        _ => "in the obesity range",
    }
}

/// Sentence describing how one metric moved between the first and last records
fn metric_observation(metric: Metric, records: &[Assessment], stats: &SummaryStatistics) -> Option<String> {
    let delta = metric.delta(stats)?;
    let first = records.first().and_then(|r| metric.value(r))?;
    let last = records.last().and_then(|r| metric.value(r))?;
    let unit = if metric.unit().is_empty() {
        String::new()
    } else {
        format!(" {}", metric.unit())
    };

    Some(match Trend::from_delta(Some(delta)) {
        Trend::Stable => format!(
            "{} remained stable at {:.1}{}.",
            metric.display_name(),
            last,
            unit
        ),
        trend => format!(
            "{} went from {:.1}{} to {:.1}{}, a {} of {}.",
            metric.display_name(),
            first,
            unit,
            last,
            unit,
            trend.word(),
            format_delta(Some(delta.abs()), metric.unit()).trim_start_matches('+'),
        ),
    })
}

fn observations(input: &EvolutionInput<'_>) -> Vec<String> {
    let stats = input.stats;
    let mut lines = vec![format!(
        "{} assessments were recorded over {} days.",
        stats.record_count, stats.day_span
    )];

    lines.extend(
        Metric::KPI_ORDER
            .iter()
            .filter_map(|&metric| metric_observation(metric, input.records, stats)),
    );

    if let Some(bmi) = input.records.last().and_then(|r| r.bmi) {
        lines.push(format!("The latest BMI of {:.1} is {}.", bmi, bmi_category(bmi)));
    }
    lines
}

fn recommendations(stats: &SummaryStatistics) -> Vec<String> {
    let mut lines = Vec::new();

    match Trend::from_delta(stats.body_fat_delta) {
        Trend::Increase => lines.push(
            "Body fat increased: review the eating plan and add aerobic work to the weekly routine.".to_string(),
        ),
        Trend::Reduction => {
            lines.push("Body fat is trending down: keep the current training and nutrition plan.".to_string())
        }
        Trend::Stable => {}
    }

    match Trend::from_delta(stats.lean_mass_delta) {
        Trend::Reduction => lines.push(
            "Lean mass dropped: prioritize protein intake and resistance training to preserve muscle."
                .to_string(),
        ),
        Trend::Increase => lines.push("Lean mass increased: the resistance program is paying off.".to_string()),
        Trend::Stable => {}
    }

    if lines.is_empty() {
        lines.push("Measurements are stable: consider adjusting training stimulus to progress further.".to_string());
    }
    lines.push("Reassess every 4 to 6 weeks under the same conditions to keep results comparable.".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{compute_summary_statistics, PhotoSlot};
    use crate::report::acquisition::test_support::{fast_config, png_base64, FakeChart};
    use crate::report::document::DrawOp;
    use crate::report::sections::test_support::assert_within_margins;
    use crate::report::sections::CHART_PLACEHOLDER;
    use crate::report::style::{COLOR_BAD, COLOR_GOOD, COLOR_REDUCTION};
    use chrono::NaiveDate;

    fn subject(name: &str) -> Subject {
        Subject {
            id: 1,
            name: name.to_string(),
            age: Some(34),
            height_cm: Some(165.0),
            ..Default::default()
        }
    }

    fn record(month: u32, weight: f64) -> Assessment {
        record_on(NaiveDate::from_ymd_opt(2024, month, 1).unwrap(), weight)
    }

    fn record_on(date: NaiveDate, weight: f64) -> Assessment {
        let mut a = Assessment::new(1, date);
        a.weight_kg = Some(weight);
        a.body_fat_pct = Some(28.0);
        a.bmi = Some(weight / (1.65 * 1.65));
        a
    }

    fn composer() -> ReportComposer {
        ReportComposer::new(fast_config())
            .with_generated_at(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(10, 0, 0).unwrap())
    }

    fn failing_charts() -> ChartReferences {
        ChartReferences {
            weight: Some(FakeChart::failing("weight")),
            body_fat: Some(FakeChart::failing("body_fat")),
            bmi: Some(FakeChart::failing("bmi")),
            circumferences: None,
        }
    }

    async fn compose(name: &str, records: &[Assessment], charts: ChartReferences) -> ReportResult<Document> {
        let subject = subject(name);
        let stats = compute_summary_statistics(records);
        let input = EvolutionInput {
            subject: &subject,
            records,
            stats: &stats,
            charts,
        };
        composer().compose(&input).await
    }

    fn all_texts(doc: &Document) -> Vec<String> {
        doc.texts().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_weight_loss_card_shows_reduction() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = vec![record_on(first, 70.0), record_on(first + chrono::Duration::days(30), 68.5)];
        let stats = compute_summary_statistics(&records);
        assert_eq!(stats.day_span, 30);
        let doc = compose("Ana", &records, failing_charts()).await.unwrap();

        let texts = all_texts(&doc);
        assert!(texts.contains(&"-1.5 kg".to_string()));
        assert!(texts.contains(&"reduction".to_string()));
        assert!(texts.iter().any(|t| t.contains("2 assessments were recorded over 30 days.")));

        // The weight card is the first filled card after the info box
        let card_fills: Vec<Rgb> = doc.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect {
                    fill: Some(fill),
                    height,
                    ..
                } if (*height - 24.0).abs() < 0.01 => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(card_fills[0], COLOR_REDUCTION);
    }

    #[tokio::test]
    async fn test_every_failed_chart_gets_one_placeholder() {
        let records = vec![record(1, 70.0), record(3, 68.5)];
        let doc = compose("Ana", &records, failing_charts()).await.unwrap();

        let placeholders = doc.texts().filter(|t| *t == CHART_PLACEHOLDER).count();
        assert_eq!(placeholders, Metric::CHARTED.len());
        assert!(doc.pages().iter().all(|p| p.image_count() == 0));
    }

    #[tokio::test]
    async fn test_charts_embedded_when_available() {
        let records = vec![record(1, 70.0), record(3, 68.5)];
        let charts = ChartReferences {
            weight: Some(FakeChart::solid("weight")),
            body_fat: Some(FakeChart::solid("body_fat")),
            bmi: Some(FakeChart::failing("bmi")),
            circumferences: Some(FakeChart::solid("circumferences")),
        };
        let doc = compose("Ana", &records, charts).await.unwrap();

        let images: usize = doc.pages().iter().map(|p| p.image_count()).sum();
        assert_eq!(images, 3);
        assert_eq!(doc.texts().filter(|t| *t == CHART_PLACEHOLDER).count(), 1);
        assert_within_margins(&doc);
    }

    #[tokio::test]
    async fn test_single_record_skips_trend_sections() {
        let records = vec![record(1, 70.0)];
        let doc = compose("Ana", &records, failing_charts()).await.unwrap();
        let texts = all_texts(&doc);

        assert!(!texts.contains(&"Key Indicators".to_string()));
        assert!(!texts.contains(&"Analysis".to_string()));
        assert!(!texts.iter().any(|t| t == CHART_PLACEHOLDER));
        assert!(texts.contains(&"Assessment History".to_string()));
    }

    #[tokio::test]
    async fn test_long_history_paginates_and_numbers_pages() {
        let records: Vec<Assessment> = (0..80)
            .map(|i| {
                let mut a = record(1, 80.0 - i as f64 * 0.1);
                a.date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(i * 7);
                a.notes = Some("Consistent training week with a long note attached".to_string());
                a
            })
            .collect();
        let doc = compose("Ana", &records, failing_charts()).await.unwrap();

        let n = doc.page_count();
        assert!(n >= 3);
        assert_within_margins(&doc);
        for (i, page) in doc.pages().iter().enumerate() {
            assert!(page.contains_text(&format!("{} / {}", i + 1, n)));
        }

        // Most recent first
        let dates: Vec<&str> = doc
            .texts()
            .filter(|t| t.len() == 10 && t.as_bytes()[2] == b'/')
            .collect();
        let newest = (NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(79 * 7))
            .format("%d/%m/%Y")
            .to_string();
        assert_eq!(dates[0], newest);
    }

    #[tokio::test]
    async fn test_circumference_comparison_colors() {
        let mut first = record(1, 70.0);
        first.circumferences = BTreeMap::from([("waist".to_string(), 80.0), ("right_arm".to_string(), 30.0)]);
        let mut last = record(3, 68.5);
        last.circumferences = BTreeMap::from([("waist".to_string(), 78.0), ("right_arm".to_string(), 31.0)]);

        let doc = compose("Ana", &[first, last], failing_charts()).await.unwrap();
        let colored: Vec<(String, Rgb)> = doc
            .pages()
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { text, color, .. } if text.ends_with(" cm") => Some((text.clone(), *color)),
                _ => None,
            })
            .collect();

        assert!(colored.contains(&("+1.0 cm".to_string(), COLOR_GOOD)));
        assert!(colored.contains(&("-2.0 cm".to_string(), COLOR_GOOD)));

        let mut worse = record(1, 70.0);
        worse.circumferences = BTreeMap::from([("waist".to_string(), 78.0)]);
        let mut later = record(3, 70.0);
        later.circumferences = BTreeMap::from([("waist".to_string(), 80.0)]);
        let doc = compose("Ana", &[worse, later], failing_charts()).await.unwrap();
        let waist = doc
            .pages()
            .iter()
            .flat_map(|p| p.ops.iter())
            .find_map(|op| match op {
                DrawOp::Text { text, color, .. } if text == "+2.0 cm" => Some(*color),
                _ => None,
            });
        assert_eq!(waist, Some(COLOR_BAD));
    }

    #[tokio::test]
    async fn test_photos_compare_first_and_latest() {
        let mut first = record(1, 70.0);
        first.photos = BTreeMap::from([(PhotoSlot::Front, png_base64(30, 40))]);
        let middle = record(2, 69.0);
        let mut last = record(3, 68.5);
        last.photos = BTreeMap::from([(PhotoSlot::Front, png_base64(30, 40))]);

        let doc = compose("Ana", &[first, middle, last], failing_charts()).await.unwrap();
        let texts = all_texts(&doc);
        assert!(texts.contains(&"Photo Comparison".to_string()));
        assert!(texts.contains(&"Initial (01/01/2024)".to_string()));
        assert!(texts.contains(&"Latest (01/03/2024)".to_string()));
        let images: usize = doc.pages().iter().map(|p| p.image_count()).sum();
        assert_eq!(images, 2);
    }

    #[tokio::test]
    async fn test_blank_subject_name_is_fatal() {
        let records = vec![record(1, 70.0)];
        let err = compose("  ", &records, ChartReferences::default()).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_progress_reports_sections_and_finalize() {
        let records = vec![record(1, 70.0), record(3, 68.5)];
        let subject = subject("Ana");
        let stats = compute_summary_statistics(&records);
        let input = EvolutionInput {
            subject: &subject,
            records: &records,
            stats: &stats,
            charts: ChartReferences::default(),
        };

        let (tx, mut rx) = mpsc::channel(64);
        let doc = composer().with_progress(tx).compose(&input).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events.first(),
            Some(&ProgressEvent::SectionRendered { name: "title", page: 1 })
        );
        assert_eq!(
            events.last(),
            Some(&ProgressEvent::Finalized {
                pages: doc.page_count()
            })
        );
    }

    #[test]
    fn test_recommendations_follow_trends() {
        let stats = SummaryStatistics {
            body_fat_delta: Some(1.2),
            lean_mass_delta: Some(-0.8),
            ..Default::default()
        };
        let lines = recommendations(&stats);
        assert!(lines[0].starts_with("Body fat increased"));
        assert!(lines[1].starts_with("Lean mass dropped"));
        assert!(lines.last().unwrap().starts_with("Reassess"));
    }

    #[test]
    fn test_weight_observation_wording() {
        let records = vec![record(1, 70.0), record(3, 68.5)];
        let stats = compute_summary_statistics(&records);
        let line = metric_observation(Metric::Weight, &records, &stats).unwrap();
        assert_eq!(line, "Weight went from 70.0 kg to 68.5 kg, a reduction of 1.5 kg.");
    }
}
