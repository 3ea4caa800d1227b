//! Chart rendering (plotters)
//!
//! `MetricChart` is the concrete chart reference: it owns a snapshot of the
//! series to plot and rasterizes it on demand into an RGB bitmap.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::acquisition::{ChartSource, RasterAsset};
use super::config::ReportConfig;
use super::document::Rgb;
use super::error::AcquisitionError;
use super::metrics::{humanize, Metric};
use crate::models::Assessment;

/// Line colors for multi-series charts, cycled
const PALETTE: [Rgb; 6] = [
    (37, 99, 235),
    (220, 38, 38),
    (5, 150, 105),
    (217, 119, 6),
    (124, 58, 237),
    (8, 145, 178),
];

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub label: String,
    pub color: Rgb,
    /// (index into the chart's dates, value)
    pub points: Vec<(usize, f64)>,
}

#[derive(Debug)]
struct ChartData {
    y_desc: String,
    dates: Vec<NaiveDate>,
    series: Vec<ChartSeries>,
}

#[derive(Debug, Clone)]
pub struct MetricChart {
    name: String,
    width: u32,
    height: u32,
    data: Arc<ChartData>,
}

impl MetricChart {
    /// One line for `metric` across `records` (ascending by date)
    pub fn for_metric(metric: Metric, records: &[Assessment], config: &ReportConfig) -> Self {
        let points = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| metric.value(r).map(|v| (i, v)))
            .collect();
        let y_desc = if metric.unit().is_empty() {
            metric.display_name().to_string()
        } else {
            format!("{} ({})", metric.display_name(), metric.unit())
        };

        Self::new(
            metric.as_str(),
            config,
            ChartData {
                y_desc,
                dates: records.iter().map(|r| r.date).collect(),
                series: vec![ChartSeries {
                    label: metric.display_name().to_string(),
                    color: PALETTE[0],
                    points,
                }],
            },
        )
    }

    /// One line per circumference site present in any record
    pub fn circumferences(records: &[Assessment], config: &ReportConfig) -> Self {
        let sites: BTreeSet<&String> = records.iter().flat_map(|r| r.circumferences.keys()).collect();
        let series = sites
            .into_iter()
            .enumerate()
            .map(|(n, site)| ChartSeries {
                label: humanize(site),
                color: PALETTE[n % PALETTE.len()],
                points: records
                    .iter()
                    .enumerate()
                    .filter_map(|(i, r)| r.circumferences.get(site).map(|v| (i, *v)))
                    .collect(),
            })
            .collect();

        Self::new(
            "circumferences",
            config,
            ChartData {
                y_desc: "cm".to_string(),
                dates: records.iter().map(|r| r.date).collect(),
                series,
            },
        )
    }

    fn new(name: &str, config: &ReportConfig, data: ChartData) -> Self {
        Self {
            name: name.to_string(),
            width: config.chart_width_px,
            height: config.chart_height_px,
            data: Arc::new(data),
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.series.iter().any(|s| !s.points.is_empty())
    }
}

#[async_trait]
impl ChartSource for MetricChart {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rasterize(&self, scale: f32) -> Result<RasterAsset, AcquisitionError> {
        if !self.has_data() {
            return Err(AcquisitionError::Render("No data to chart".to_string()));
        }

        let width = ((self.width as f32 * scale).round() as u32).max(1);
        let height = ((self.height as f32 * scale).round() as u32).max(1);
        let data = Arc::clone(&self.data);

        let pixels = tokio::task::spawn_blocking(move || draw_chart(&data, width, height, scale))
            .await
            .map_err(|e| AcquisitionError::Render(e.to_string()))?
            .map_err(AcquisitionError::Render)?;

        RasterAsset::from_rgb(width, height, pixels)
            .ok_or_else(|| AcquisitionError::Render("bitmap size mismatch".to_string()))
    }
}

/// Draw the series into a fresh RGB8 buffer
fn draw_chart(data: &ChartData, width: u32, height: u32, scale: f32) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    let scaled = |v: f32| (v * scale).round() as u32;

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let values = data.series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v));
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let pad = ((hi - lo) * 0.1).max(1.0);
        let (y_min, y_max) = (lo - pad, hi + pad);

        // A single record still gets a visible x range
        let x_max = data.dates.len().max(2) as i32 - 1;
        let label_size = 12.0 * scale as f64;

        let mut chart = ChartBuilder::on(&root)
            .margin(scaled(16.0))
            .x_label_area_size(scaled(30.0))
            .y_label_area_size(scaled(48.0))
            .build_cartesian_2d(0..x_max, y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(data.dates.len().clamp(2, 10))
            .x_label_formatter(&|x| {
                usize::try_from(*x)
                    .ok()
                    .and_then(|i| data.dates.get(i))
                    .map(|d| d.format("%d/%m").to_string())
                    .unwrap_or_default()
            })
            .label_style(("sans-serif", label_size))
            .y_desc(data.y_desc.as_str())
            .draw()
            .map_err(|e| e.to_string())?;

        for series in data.series.iter().filter(|s| !s.points.is_empty()) {
            let (r, g, b) = series.color;
            let color = RGBColor(r, g, b);
            let points: Vec<(i32, f64)> = series.points.iter().map(|(i, v)| (*i as i32, *v)).collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(scaled(2.0))))
                .map_err(|e| e.to_string())?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

            chart
                .draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), scaled(3.0), color.filled())))
                .map_err(|e| e.to_string())?;
        }

        if data.series.len() > 1 {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font(("sans-serif", label_size))
                .draw()
                .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(day: u32, weight: Option<f64>) -> Assessment {
        let mut a = Assessment::new(1, NaiveDate::from_ymd_opt(2024, 3, day).unwrap());
        a.weight_kg = weight;
        a
    }

    #[tokio::test]
    async fn test_no_data_is_a_render_error() {
        let chart = MetricChart::for_metric(Metric::Weight, &[record(1, None)], &ReportConfig::default());
        assert!(!chart.has_data());
        let err = chart.rasterize(1.0).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::Render(_)));
    }

    #[test]
    fn test_series_skip_missing_values() {
        let records = vec![record(1, Some(70.0)), record(2, None), record(3, Some(68.5))];
        let chart = MetricChart::for_metric(Metric::Weight, &records, &ReportConfig::default());
        assert_eq!(chart.name(), "weight");
        assert_eq!(chart.data.series[0].points, vec![(0, 70.0), (2, 68.5)]);
        assert_eq!(chart.data.y_desc, "Weight (kg)");
    }

    #[test]
    fn test_circumference_series_per_site() {
        let mut a = record(1, None);
        a.circumferences = BTreeMap::from([("waist".to_string(), 80.0), ("right_arm".to_string(), 30.0)]);
        let mut b = record(2, None);
        b.circumferences = BTreeMap::from([("waist".to_string(), 78.0)]);

        let chart = MetricChart::circumferences(&[a, b], &ReportConfig::default());
        let labels: Vec<&str> = chart.data.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Right Arm", "Waist"]);
        assert_eq!(chart.data.series[1].points.len(), 2);
    }
}
