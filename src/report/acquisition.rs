//! Image acquisition
//!
//! Turns a section's visual content into an embeddable `RasterAsset` before
//! the section draws. Two strategies share one outcome type: a chart
//! reference is rasterized after a settle delay and under a timeout, and a
//! base64 photograph is normalized to a data URI and decoded. Every failure
//! becomes `None` plus a log line; the calling section draws a placeholder
//! or skips the slot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::NaiveDate;
use image::{Rgb, RgbImage};
use tokio::sync::mpsc;

use super::config::ReportConfig;
use super::error::AcquisitionError;
use crate::models::PhotoSlot;

const DEFAULT_PHOTO_MIME: &str = "image/jpeg";

/// Decoded RGB8 bitmap ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct RasterAsset {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl RasterAsset {
    /// Wrap a raw RGB8 buffer; `None` when the length does not match
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Decode PNG/JPEG bytes, compositing any alpha channel onto white
    pub fn decode(bytes: &[u8]) -> Result<Self, AcquisitionError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();

        let mut rgb = RgbImage::new(width, height);
        for (x, y, pixel) in decoded.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = a as f32 / 255.0;
            let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
            rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
        }

        Ok(Self {
            width,
            height,
            pixels: Arc::new(rgb.into_raw()),
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Largest (width, height) with this aspect ratio inside the box
    pub fn fit_within(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let aspect = self.aspect_ratio();
        if max_width / max_height.max(f32::EPSILON) > aspect {
            (max_height * aspect, max_height)
        } else {
            (max_width, max_width / aspect)
        }
    }
}

/// Anything that can be rasterized into a chart snapshot.
///
/// The reference may be stale (the chart unmounted) or slow; both surface as
/// errors and the engine substitutes a placeholder.
#[async_trait]
pub trait ChartSource: Send + Sync {
    fn name(&self) -> &str;

    async fn rasterize(&self, scale: f32) -> Result<RasterAsset, AcquisitionError>;
}

/// Progress of a composition run, for callers that want to show it
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ChartStarted { name: String },
    ChartAcquired { name: String, width: u32, height: u32 },
    ChartFailed { name: String, reason: String },
    PhotoResolved { date: NaiveDate, slot: PhotoSlot },
    PhotoSkipped { date: NaiveDate, slot: PhotoSlot, reason: String },
    SectionRendered { name: &'static str, page: usize },
    Finalized { pages: usize },
}

pub struct ImageAcquisition {
    settle_delay: Duration,
    timeout: Duration,
    scale: f32,
    min_px: u32,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl ImageAcquisition {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            timeout: config.chart_timeout(),
            scale: config.chart_scale,
            min_px: config.min_chart_px,
            progress: None,
        }
    }

    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Publish a progress event without ever blocking composition
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.progress {
            if let Err(e) = sender.try_send(event) {
                tracing::debug!("Dropped progress event: {}", e);
            }
        }
    }

    /// Rasterize a chart, or `None` on error, timeout or a near-empty result
    pub async fn resolve_chart(&self, source: &dyn ChartSource) -> Option<RasterAsset> {
        let name = source.name().to_string();
        self.emit(ProgressEvent::ChartStarted { name: name.clone() });

        tokio::time::sleep(self.settle_delay).await;

        let outcome = match tokio::time::timeout(self.timeout, source.rasterize(self.scale)).await {
            Ok(Ok(asset)) if asset.width < self.min_px || asset.height < self.min_px => {
                Err(format!("snapshot is near-empty ({}x{} px)", asset.width, asset.height))
            }
            Ok(Ok(asset)) => Ok(asset),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(AcquisitionError::Timeout(self.timeout).to_string()),
        };

        match outcome {
            Ok(asset) => {
                tracing::debug!(chart = %name, width = asset.width, height = asset.height, "Chart acquired");
                self.emit(ProgressEvent::ChartAcquired {
                    name,
                    width: asset.width,
                    height: asset.height,
                });
                Some(asset)
            }
            Err(reason) => {
                tracing::warn!(chart = %name, "Chart unavailable: {}", reason);
                self.emit(ProgressEvent::ChartFailed { name, reason });
                None
            }
        }
    }

    /// Decode a photo payload; `None` when absent, blank or undecodable
    pub fn resolve_photo(&self, payload: Option<&str>) -> Option<RasterAsset> {
        let uri = normalize_photo_payload(payload?)?;
        match decode_data_uri(&uri).and_then(|bytes| RasterAsset::decode(&bytes)) {
            Ok(asset) => Some(asset),
            Err(e) => {
                tracing::warn!("Photo could not be decoded: {}", e);
                None
            }
        }
    }
}

/// Fully-qualified data URI for a base64 photo, with or without a prefix
pub fn normalize_photo_payload(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }
    if payload.starts_with("data:") {
        return Some(payload.to_string());
    }
    Some(format!("data:{};base64,{}", DEFAULT_PHOTO_MIME, payload))
}

/// Bytes carried by a base64 data URI
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AcquisitionError> {
    let (header, data) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(AcquisitionError::MalformedUri)?;
    if !header.contains(";base64") {
        return Err(AcquisitionError::MalformedUri);
    }
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(cleaned)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Base64 PNG of a solid-color image
    pub fn png_base64(width: u32, height: u32) -> String {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    pub enum Behaviour {
        Solid(u32, u32),
        Fail,
        Hang,
    }

    pub struct FakeChart {
        pub name: String,
        pub behaviour: Behaviour,
    }

    impl FakeChart {
        pub fn solid(name: &str) -> Arc<dyn ChartSource> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour: Behaviour::Solid(400, 160),
            })
        }

        pub fn failing(name: &str) -> Arc<dyn ChartSource> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour: Behaviour::Fail,
            })
        }

        pub fn sized(name: &str, width: u32, height: u32) -> Arc<dyn ChartSource> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour: Behaviour::Solid(width, height),
            })
        }

        pub fn hanging(name: &str) -> Arc<dyn ChartSource> {
            Arc::new(Self {
                name: name.to_string(),
                behaviour: Behaviour::Hang,
            })
        }
    }

    #[async_trait]
    impl ChartSource for FakeChart {
        fn name(&self) -> &str {
            &self.name
        }

        async fn rasterize(&self, scale: f32) -> Result<RasterAsset, AcquisitionError> {
            match self.behaviour {
                Behaviour::Solid(w, h) => {
                    let (w, h) = ((w as f32 * scale) as u32, (h as f32 * scale) as u32);
                    Ok(RasterAsset::from_rgb(w, h, vec![255; (w * h * 3) as usize])
                        .expect("buffer sized to dimensions"))
                }
                Behaviour::Fail => Err(AcquisitionError::Unavailable),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(AcquisitionError::Unavailable)
                }
            }
        }
    }

    /// Acquisition with no settle delay and a short timeout
    pub fn fast_acquisition() -> ImageAcquisition {
        ImageAcquisition::new(&fast_config())
    }

    pub fn fast_config() -> ReportConfig {
        ReportConfig {
            chart_settle_delay_ms: 0,
            chart_timeout_ms: 200,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_normalize_adds_prefix_once() {
        assert_eq!(
            normalize_photo_payload("abcd").as_deref(),
            Some("data:image/jpeg;base64,abcd")
        );
        assert_eq!(
            normalize_photo_payload("data:image/png;base64,abcd").as_deref(),
            Some("data:image/png;base64,abcd")
        );
        assert_eq!(normalize_photo_payload("  "), None);
    }

    #[test]
    fn test_resolve_photo_decodes_with_and_without_prefix() {
        let acquisition = fast_acquisition();
        let bare = png_base64(6, 4);
        let prefixed = format!("data:image/png;base64,{}", bare);

        let a = acquisition.resolve_photo(Some(&bare)).unwrap();
        let b = acquisition.resolve_photo(Some(&prefixed)).unwrap();
        assert_eq!((a.width, a.height), (6, 4));
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_photo_absent_or_garbage() {
        let acquisition = fast_acquisition();
        assert!(acquisition.resolve_photo(None).is_none());
        assert!(acquisition.resolve_photo(Some("not base64 at all!")).is_none());
    }

    #[tokio::test]
    async fn test_resolve_chart_success_uses_scale() {
        let acquisition = fast_acquisition();
        let chart = FakeChart::solid("weight");
        let asset = acquisition.resolve_chart(chart.as_ref()).await.unwrap();
        assert_eq!((asset.width, asset.height), (800, 320));
    }

    #[tokio::test]
    async fn test_resolve_chart_failures_become_none() {
        let acquisition = fast_acquisition();
        assert!(acquisition.resolve_chart(FakeChart::failing("bmi").as_ref()).await.is_none());
        assert!(acquisition.resolve_chart(FakeChart::sized("tiny", 2, 2).as_ref()).await.is_none());
        assert!(acquisition.resolve_chart(FakeChart::hanging("slow").as_ref()).await.is_none());
    }

    #[tokio::test]
    async fn test_progress_events_are_published() {
        let (tx, mut rx) = mpsc::channel(8);
        let acquisition = fast_acquisition().with_progress(tx);
        acquisition.resolve_chart(FakeChart::failing("bmi").as_ref()).await;

        assert_eq!(rx.recv().await, Some(ProgressEvent::ChartStarted { name: "bmi".into() }));
        assert!(matches!(rx.recv().await, Some(ProgressEvent::ChartFailed { .. })));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let asset = RasterAsset::from_rgb(200, 100, vec![0; 200 * 100 * 3]).unwrap();
        assert_eq!(asset.fit_within(50.0, 50.0), (50.0, 25.0));
        assert_eq!(asset.fit_within(100.0, 20.0), (40.0, 20.0));
    }
}
