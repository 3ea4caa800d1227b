//! Chart section: caption plus a rasterized chart, or a placeholder line

use std::sync::Arc;

use async_trait::async_trait;

use super::Section;
use crate::report::acquisition::{ChartSource, ImageAcquisition, RasterAsset};
use crate::report::document::{Align, FontWeight};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::style::{COLOR_BLACK, COLOR_GRAY, SECTION_GAP};

pub const CHART_PLACEHOLDER: &str = "[chart unavailable]";

const CAPTION_HEIGHT: f32 = 7.0;
const PLACEHOLDER_HEIGHT: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartHeight {
    /// Full content width at exactly this height
    Fixed(f32),
    /// Fill the rest of the page, keeping `reserve` free below the image
    FillPage { reserve: f32 },
}

pub struct ChartSection {
    pub caption: String,
    pub source: Option<Arc<dyn ChartSource>>,
    pub height: ChartHeight,
}

impl ChartSection {
    pub fn new(caption: impl Into<String>, source: Option<Arc<dyn ChartSource>>) -> Self {
        Self {
            caption: caption.into(),
            source,
            height: ChartHeight::Fixed(70.0),
        }
    }

    pub fn filling_page(mut self, reserve: f32) -> Self {
        self.height = ChartHeight::FillPage { reserve };
        self
    }

    fn draw_caption(&self, ctx: &mut GeometryContext) {
        let (x, y) = (ctx.left(), ctx.y() + 5.0);
        ctx.text(x, y, &self.caption, 11.0, FontWeight::Bold, COLOR_BLACK, Align::Left);
        ctx.advance(CAPTION_HEIGHT);
    }

    fn draw_placeholder(&self, ctx: &mut GeometryContext) {
        ctx.ensure_space(CAPTION_HEIGHT + PLACEHOLDER_HEIGHT);
        self.draw_caption(ctx);
        let (x, y) = (ctx.left(), ctx.y() + 5.0);
        ctx.text(x, y, CHART_PLACEHOLDER, 9.0, FontWeight::Regular, COLOR_GRAY, Align::Left);
        ctx.advance(PLACEHOLDER_HEIGHT + SECTION_GAP);
    }

    fn draw_image(&self, ctx: &mut GeometryContext, asset: RasterAsset) {
        let asset = Arc::new(asset);
        let (width, height) = match self.height {
            ChartHeight::Fixed(height) => {
                ctx.ensure_space(CAPTION_HEIGHT + height + SECTION_GAP);
                (ctx.content_width(), height)
            }
            ChartHeight::FillPage { reserve } => {
                let available = (ctx.remaining_height() - CAPTION_HEIGHT - reserve).max(0.0);
                asset.fit_within(ctx.content_width(), available)
            }
        };

        self.draw_caption(ctx);
        let x = ctx.left() + (ctx.content_width() - width) / 2.0;
        let y = ctx.y();
        ctx.image(x, y, width, height, asset);
        ctx.advance(height + SECTION_GAP);
    }
}

#[async_trait]
impl Section for ChartSection {
    fn name(&self) -> &'static str {
        "chart"
    }

    fn required_height(&self, ctx: &GeometryContext) -> f32 {
        match self.height {
            ChartHeight::Fixed(h) => CAPTION_HEIGHT + h + SECTION_GAP,
            ChartHeight::FillPage { .. } => ctx.remaining_height(),
        }
    }

    async fn render(&self, ctx: &mut GeometryContext, acquisition: &ImageAcquisition) -> ReportResult<()> {
        // Acquire before touching the cursor so a failure leaves no gap
        let asset = match &self.source {
            Some(source) => acquisition.resolve_chart(source.as_ref()).await,
            None => {
                tracing::debug!(caption = %self.caption, "No chart reference");
                None
            }
        };

        match asset {
            Some(asset) => self.draw_image(ctx, asset),
            None => self.draw_placeholder(ctx),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::acquisition::test_support::{fast_acquisition, FakeChart};
    use crate::report::sections::test_support::{assert_within_margins, ctx};

    #[tokio::test]
    async fn test_chart_spans_content_width() {
        let mut ctx = ctx();
        let section = ChartSection::new("Weight", Some(FakeChart::sized("weight", 900, 300)));
        section.render(&mut ctx, &fast_acquisition()).await.unwrap();
        let doc = ctx.finish();

        let page = &doc.pages()[0];
        assert_eq!(page.image_count(), 1);
        assert!(!page.contains_text(CHART_PLACEHOLDER));
        match &page.ops[1] {
            crate::report::document::DrawOp::Image { width, height, .. } => {
                assert!((width - 180.0).abs() < 0.01);
                assert!((height - 70.0).abs() < 0.01);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_chart_draws_placeholder() {
        let mut ctx = ctx();
        for source in [Some(FakeChart::failing("bmi")), None] {
            ChartSection::new("BMI", source)
                .render(&mut ctx, &fast_acquisition())
                .await
                .unwrap();
        }
        let doc = ctx.finish();
        let page = &doc.pages()[0];
        assert_eq!(page.image_count(), 0);
        assert_eq!(page.texts().filter(|t| *t == CHART_PLACEHOLDER).count(), 2);
    }

    #[tokio::test]
    async fn test_chart_moves_to_next_page_when_short() {
        let mut ctx = ctx();
        ctx.advance(220.0);
        ChartSection::new("Weight", Some(FakeChart::solid("weight")))
            .render(&mut ctx, &fast_acquisition())
            .await
            .unwrap();
        let doc = ctx.finish();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].image_count(), 1);
        assert_within_margins(&doc);
    }

    #[tokio::test]
    async fn test_fill_page_stays_above_reserve() {
        let mut ctx = ctx();
        ctx.advance(100.0);
        ChartSection::new("Weight", Some(FakeChart::sized("weight", 100, 400)))
            .filling_page(20.0)
            .render(&mut ctx, &fast_acquisition())
            .await
            .unwrap();
        assert!(ctx.remaining_height() >= 20.0 - SECTION_GAP - 0.01);
        let doc = ctx.finish();
        assert_eq!(doc.page_count(), 1);
        assert_within_margins(&doc);
    }
}
