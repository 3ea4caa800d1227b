//! Section renderers
//!
//! One renderer per content kind. Each estimates its height, asks the
//! `GeometryContext` for space (which may start a new page) and draws.

mod chart;
mod info_box;
mod kpi;
mod photos;
mod table;
mod text;
mod title;

pub use chart::{ChartHeight, ChartSection, CHART_PLACEHOLDER};
pub use info_box::{InfoBox, InfoPair};
pub use kpi::{KpiCard, KpiCardGrid};
pub use photos::{PhotoColumn, PhotoComparisonSection};
pub use table::{Cell, Column, TableSection};
pub use text::TextBlock;
pub use title::TitleBlock;

use async_trait::async_trait;

use super::acquisition::ImageAcquisition;
use super::document::{Align, FontWeight};
use super::error::ReportResult;
use super::geometry::GeometryContext;
use super::style::{COLOR_PRIMARY, HEADING_HEIGHT, HEADING_SIZE};

#[async_trait]
pub trait Section: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best-effort height estimate; may be conservative
    fn required_height(&self, ctx: &GeometryContext) -> f32;

    async fn render(&self, ctx: &mut GeometryContext, acquisition: &ImageAcquisition) -> ReportResult<()>;
}

/// Bold section heading at the cursor. Callers reserve HEADING_HEIGHT first.
pub(crate) fn draw_heading(ctx: &mut GeometryContext, text: &str) {
    let (x, y) = (ctx.left(), ctx.y() + 6.0);
    ctx.text(x, y, text, HEADING_SIZE, FontWeight::Bold, COLOR_PRIMARY, Align::Left);
    ctx.advance(HEADING_HEIGHT);
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::report::config::ReportConfig;
    use crate::report::document::{Document, DrawOp};
    use crate::report::geometry::GeometryContext;

    pub fn ctx() -> GeometryContext {
        GeometryContext::new(&ReportConfig::default()).unwrap()
    }

    /// Every primitive except the page counter stays inside the margins
    pub fn assert_within_margins(doc: &Document) {
        let bottom = doc.height() - doc.margin();
        for (i, page) in doc.pages().iter().enumerate() {
            for op in &page.ops {
                if let DrawOp::Text { text, .. } = op {
                    if text.contains(" / ") {
                        continue;
                    }
                }
                assert!(
                    op.bottom() <= bottom + 0.01,
                    "page {} primitive overflows bottom margin: {:?}",
                    i + 1,
                    op
                );
            }
        }
    }
}
