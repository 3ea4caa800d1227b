//! Info box: bordered two-column key/value grid, drawn as one unit

use async_trait::async_trait;

use super::{draw_heading, Section};
use crate::report::acquisition::ImageAcquisition;
use crate::report::document::{Align, FontWeight};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::style::{
    truncate_chars, COLOR_BLACK, COLOR_BOX_FILL, COLOR_GRAY, COLOR_LIGHT_GRAY, HEADING_HEIGHT,
    SECTION_GAP,
};

const PADDING: f32 = 4.0;
const ROW_HEIGHT: f32 = 7.0;
const KEY_WIDTH: f32 = 30.0;
const VALUE_CHARS: usize = 34;

/// One grid row: a key/value on the left and one on the right
#[derive(Debug, Clone)]
pub struct InfoPair {
    pub left: (String, String),
    pub right: (String, String),
}

pub struct InfoBox {
    pub heading: String,
    pub rows: Vec<InfoPair>,
}

impl InfoBox {
    fn box_height(&self) -> f32 {
        2.0 * PADDING + self.rows.len() as f32 * ROW_HEIGHT
    }
}

#[async_trait]
impl Section for InfoBox {
    fn name(&self) -> &'static str {
        "info_box"
    }

    fn required_height(&self, _ctx: &GeometryContext) -> f32 {
        HEADING_HEIGHT + self.box_height() + SECTION_GAP
    }

    async fn render(&self, ctx: &mut GeometryContext, _acquisition: &ImageAcquisition) -> ReportResult<()> {
        ctx.ensure_space(self.required_height(ctx));
        draw_heading(ctx, &self.heading);

        let (left, top, width) = (ctx.left(), ctx.y(), ctx.content_width());
        let box_height = self.box_height();
        ctx.rect(left, top, width, box_height, Some(COLOR_BOX_FILL), Some(COLOR_LIGHT_GRAY));

        let half = width / 2.0;
        for (i, row) in self.rows.iter().enumerate() {
            let baseline = top + PADDING + 5.0 + i as f32 * ROW_HEIGHT;
            for (column, (key, value)) in [&row.left, &row.right].into_iter().enumerate() {
                let x = left + PADDING + column as f32 * half;
                ctx.text(x, baseline, format!("{}:", key), 9.0, FontWeight::Bold, COLOR_GRAY, Align::Left);
                ctx.text(
                    x + KEY_WIDTH,
                    baseline,
                    truncate_chars(value, VALUE_CHARS),
                    9.0,
                    FontWeight::Regular,
                    COLOR_BLACK,
                    Align::Left,
                );
            }
        }

        ctx.advance(box_height + SECTION_GAP);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::acquisition::test_support::fast_acquisition;
    use crate::report::document::DrawOp;
    use crate::report::sections::test_support::ctx;

    fn pair(a: &str, b: &str) -> InfoPair {
        InfoPair {
            left: (a.to_string(), "x".to_string()),
            right: (b.to_string(), "y".to_string()),
        }
    }

    #[tokio::test]
    async fn test_info_box_moves_whole_to_next_page() {
        let mut ctx = ctx();
        ctx.advance(240.0);
        let info = InfoBox {
            heading: "Personal Data".to_string(),
            rows: vec![pair("Name", "Height"), pair("Age", "Sex"), pair("Goal", "Assessments"), pair("Period", "Last")],
        };
        info.render(&mut ctx, &fast_acquisition()).await.unwrap();
        let doc = ctx.finish();

        assert_eq!(doc.page_count(), 2);
        assert!(doc.pages()[0].ops.is_empty());
        let rects = doc.pages()[1]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { .. }))
            .count();
        assert_eq!(rects, 1);
        assert!(doc.pages()[1].contains_text("Period:"));
    }
}
