//! KPI cards: one colored card per tracked metric, two per row

use async_trait::async_trait;

use super::{draw_heading, Section};
use crate::report::acquisition::ImageAcquisition;
use crate::report::document::{Align, FontWeight};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::metrics::{format_delta, Trend};
use crate::report::style::{COLOR_WHITE, HEADING_HEIGHT, SECTION_GAP};

const CARDS_PER_ROW: usize = 2;
const CARD_HEIGHT: f32 = 24.0;
const CARD_GAP: f32 = 6.0;

#[derive(Debug, Clone)]
pub struct KpiCard {
    pub label: String,
    pub delta: Option<f64>,
    pub unit: String,
}

impl KpiCard {
    pub fn trend(&self) -> Trend {
        Trend::from_delta(self.delta)
    }
}

pub struct KpiCardGrid {
    pub heading: String,
    pub cards: Vec<KpiCard>,
}

impl KpiCardGrid {
    fn row_count(&self) -> usize {
        self.cards.len().div_ceil(CARDS_PER_ROW)
    }
}

#[async_trait]
impl Section for KpiCardGrid {
    fn name(&self) -> &'static str {
        "kpi_cards"
    }

    fn required_height(&self, _ctx: &GeometryContext) -> f32 {
        let rows = self.row_count() as f32;
        HEADING_HEIGHT + rows * CARD_HEIGHT + (rows - 1.0).max(0.0) * CARD_GAP + SECTION_GAP
    }

    async fn render(&self, ctx: &mut GeometryContext, _acquisition: &ImageAcquisition) -> ReportResult<()> {
        if self.cards.is_empty() {
            return Ok(());
        }

        // Heading stays with at least the first row
        ctx.ensure_space(HEADING_HEIGHT + CARD_HEIGHT);
        draw_heading(ctx, &self.heading);

        let card_width = (ctx.content_width() - CARD_GAP * (CARDS_PER_ROW - 1) as f32) / CARDS_PER_ROW as f32;

        for (row_index, row) in self.cards.chunks(CARDS_PER_ROW).enumerate() {
            if row_index > 0 {
                ctx.advance(CARD_GAP);
            }
            ctx.ensure_space(CARD_HEIGHT);

            let top = ctx.y();
            for (column, card) in row.iter().enumerate() {
                let x = ctx.left() + column as f32 * (card_width + CARD_GAP);
                let trend = card.trend();

                ctx.rect(x, top, card_width, CARD_HEIGHT, Some(trend.color()), None);
                ctx.text(x + 4.0, top + 7.0, &card.label, 9.0, FontWeight::Regular, COLOR_WHITE, Align::Left);
                ctx.text(
                    x + 4.0,
                    top + 16.0,
                    format_delta(card.delta, &card.unit),
                    16.0,
                    FontWeight::Bold,
                    COLOR_WHITE,
                    Align::Left,
                );
                ctx.text(x + 4.0, top + 21.0, trend.word(), 8.0, FontWeight::Regular, COLOR_WHITE, Align::Left);
            }
            ctx.advance(CARD_HEIGHT);
        }

        ctx.advance(SECTION_GAP);
        Ok(())
    }
}
