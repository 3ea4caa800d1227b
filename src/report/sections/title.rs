//! Title block: centered title, subtitle and generation timestamp

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::Section;
use crate::report::acquisition::ImageAcquisition;
use crate::report::document::{Align, FontWeight};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::style::{COLOR_GRAY, COLOR_LIGHT_GRAY, COLOR_PRIMARY, DIVIDER_ADVANCE};

const TITLE_BLOCK_HEIGHT: f32 = 24.0;

pub struct TitleBlock {
    pub title: String,
    pub subtitle: String,
    pub generated_at: NaiveDateTime,
}

#[async_trait]
impl Section for TitleBlock {
    fn name(&self) -> &'static str {
        "title"
    }

    fn required_height(&self, _ctx: &GeometryContext) -> f32 {
        TITLE_BLOCK_HEIGHT + DIVIDER_ADVANCE
    }

    /// Always drawn first on a page, so it never asks for a break
    async fn render(&self, ctx: &mut GeometryContext, _acquisition: &ImageAcquisition) -> ReportResult<()> {
        let center = ctx.page_width() / 2.0;
        let top = ctx.y();

        ctx.text(center, top + 8.0, &self.title, 18.0, FontWeight::Bold, COLOR_PRIMARY, Align::Center);
        ctx.text(center, top + 15.0, &self.subtitle, 11.0, FontWeight::Regular, COLOR_GRAY, Align::Center);
        ctx.text(
            center,
            top + 21.0,
            format!("Generated on {}", self.generated_at.format("%d/%m/%Y %H:%M")),
            8.0,
            FontWeight::Regular,
            COLOR_GRAY,
            Align::Center,
        );

        ctx.advance(TITLE_BLOCK_HEIGHT);
        ctx.draw_divider(COLOR_LIGHT_GRAY);
        Ok(())
    }
}
