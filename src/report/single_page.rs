//! One-page chart printout: title block, a chart filling the page, footer

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use super::acquisition::{ChartSource, ImageAcquisition};
use super::config::ReportConfig;
use super::document::{Align, Document, FontWeight};
use super::error::{ReportError, ReportResult};
use super::geometry::GeometryContext;
use super::sections::{ChartSection, Section, TitleBlock};
use super::style::{COLOR_GRAY, COLOR_LIGHT_GRAY};
use crate::build_info::BuildInfo;
use crate::models::Subject;

/// Space kept free under the chart for the footer
const FOOTER_RESERVE: f32 = 12.0;

pub struct SinglePagePrintComposer {
    config: ReportConfig,
    generated_at: NaiveDateTime,
    producer: String,
}

impl SinglePagePrintComposer {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            generated_at: Local::now().naive_local(),
            producer: BuildInfo::current().producer(),
        }
    }

    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Always exactly one page; the document comes back sealed without a page counter
    pub async fn compose(&self, chart: Arc<dyn ChartSource>, subject: &Subject, title: &str) -> ReportResult<Document> {
        if subject.name.trim().is_empty() {
            return Err(ReportError::InvalidInput("subject name is empty".to_string()));
        }

        let mut ctx = GeometryContext::new(&self.config)?;
        let acquisition = ImageAcquisition::new(&self.config);

        TitleBlock {
            title: title.to_string(),
            subtitle: format!("Subject: {}", subject.name),
            generated_at: self.generated_at,
        }
        .render(&mut ctx, &acquisition)
        .await?;

        ChartSection::new(title, Some(chart))
            .filling_page(FOOTER_RESERVE)
            .render(&mut ctx, &acquisition)
            .await?;

        self.draw_footer(&mut ctx);

        let mut document = ctx.finish();
        document.seal();
        tracing::info!(subject = %subject.name, title, "Single-page chart report composed");
        Ok(document)
    }

    fn draw_footer(&self, ctx: &mut GeometryContext) {
        let bottom = ctx.bottom();
        let (left, right) = (ctx.left(), ctx.right());
        ctx.line(left, bottom - 6.0, right, bottom - 6.0, COLOR_LIGHT_GRAY, 0.5);
        ctx.text(
            ctx.page_width() / 2.0,
            bottom - 1.5,
            format!(
                "Generated by {} on {}",
                self.producer,
                self.generated_at.format("%d/%m/%Y %H:%M")
            ),
            8.0,
            FontWeight::Regular,
            COLOR_GRAY,
            Align::Center,
        );
    }
}
