//! Tables with a styled header row and zebra shading.
//!
//! Rows are atomic: each one asks for its own space, and the header is
//! repeated at the top of every continuation page.

use async_trait::async_trait;

use super::{draw_heading, Section};
use crate::report::acquisition::ImageAcquisition;
use crate::report::document::{Align, FontWeight, Rgb};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::style::{
    text_width_mm, truncate_chars, COLOR_BLACK, COLOR_PRIMARY, COLOR_WHITE, COLOR_ZEBRA, HEADING_HEIGHT,
    SECTION_GAP,
};

const HEADER_HEIGHT: f32 = 8.0;
const ROW_HEIGHT: f32 = 7.0;
const CELL_PADDING: f32 = 2.0;
const FONT_SIZE: f32 = 8.0;

#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub width: f32,
    pub max_chars: Option<usize>,
    pub align: Align,
}

impl Column {
    pub fn new(header: impl Into<String>, width: f32) -> Self {
        Self {
            header: header.into(),
            width,
            max_chars: None,
            align: Align::Left,
        }
    }

    pub fn truncated(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub color: Option<Rgb>,
}

impl Cell {
    pub fn colored(text: impl Into<String>, color: Rgb) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self { text, color: None }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

pub struct TableSection {
    pub title: Option<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableSection {
    /// Column widths, shrunk proportionally when wider than the content area
    fn widths(&self, content_width: f32) -> Vec<f32> {
        let total: f32 = self.columns.iter().map(|c| c.width).sum();
        let factor = if total > content_width && total > 0.0 {
            content_width / total
        } else {
            1.0
        };
        self.columns.iter().map(|c| c.width * factor).collect()
    }

    fn cell_x(left: f32, width: f32, align: Align) -> f32 {
        match align {
            Align::Left => left + CELL_PADDING,
            Align::Center => left + width / 2.0,
            Align::Right => left + width - CELL_PADDING,
        }
    }

    /// Fit `text` into a cell, by the column's char budget and by width
    fn fit(text: &str, column: &Column, width: f32) -> String {
        let usable = (width - 2.0 * CELL_PADDING).max(0.0);
        let by_width = (usable / text_width_mm("x", FONT_SIZE)).floor() as usize;
        let budget = column.max_chars.map_or(by_width, |limit| limit.min(by_width));
        truncate_chars(text, budget)
    }

    fn draw_header(&self, ctx: &mut GeometryContext, widths: &[f32]) {
        let (left, top) = (ctx.left(), ctx.y());
        ctx.rect(left, top, widths.iter().sum(), HEADER_HEIGHT, Some(COLOR_PRIMARY), None);

        let mut x = left;
        for (column, &width) in self.columns.iter().zip(widths) {
            let text = Self::fit(&column.header, column, width);
            ctx.text(
                Self::cell_x(x, width, column.align),
                top + 5.5,
                text,
                FONT_SIZE,
                FontWeight::Bold,
                COLOR_WHITE,
                column.align,
            );
            x += width;
        }
        ctx.advance(HEADER_HEIGHT);
    }

    fn draw_row(&self, ctx: &mut GeometryContext, widths: &[f32], index: usize, row: &[Cell]) {
        let (left, top) = (ctx.left(), ctx.y());
        if index % 2 == 1 {
            ctx.rect(left, top, widths.iter().sum(), ROW_HEIGHT, Some(COLOR_ZEBRA), None);
        }

        let mut x = left;
        for ((column, &width), cell) in self.columns.iter().zip(widths).zip(row) {
            let text = Self::fit(&cell.text, column, width);
            ctx.text(
                Self::cell_x(x, width, column.align),
                top + 5.0,
                text,
                FONT_SIZE,
                FontWeight::Regular,
                cell.color.unwrap_or(COLOR_BLACK),
                column.align,
            );
            x += width;
        }
        ctx.advance(ROW_HEIGHT);
    }
}

#[async_trait]
impl Section for TableSection {
    fn name(&self) -> &'static str {
        "table"
    }

    fn required_height(&self, _ctx: &GeometryContext) -> f32 {
        let title = if self.title.is_some() { HEADING_HEIGHT } else { 0.0 };
        title + HEADER_HEIGHT + self.rows.len() as f32 * ROW_HEIGHT + SECTION_GAP
    }

    async fn render(&self, ctx: &mut GeometryContext, _acquisition: &ImageAcquisition) -> ReportResult<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let widths = self.widths(ctx.content_width());

        // Title, header and first row travel together
        let lead = if self.title.is_some() { HEADING_HEIGHT } else { 0.0 };
        let first_row = if self.rows.is_empty() { 0.0 } else { ROW_HEIGHT };
        ctx.ensure_space(lead + HEADER_HEIGHT + first_row);
        if let Some(title) = &self.title {
            draw_heading(ctx, title);
        }
        self.draw_header(ctx, &widths);

        for (index, row) in self.rows.iter().enumerate() {
            if ctx.ensure_space(ROW_HEIGHT) {
                self.draw_header(ctx, &widths);
            }
            self.draw_row(ctx, &widths, index, row);
        }

        ctx.advance(SECTION_GAP);
        Ok(())
    }
}
