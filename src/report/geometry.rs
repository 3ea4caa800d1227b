//! Page geometry and the vertical write cursor
//!
//! The `GeometryContext` is the only mutable layout state during composition.
//! Exactly one section borrows it at a time; every primitive is emitted onto
//! the current (last) page of the document it owns.

use std::sync::Arc;

use super::acquisition::RasterAsset;
use super::config::ReportConfig;
use super::document::{Align, Document, DrawOp, FontWeight, Rgb};
use super::error::ReportResult;
use super::style::DIVIDER_ADVANCE;

#[derive(Debug)]
pub struct GeometryContext {
    page_width: f32,
    page_height: f32,
    margin: f32,
    y: f32,
    document: Document,
}

impl GeometryContext {
    pub fn new(config: &ReportConfig) -> ReportResult<Self> {
        config.validate()?;
        Ok(Self {
            page_width: config.page_width_mm,
            page_height: config.page_height_mm,
            margin: config.margin_mm,
            y: config.margin_mm,
            document: Document::new(config.page_width_mm, config.page_height_mm, config.margin_mm),
        })
    }

    pub fn page_width(&self) -> f32 {
        self.page_width
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Current cursor, in millimetres from the top edge
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn left(&self) -> f32 {
        self.margin
    }

    pub fn right(&self) -> f32 {
        self.page_width - self.margin
    }

    /// Lowest y any content may reach
    pub fn bottom(&self) -> f32 {
        self.page_height - self.margin
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    pub fn page_index(&self) -> usize {
        self.document.page_count() - 1
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn at_page_top(&self) -> bool {
        self.y <= self.margin
    }

    /// Distance from the cursor to the bottom margin
    pub fn remaining_height(&self) -> f32 {
        (self.bottom() - self.y).max(0.0)
    }

    /// Break the page when `needed` does not fit below the cursor.
    ///
    /// Returns true when a new page was started. A fresh page never breaks
    /// again: content taller than a whole page starts at the top and the
    /// section is responsible for splitting it.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        if self.remaining_height() >= needed || self.at_page_top() {
            return false;
        }
        self.new_page();
        true
    }

    /// Unconditionally start a new page and reset the cursor
    pub fn new_page(&mut self) {
        self.document.add_page();
        self.y = self.margin;
        tracing::debug!(page = self.page_count(), "Page break");
    }

    /// Move the cursor down; it never passes the bottom margin
    pub fn advance(&mut self, amount: f32) {
        self.y = (self.y + amount).min(self.bottom());
    }

    /// Horizontal rule at the cursor, then a small fixed advance
    pub fn draw_divider(&mut self, color: Rgb) {
        let (left, right, y) = (self.left(), self.right(), self.y);
        self.line(left, y, right, y, color, 0.5);
        self.advance(DIVIDER_ADVANCE);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        x: f32,
        y: f32,
        text: impl Into<String>,
        size: f32,
        weight: FontWeight,
        color: Rgb,
        align: Align,
    ) {
        self.document.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            size,
            weight,
            color,
            align,
        });
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Option<Rgb>, stroke: Option<Rgb>) {
        self.document.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, thickness: f32) {
        self.document.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            thickness,
        });
    }

    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32, asset: Arc<RasterAsset>) {
        self.document.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            asset,
        });
    }

    /// Hand the document over for finalization
    pub fn finish(self) -> Document {
        self.document
    }
}
