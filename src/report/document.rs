//! Paginated document model
//!
//! A `Document` is an ordered list of pages, each an ordered list of draw
//! primitives in absolute millimetre coordinates measured from the top-left
//! corner of the page. Text `y` is the baseline.
//!
//! Lifecycle: created with one blank page, grown by the `GeometryContext`
//! while sections render, then sealed. `finalize` stamps the "i / N" page
//! counter before sealing; once sealed no primitive can be added.

use std::sync::Arc;

use super::acquisition::RasterAsset;
use super::style::{COLOR_GRAY, PT_TO_MM};

pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        weight: FontWeight,
        color: Rgb,
        align: Align,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        thickness: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        asset: Arc<RasterAsset>,
    },
}

impl DrawOp {
    /// Lowest point (largest y) the primitive touches
    pub fn bottom(&self) -> f32 {
        match self {
            // Descenders hang roughly a quarter em below the baseline
            DrawOp::Text { y, size, .. } => y + size * PT_TO_MM * 0.25,
            DrawOp::Rect { y, height, .. } | DrawOp::Image { y, height, .. } => y + height,
            DrawOp::Line { y1, y2, .. } => y1.max(*y2),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(DrawOp::text)
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    width: f32,
    height: f32,
    margin: f32,
    pages: Vec<Page>,
    page_total: Option<usize>,
    sealed: bool,
}

impl Document {
    pub(crate) fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
            pages: vec![Page::default()],
            page_total: None,
            sealed: false,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Page total stamped by `finalize`, if it ran
    pub fn page_total(&self) -> Option<usize> {
        self.page_total
    }

    /// All text runs across the document, in page order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }

    pub(crate) fn add_page(&mut self) {
        if self.sealed {
            tracing::warn!("Ignoring page break on a sealed document");
            return;
        }
        self.pages.push(Page::default());
    }

    pub(crate) fn push(&mut self, op: DrawOp) {
        if self.sealed {
            tracing::warn!("Ignoring draw primitive on a sealed document");
            return;
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Stamp "i / N" bottom-right on every page, then seal.
    ///
    /// N is captured on the first call; later calls leave the document as is.
    pub fn finalize(&mut self) {
        if self.page_total.is_some() {
            return;
        }

        let total = self.pages.len();
        let x = self.width - self.margin;
        let y = self.height - self.margin / 2.0;
        for (index, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::Text {
                x,
                y,
                text: format!("{} / {}", index + 1, total),
                size: 8.0,
                weight: FontWeight::Regular,
                color: COLOR_GRAY,
                align: Align::Right,
            });
        }
        self.page_total = Some(total);
        self.sealed = true;
    }

    /// Seal without page numbering (single-page exports)
    pub fn seal(&mut self) {
        self.sealed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_op(text: &str) -> DrawOp {
        DrawOp::Text {
            x: 20.0,
            y: 30.0,
            text: text.to_string(),
            size: 10.0,
            weight: FontWeight::Regular,
            color: (0, 0, 0),
            align: Align::Left,
        }
    }

    #[test]
    fn test_finalize_stamps_every_page() {
        let mut doc = Document::new(210.0, 297.0, 15.0);
        doc.push(text_op("first"));
        doc.add_page();
        doc.add_page();
        doc.finalize();

        assert_eq!(doc.page_total(), Some(3));
        for (i, page) in doc.pages().iter().enumerate() {
            assert!(page.contains_text(&format!("{} / 3", i + 1)));
        }
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut doc = Document::new(210.0, 297.0, 15.0);
        doc.add_page();
        doc.finalize();
        let once = doc.clone();
        doc.finalize();

        assert_eq!(doc, once);
        for page in doc.pages() {
            assert_eq!(page.texts().filter(|t| t.contains(" / ")).count(), 1);
        }
    }

    #[test]
    fn test_sealed_document_rejects_drawing() {
        let mut doc = Document::new(210.0, 297.0, 15.0);
        doc.seal();
        doc.push(text_op("late"));
        doc.add_page();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.texts().count(), 0);
    }
}
