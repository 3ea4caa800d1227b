//! Wrapped narrative text, optionally inside a filled box.
//!
//! A block that fits on one page is kept whole. Taller blocks are split
//! line by line, each page getting its own box segment.

use async_trait::async_trait;

use super::{draw_heading, Section};
use crate::report::acquisition::ImageAcquisition;
use crate::report::document::{Align, FontWeight, Rgb};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::style::{line_height_mm, wrap_text, COLOR_BLACK, HEADING_HEIGHT, SECTION_GAP};

const BOX_PADDING: f32 = 4.0;

pub struct TextBlock {
    pub heading: Option<String>,
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
    pub size: f32,
    pub fill: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Line { text: String, weight: FontWeight },
    Spacer,
}

impl TextBlock {
    pub fn new(paragraphs: Vec<String>) -> Self {
        Self {
            heading: None,
            title: None,
            paragraphs,
            size: 10.0,
            fill: None,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn boxed(mut self, title: impl Into<String>, fill: Rgb) -> Self {
        self.title = Some(title.into());
        self.fill = Some(fill);
        self
    }

    fn padding(&self) -> f32 {
        if self.fill.is_some() {
            BOX_PADDING
        } else {
            0.0
        }
    }

    fn line_height(&self) -> f32 {
        line_height_mm(self.size)
    }

    fn entry_height(&self, entry: &Entry) -> f32 {
        match entry {
            Entry::Line { .. } => self.line_height(),
            Entry::Spacer => self.line_height() / 2.0,
        }
    }

    fn layout(&self, width: f32) -> Vec<Entry> {
        let text_width = width - 2.0 * self.padding();
        let mut entries = Vec::new();

        if let Some(title) = &self.title {
            for text in wrap_text(title, self.size, text_width) {
                entries.push(Entry::Line {
                    text,
                    weight: FontWeight::Bold,
                });
            }
        }
        for paragraph in &self.paragraphs {
            let lines = wrap_text(paragraph, self.size, text_width);
            if lines.is_empty() {
                continue;
            }
            if !entries.is_empty() {
                entries.push(Entry::Spacer);
            }
            entries.extend(lines.into_iter().map(|text| Entry::Line {
                text,
                weight: FontWeight::Regular,
            }));
        }
        entries
    }

    fn body_height(&self, entries: &[Entry]) -> f32 {
        entries.iter().map(|e| self.entry_height(e)).sum::<f32>() + 2.0 * self.padding()
    }

    /// Draw one page's worth of entries starting at `start`; returns the next index
    fn draw_chunk(&self, ctx: &mut GeometryContext, entries: &[Entry], start: usize) -> usize {
        let padding = self.padding();
        let available = ctx.remaining_height() - 2.0 * padding;

        // Spacers never open a page segment
        let mut index = start;
        while matches!(entries.get(index), Some(Entry::Spacer)) {
            index += 1;
        }

        let mut end = index;
        let mut used = 0.0;
        while end < entries.len() {
            let h = self.entry_height(&entries[end]);
            if used + h > available && end > index {
                break;
            }
            used += h;
            end += 1;
        }

        let (left, top, width) = (ctx.left(), ctx.y(), ctx.content_width());
        if let Some(fill) = self.fill {
            ctx.rect(left, top, width, used + 2.0 * padding, Some(fill), None);
        }

        let mut offset = 0.0;
        for entry in &entries[index..end] {
            if let Entry::Line { text, weight } = entry {
                let baseline = top + padding + offset + self.line_height() * 0.75;
                ctx.text(left + padding, baseline, text.as_str(), self.size, *weight, COLOR_BLACK, Align::Left);
            }
            offset += self.entry_height(entry);
        }

        ctx.advance(used + 2.0 * padding);
        end
    }
}

#[async_trait]
impl Section for TextBlock {
    fn name(&self) -> &'static str {
        "text"
    }

    fn required_height(&self, ctx: &GeometryContext) -> f32 {
        let heading = if self.heading.is_some() { HEADING_HEIGHT } else { 0.0 };
        heading + self.body_height(&self.layout(ctx.content_width())) + SECTION_GAP
    }

    async fn render(&self, ctx: &mut GeometryContext, _acquisition: &ImageAcquisition) -> ReportResult<()> {
        let entries = self.layout(ctx.content_width());
        if entries.is_empty() {
            return Ok(());
        }

        let heading = if self.heading.is_some() { HEADING_HEIGHT } else { 0.0 };
        let whole = heading + self.body_height(&entries);
        if whole <= ctx.content_height() {
            ctx.ensure_space(whole);
        } else {
            ctx.ensure_space(heading + 2.0 * self.padding() + 3.0 * self.line_height());
        }
        if let Some(heading) = &self.heading {
            draw_heading(ctx, heading);
        }

        let mut next = 0;
        loop {
            next = self.draw_chunk(ctx, &entries, next);
            if next >= entries.len() {
                break;
            }
            ctx.new_page();
        }

        ctx.advance(SECTION_GAP);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::acquisition::test_support::fast_acquisition;
    use crate::report::document::DrawOp;
    use crate::report::sections::test_support::{assert_within_margins, ctx};
    use crate::report::style::{text_width_mm, COLOR_OBSERVATIONS_FILL};

    #[tokio::test]
    async fn test_lines_wrap_inside_box() {
        let mut ctx = ctx();
        let block = TextBlock::new(vec!["lorem ipsum dolor sit amet ".repeat(20)])
            .with_heading("Analysis")
            .boxed("Observations", COLOR_OBSERVATIONS_FILL);
        block.render(&mut ctx, &fast_acquisition()).await.unwrap();
        let doc = ctx.finish();

        let page = &doc.pages()[0];
        assert!(page.contains_text("Observations"));
        for op in &page.ops {
            if let DrawOp::Text { text, size, x, .. } = op {
                assert!(x + text_width_mm(text, *size) <= 195.0 + 0.01, "overflow: {}", text);
            }
        }
        assert_eq!(
            page.ops
                .iter()
                .filter(|op| matches!(op, DrawOp::Rect { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_tall_block_splits_across_pages() {
        let mut ctx = ctx();
        let paragraphs = (0..80).map(|i| format!("Paragraph number {} with a little text.", i)).collect();
        TextBlock::new(paragraphs)
            .boxed("Notes", COLOR_OBSERVATIONS_FILL)
            .render(&mut ctx, &fast_acquisition())
            .await
            .unwrap();
        let doc = ctx.finish();

        assert!(doc.page_count() >= 2);
        assert_within_margins(&doc);
        let all: Vec<&str> = doc.pages().iter().flat_map(|p| p.texts()).collect();
        assert!(all.contains(&"Paragraph number 0 with a little text."));
        assert!(all.contains(&"Paragraph number 79 with a little text."));
    }

    #[tokio::test]
    async fn test_empty_block_draws_nothing() {
        let mut ctx = ctx();
        TextBlock::new(vec!["   ".to_string()])
            .render(&mut ctx, &fast_acquisition())
            .await
            .unwrap();
        assert_eq!(ctx.y(), 15.0);
    }
}
