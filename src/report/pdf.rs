//! PDF serialization (printpdf)
//!
//! Walks a sealed `Document` and replays each primitive onto its own PDF
//! page. Document coordinates are top-down; PDF user space is bottom-up.

use std::io::{BufWriter, Cursor};

use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use super::document::{Align, Document, DrawOp, FontWeight, Rgb as Color8};
use super::error::{ReportError, ReportResult};
use super::style::text_width_mm;

const MM_PER_INCH: f32 = 25.4;

fn rgb_to_printpdf(color: Color8) -> Color {
    Color::Rgb(Rgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Serialize `document` to PDF bytes, one PDF page per document page
pub fn render_pdf(document: &Document, title: &str) -> ReportResult<Vec<u8>> {
    let (width, height) = (document.width(), document.height());
    let (doc, first_page, first_layer) = PdfDocument::new(title, Mm(width), Mm(height), "Layer 1");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Pdf(e.to_string()))?,
    };

    for (index, page) in document.pages().iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(Mm(width), Mm(height), format!("Page {}", index + 1));
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        for op in &page.ops {
            draw(&layer, &fonts, height, op)?;
        }
    }

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(Cursor::new(&mut bytes));
        doc.save(&mut writer).map_err(|e| ReportError::Pdf(e.to_string()))?;
    }

    tracing::debug!(pages = document.page_count(), bytes = bytes.len(), "PDF serialized");
    Ok(bytes)
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, page_height: f32, op: &DrawOp) -> ReportResult<()> {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            size,
            weight,
            color,
            align,
        } => {
            let x = match align {
                Align::Left => *x,
                Align::Center => x - text_width_mm(text, *size) / 2.0,
                Align::Right => x - text_width_mm(text, *size),
            };
            layer.set_fill_color(rgb_to_printpdf(*color));
            layer.use_text(text.as_str(), *size, Mm(x), Mm(page_height - y), fonts.get(*weight));
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let mode = match (fill, stroke) {
                (Some(_), Some(_)) => PaintMode::FillStroke,
                (Some(_), None) => PaintMode::Fill,
                (None, Some(_)) => PaintMode::Stroke,
                (None, None) => return Ok(()),
            };
            if let Some(fill) = fill {
                layer.set_fill_color(rgb_to_printpdf(*fill));
            }
            if let Some(stroke) = stroke {
                layer.set_outline_color(rgb_to_printpdf(*stroke));
                layer.set_outline_thickness(0.5);
            }

            let (top, bottom) = (page_height - y, page_height - y - height);
            let ring = vec![
                (Point::new(Mm(*x), Mm(bottom)), false),
                (Point::new(Mm(x + width), Mm(bottom)), false),
                (Point::new(Mm(x + width), Mm(top)), false),
                (Point::new(Mm(*x), Mm(top)), false),
            ];
            layer.add_polygon(Polygon {
                rings: vec![ring],
                mode,
                winding_order: WindingOrder::NonZero,
            });
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            thickness,
        } => {
            layer.set_outline_color(rgb_to_printpdf(*color));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(page_height - y1)), false),
                    (Point::new(Mm(*x2), Mm(page_height - y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Image {
            x,
            y,
            width,
            height,
            asset,
        } => {
            if asset.width == 0 || asset.height == 0 || *width <= 0.0 || *height <= 0.0 {
                return Ok(());
            }
            let bitmap = RgbImage::from_raw(asset.width, asset.height, asset.pixels.as_ref().clone())
                .ok_or_else(|| ReportError::Pdf("image buffer does not match its dimensions".to_string()))?;
            let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(bitmap));

            // dpi fixes the drawn width; scale_y stretches the height to the box
            let dpi = asset.width as f32 * MM_PER_INCH / width;
            let natural_height = asset.height as f32 * MM_PER_INCH / dpi;

            image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(Mm(page_height - y - height)),
                    dpi: Some(dpi),
                    scale_y: Some(height / natural_height),
                    ..Default::default()
                },
            );
        }
    }
    Ok(())
}
