//! Progress photographs.
//!
//! One column lays the four canonical slots out as a 2x2 grid. Two or more
//! columns sit side by side, each with its own 2x2 sub-grid of thumbnails
//! under a date label. Slots without a decodable photo draw nothing, and a
//! grid row with no photos at all is skipped entirely.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{draw_heading, Section};
use crate::models::PhotoSlot;
use crate::report::acquisition::{ImageAcquisition, ProgressEvent, RasterAsset};
use crate::report::document::{Align, FontWeight};
use crate::report::error::ReportResult;
use crate::report::geometry::GeometryContext;
use crate::report::style::{COLOR_BLACK, COLOR_GRAY, COLOR_PRIMARY, HEADING_HEIGHT, SECTION_GAP};

const GRID_ROWS: usize = 2;
const COLUMN_GAP: f32 = 8.0;
const ROW_GAP: f32 = 4.0;

// Single-record grid
const SLOT_LABEL_HEIGHT: f32 = 6.0;
const IMAGE_HEIGHT: f32 = 75.0;

// Side-by-side comparison
const DATE_LABEL_HEIGHT: f32 = 7.0;
const THUMB_LABEL_HEIGHT: f32 = 5.0;
const THUMB_HEIGHT: f32 = 50.0;
const THUMB_GAP: f32 = 4.0;

/// Photos of one assessment, labeled for display
pub struct PhotoColumn<'a> {
    pub label: String,
    pub date: NaiveDate,
    pub photos: &'a BTreeMap<PhotoSlot, String>,
}

impl PhotoColumn<'_> {
    fn caption(&self) -> String {
        format!("{} ({})", self.label, self.date.format("%d/%m/%Y"))
    }
}

pub struct PhotoComparisonSection<'a> {
    pub heading: String,
    pub columns: Vec<PhotoColumn<'a>>,
}

/// A decoded slot ready to place
struct PlacedPhoto {
    slot: PhotoSlot,
    asset: Arc<RasterAsset>,
}

impl PlacedPhoto {
    fn grid_row(&self) -> usize {
        self.slot.grid_cell().0
    }

    fn grid_col(&self) -> usize {
        self.slot.grid_cell().1
    }
}

impl PhotoComparisonSection<'_> {
    fn resolve(&self, acquisition: &ImageAcquisition) -> Vec<Vec<PlacedPhoto>> {
        self.columns
            .iter()
            .map(|column| {
                PhotoSlot::ALL
                    .iter()
                    .filter_map(|&slot| {
                        let payload = column.photos.get(&slot)?;
                        match acquisition.resolve_photo(Some(payload)) {
                            Some(asset) => {
                                acquisition.emit(ProgressEvent::PhotoResolved { date: column.date, slot });
                                Some(PlacedPhoto {
                                    slot,
                                    asset: Arc::new(asset),
                                })
                            }
                            None => {
                                acquisition.emit(ProgressEvent::PhotoSkipped {
                                    date: column.date,
                                    slot,
                                    reason: "undecodable payload".to_string(),
                                });
                                None
                            }
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn column_width(&self, ctx: &GeometryContext) -> f32 {
        let n = self.columns.len().max(1) as f32;
        (ctx.content_width() - COLUMN_GAP * (n - 1.0)) / n
    }

    /// Draw `asset` scaled into the box, horizontally centered
    fn place(ctx: &mut GeometryContext, x: f32, y: f32, box_width: f32, box_height: f32, asset: &Arc<RasterAsset>) {
        let (width, height) = asset.fit_within(box_width, box_height);
        ctx.image(x + (box_width - width) / 2.0, y, width, height, Arc::clone(asset));
    }

    fn render_single(&self, ctx: &mut GeometryContext, photos: &[PlacedPhoto]) {
        let cell_width = (ctx.content_width() - COLUMN_GAP) / 2.0;
        let row_height = SLOT_LABEL_HEIGHT + IMAGE_HEIGHT;

        for row in 0..GRID_ROWS {
            let cells: Vec<&PlacedPhoto> = photos.iter().filter(|p| p.grid_row() == row).collect();
            if cells.is_empty() {
                continue;
            }
            ctx.ensure_space(row_height);

            let top = ctx.y();
            for photo in cells {
                let x = ctx.left() + photo.grid_col() as f32 * (cell_width + COLUMN_GAP);
                ctx.text(
                    x,
                    top + 4.0,
                    photo.slot.display_name(),
                    9.0,
                    FontWeight::Bold,
                    COLOR_GRAY,
                    Align::Left,
                );
                Self::place(ctx, x, top + SLOT_LABEL_HEIGHT, cell_width, IMAGE_HEIGHT, &photo.asset);
            }
            ctx.advance(row_height + ROW_GAP);
        }
    }

    fn draw_date_labels(&self, ctx: &mut GeometryContext, column_width: f32) {
        let top = ctx.y();
        for (i, column) in self.columns.iter().enumerate() {
            let x = ctx.left() + i as f32 * (column_width + COLUMN_GAP);
            ctx.text(x, top + 5.0, column.caption(), 10.0, FontWeight::Bold, COLOR_PRIMARY, Align::Left);
        }
        ctx.advance(DATE_LABEL_HEIGHT);
    }

    fn render_comparison(&self, ctx: &mut GeometryContext, resolved: &[Vec<PlacedPhoto>]) {
        let column_width = self.column_width(ctx);
        let thumb_width = (column_width - THUMB_GAP) / 2.0;
        let row_height = THUMB_LABEL_HEIGHT + THUMB_HEIGHT;

        self.draw_date_labels(ctx, column_width);

        for row in 0..GRID_ROWS {
            if !resolved.iter().flatten().any(|p| p.grid_row() == row) {
                continue;
            }
            if ctx.ensure_space(row_height) {
                self.draw_date_labels(ctx, column_width);
            }

            let top = ctx.y();
            for (i, photos) in resolved.iter().enumerate() {
                let column_x = ctx.left() + i as f32 * (column_width + COLUMN_GAP);
                for photo in photos.iter().filter(|p| p.grid_row() == row) {
                    let x = column_x + photo.grid_col() as f32 * (thumb_width + THUMB_GAP);
                    ctx.text(
                        x,
                        top + 3.5,
                        photo.slot.display_name(),
                        7.0,
                        FontWeight::Regular,
                        COLOR_BLACK,
                        Align::Left,
                    );
                    Self::place(ctx, x, top + THUMB_LABEL_HEIGHT, thumb_width, THUMB_HEIGHT, &photo.asset);
                }
            }
            ctx.advance(row_height + ROW_GAP);
        }
    }
}

#[async_trait]
impl Section for PhotoComparisonSection<'_> {
    fn name(&self) -> &'static str {
        "photos"
    }

    fn required_height(&self, _ctx: &GeometryContext) -> f32 {
        let grid = if self.columns.len() > 1 {
            DATE_LABEL_HEIGHT + GRID_ROWS as f32 * (THUMB_LABEL_HEIGHT + THUMB_HEIGHT + ROW_GAP)
        } else {
            GRID_ROWS as f32 * (SLOT_LABEL_HEIGHT + IMAGE_HEIGHT + ROW_GAP)
        };
        HEADING_HEIGHT + grid + SECTION_GAP
    }

    async fn render(&self, ctx: &mut GeometryContext, acquisition: &ImageAcquisition) -> ReportResult<()> {
        let resolved = self.resolve(acquisition);
        if resolved.iter().all(Vec::is_empty) {
            tracing::debug!("No decodable photos, skipping photo section");
            return Ok(());
        }

        let first_row = if self.columns.len() > 1 {
            DATE_LABEL_HEIGHT + THUMB_LABEL_HEIGHT + THUMB_HEIGHT
        } else {
            SLOT_LABEL_HEIGHT + IMAGE_HEIGHT
        };
        ctx.ensure_space(HEADING_HEIGHT + first_row);
        draw_heading(ctx, &self.heading);

        match resolved.as_slice() {
            [single] => self.render_single(ctx, single),
            many => self.render_comparison(ctx, many),
        }

        ctx.advance(SECTION_GAP);
        Ok(())
    }
}
