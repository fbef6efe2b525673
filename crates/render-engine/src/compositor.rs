//! Composite canvas: lays the photo set out in a framed grid.
//!
//! The canvas is `cols * cell_width` by `rows * cell_height`, filled with the
//! frame color and stroked with a border of the same color. Each photo is
//! scaled to fit its padded cell without distortion and centered there.
//! Photos are drawn one after another in slot order, then the date stamp is
//! drawn on top.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use photobooth_common::config::BoothDefaults;
use photobooth_common::error::{PhotoboothError, PhotoboothResult};
use photobooth_model::{CapturedImage, FrameColor, Layout, PhotoSet};

use crate::watermark::{draw_watermark, WatermarkStyle};

/// Geometry and typography of a composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeStyle {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Space between a cell edge and the area a photo may occupy.
    pub cell_padding: u32,
    /// Stroke width of the outer frame border.
    pub border_width: u32,
    pub watermark: WatermarkStyle,
}

impl Default for CompositeStyle {
    fn default() -> Self {
        Self {
            cell_width: 400,
            cell_height: 300,
            cell_padding: 10,
            border_width: 10,
            watermark: WatermarkStyle::default(),
        }
    }
}

impl CompositeStyle {
    pub fn from_defaults(defaults: &BoothDefaults) -> Self {
        Self {
            cell_width: defaults.cell_width,
            cell_height: defaults.cell_height,
            cell_padding: defaults.cell_padding,
            border_width: defaults.border_width,
            watermark: WatermarkStyle {
                size_px: defaults.watermark_size,
                ..WatermarkStyle::default()
            },
        }
    }

    /// Canvas size for `layout`.
    pub fn canvas_size(&self, layout: Layout) -> (u32, u32) {
        (
            self.cell_width * layout.cols(),
            self.cell_height * layout.rows(),
        )
    }

    /// Area a photo may occupy inside one cell.
    fn target_size(&self) -> (u32, u32) {
        (
            self.cell_width.saturating_sub(2 * self.cell_padding).max(1),
            self.cell_height.saturating_sub(2 * self.cell_padding).max(1),
        )
    }
}

/// Where one photo ended up on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPlacement {
    pub slot: usize,
    pub col: u32,
    pub row: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A rendered composite.
#[derive(Debug, Clone)]
pub struct CompositeCanvas {
    pub pixels: RgbaImage,
    pub layout: Layout,
    pub color: FrameColor,
    pub placements: Vec<CellPlacement>,
    pub date_stamp: String,
}

impl CompositeCanvas {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Encode the canvas as a PNG capture.
    pub fn to_captured(&self) -> PhotoboothResult<CapturedImage> {
        CapturedImage::from_rgba(&self.pixels)
            .map_err(|e| PhotoboothError::export(format!("failed to encode composite: {e}")))
    }
}

/// Largest size with the source's aspect ratio that fits in the target.
pub fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (source.0.max(1) as f64, source.1.max(1) as f64);
    let (tw, th) = (target.0 as f64, target.1 as f64);
    let scale = (tw / sw).min(th / sh);
    let width = ((sw * scale).round() as u32).clamp(1, target.0.max(1));
    let height = ((sh * scale).round() as u32).clamp(1, target.1.max(1));
    (width, height)
}

/// Render the photo set into a framed composite.
///
/// Only the first `layout.count()` slots are composed; empty slots leave
/// their cell showing the background.
pub fn compose(
    photos: &PhotoSet,
    color: FrameColor,
    style: &CompositeStyle,
    date_stamp: &str,
) -> PhotoboothResult<CompositeCanvas> {
    let layout = photos.layout();
    let (width, height) = style.canvas_size(layout);
    let frame = Rgba(color.rgba());
    let mut pixels = RgbaImage::from_pixel(width, height, frame);
    draw_border(&mut pixels, frame, style.border_width);

    let (target_w, target_h) = style.target_size();
    let mut placements = Vec::new();

    for (slot, photo) in photos.photos().take_while(|(i, _)| *i < layout.count()) {
        let source = photo.decode().map_err(|e| {
            tracing::error!(slot, error = %e, "Failed to decode photo for composite");
            PhotoboothError::export(format!("photo {} could not be decoded: {e}", slot + 1))
        })?;

        let (col, row) = layout.cell_of(slot);
        let (draw_w, draw_h) = fit_within(source.dimensions(), (target_w, target_h));
        let x = col * style.cell_width + style.cell_padding + (target_w - draw_w) / 2;
        let y = row * style.cell_height + style.cell_padding + (target_h - draw_h) / 2;

        let scaled = imageops::resize(&source, draw_w, draw_h, FilterType::Triangle);
        imageops::overlay(&mut pixels, &scaled, x as i64, y as i64);

        placements.push(CellPlacement {
            slot,
            col,
            row,
            x,
            y,
            width: draw_w,
            height: draw_h,
        });
    }

    draw_watermark(&mut pixels, date_stamp, &style.watermark);

    tracing::info!(
        layout = layout.id(),
        color = color.name(),
        width,
        height,
        photos = placements.len(),
        "Composite rendered"
    );

    Ok(CompositeCanvas {
        pixels,
        layout,
        color,
        placements,
        date_stamp: date_stamp.to_string(),
    })
}

/// Stroke a border of `stroke` pixels along every edge of the canvas.
fn draw_border(canvas: &mut RgbaImage, color: Rgba<u8>, stroke: u32) {
    let (w, h) = canvas.dimensions();
    let stroke = stroke.min(w / 2).min(h / 2);
    if stroke == 0 {
        return;
    }
    let edges = [
        Rect::at(0, 0).of_size(w, stroke),
        Rect::at(0, (h - stroke) as i32).of_size(w, stroke),
        Rect::at(0, 0).of_size(stroke, h),
        Rect::at((w - stroke) as i32, 0).of_size(stroke, h),
    ];
    for edge in edges {
        draw_filled_rect_mut(canvas, edge, color);
    }
}
