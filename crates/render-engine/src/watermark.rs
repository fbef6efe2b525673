//! Date-stamp watermark.
//!
//! Glyphs come from an embedded 8x8 bitmap font, so the stamp renders the
//! same everywhere and never falls back to a platform serif or cursive face.
//! The declared font stack is what a text-capable host would be asked for.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Font stack for the watermark. Sans-serif families only.
pub const WATERMARK_FONT_STACK: [&str; 10] = [
    "-apple-system",
    "BlinkMacSystemFont",
    "Segoe UI",
    "Roboto",
    "Oxygen",
    "Ubuntu",
    "Cantarell",
    "Open Sans",
    "Helvetica Neue",
    "sans-serif",
];

/// Native glyph cell size of the embedded font.
const GLYPH_CELL: u32 = 8;

/// How the watermark is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkStyle {
    /// Glyph height in pixels; rounded down to a multiple of 8.
    pub size_px: u32,
    /// Distance from the right edge to the end of the text.
    pub margin_right: u32,
    /// Distance from the bottom edge to the text baseline.
    pub margin_bottom: u32,
    pub color: Rgba<u8>,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            size_px: 16,
            margin_right: 15,
            margin_bottom: 15,
            color: Rgba([255, 255, 255, 255]),
        }
    }
}

impl WatermarkStyle {
    /// CSS font shorthand equivalent to this style.
    pub fn css_font(&self) -> String {
        let families = WATERMARK_FONT_STACK
            .iter()
            .map(|family| {
                if family.contains(' ') {
                    format!("'{family}'")
                } else {
                    (*family).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("normal {}px {families}", self.size_px)
    }

    fn scale(&self) -> u32 {
        (self.size_px / GLYPH_CELL).max(1)
    }

    /// Pixel width of `text` at this size.
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * GLYPH_CELL * self.scale()
    }

    /// Pixel height of one line at this size.
    pub fn text_height(&self) -> u32 {
        GLYPH_CELL * self.scale()
    }
}

/// Bounding box of drawn text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Draw `text` right-aligned in the bottom-right corner.
pub fn draw_watermark(canvas: &mut RgbaImage, text: &str, style: &WatermarkStyle) -> TextBounds {
    let width = style.text_width(text);
    let height = style.text_height();
    let right = canvas.width() as i64 - style.margin_right as i64;
    let baseline = canvas.height() as i64 - style.margin_bottom as i64;
    let bounds = TextBounds {
        x: right - width as i64,
        y: baseline - height as i64,
        width,
        height,
    };
    draw_bitmap_text(canvas, bounds.x, bounds.y, text, style.color, style.scale());
    bounds
}

fn draw_bitmap_text(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    text: &str,
    color: Rgba<u8>,
    scale: u32,
) {
    let scale = scale.max(1) as i64;
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    let mut cursor_x = x;

    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += GLYPH_CELL as i64 * scale;
            continue;
        };
        for (row_idx, row_bits) in glyph.iter().enumerate() {
            for col_idx in 0..GLYPH_CELL as i64 {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale;
                let py = y + row_idx as i64 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        let (tx, ty) = (px + sx, py + sy);
                        if tx >= 0 && ty >= 0 && tx < canvas_w && ty < canvas_h {
                            canvas.put_pixel(tx as u32, ty as u32, color);
                        }
                    }
                }
            }
        }
        cursor_x += GLYPH_CELL as i64 * scale;
    }
}
