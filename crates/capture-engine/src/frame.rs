//! Frame capture: one video frame, center-cropped to a fixed aspect ratio.

use image::RgbaImage;
use photobooth_common::error::{PhotoboothError, PhotoboothResult};
use photobooth_model::CapturedImage;

/// Anything that can hand over the current video frame.
pub trait VideoSource {
    /// Native pixel size, or `None` while the stream is still negotiating.
    fn intrinsic_size(&self) -> Option<(u32, u32)>;

    /// Current frame.
    fn read_frame(&mut self) -> Option<RgbaImage>;
}

/// Integer aspect ratio `num:den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub num: u32,
    pub den: u32,
}

impl AspectRatio {
    pub const FOUR_THREE: AspectRatio = AspectRatio { num: 4, den: 3 };

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/// Source rectangle copied into the capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered rectangle of `aspect` that fits in the source.
///
/// Only the dominant axis is cropped: sources wider than the target keep
/// every row and lose columns on both sides, taller sources keep every
/// column and lose rows top and bottom. Pixels are whole, so the cropped
/// side is rounded down; the ratio then holds to within one pixel, and an
/// odd margin puts the extra pixel on the right or bottom. Returns `None`
/// when the source rounds down to an empty rectangle.
pub fn crop_region(
    source_width: u32,
    source_height: u32,
    aspect: AspectRatio,
) -> Option<CropRegion> {
    let (w, h) = (u64::from(source_width), u64::from(source_height));
    let (num, den) = (u64::from(aspect.num), u64::from(aspect.den));

    let (width, height) = if w * den >= h * num {
        ((h * num / den) as u32, source_height)
    } else {
        (source_width, (w * den / num) as u32)
    };
    if width == 0 || height == 0 {
        return None;
    }
    Some(CropRegion {
        x: (source_width - width) / 2,
        y: (source_height - height) / 2,
        width,
        height,
    })
}

/// Copies frames out of a [`VideoSource`] into encoded captures.
#[derive(Debug, Clone, Copy)]
pub struct FrameCapturer {
    aspect: AspectRatio,
    fallback_size: (u32, u32),
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::FOUR_THREE,
            fallback_size: (640, 480),
        }
    }
}

impl FrameCapturer {
    pub fn new(aspect: AspectRatio, fallback_size: (u32, u32)) -> Self {
        Self {
            aspect,
            fallback_size,
        }
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    /// Capture the source's current frame.
    ///
    /// While the source has no known size yet, a blank buffer of the fallback
    /// size is produced instead, so a capture always yields an image.
    pub fn capture(&self, source: &mut dyn VideoSource) -> PhotoboothResult<CapturedImage> {
        let pixels = match source.intrinsic_size() {
            Some((w, h)) if w > 0 && h > 0 => self.crop_current_frame(source)?,
            _ => {
                let (w, h) = self.fallback_size;
                tracing::warn!(width = w, height = h, "Video dimensions not available yet");
                RgbaImage::new(w, h)
            }
        };

        let captured = CapturedImage::from_rgba(&pixels).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode capture");
            PhotoboothError::capture(format!("encoding failed: {e}"))
        })?;
        tracing::debug!(
            width = captured.width,
            height = captured.height,
            "Frame captured"
        );
        Ok(captured)
    }

    fn crop_current_frame(&self, source: &mut dyn VideoSource) -> PhotoboothResult<RgbaImage> {
        let frame = source.read_frame().ok_or_else(|| {
            tracing::error!("Video source returned no frame");
            PhotoboothError::capture("no frame available from the camera")
        })?;

        let region = crop_region(frame.width(), frame.height(), self.aspect).ok_or_else(|| {
            PhotoboothError::capture(format!(
                "frame {}x{} is too small to crop",
                frame.width(),
                frame.height()
            ))
        })?;

        Ok(image::imageops::crop_imm(&frame, region.x, region.y, region.width, region.height)
            .to_image())
    }
}
