//! Captured frames as self-describing PNG data URLs.
//!
//! A capture is kept as `data:image/png;base64,...` text so it can be held in
//! memory, handed to a display surface verbatim, and redrawn later without
//! touching the camera stream again.

use std::io::Cursor;

use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

/// MIME type of every encoded capture and composite.
pub const PNG_MIME: &str = "image/png";

/// Errors from encoding or decoding image payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot encode a {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    #[error("not a base64 data URL")]
    NotADataUrl,

    #[error("unsupported payload type: {0}")]
    UnsupportedMime(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// One captured frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// Pixel width of the encoded frame.
    pub width: u32,
    /// Pixel height of the encoded frame.
    pub height: u32,
    /// `data:image/png;base64,...` payload.
    pub data_url: String,
}

impl CapturedImage {
    /// Encode an RGBA buffer losslessly.
    pub fn from_rgba(pixels: &RgbaImage) -> Result<Self, CodecError> {
        let png = encode_png(pixels)?;
        Ok(Self {
            width: pixels.width(),
            height: pixels.height(),
            data_url: to_data_url(PNG_MIME, &png),
        })
    }

    /// Parse a data URL produced elsewhere, reading dimensions from the payload.
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self, CodecError> {
        let data_url = data_url.into();
        let decoded = decode_data_url(&data_url)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            data_url,
        })
    }

    /// Decode back into pixels.
    pub fn decode(&self) -> Result<RgbaImage, CodecError> {
        decode_data_url(&self.data_url)
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// Encode pixels as PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, CodecError> {
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(CodecError::EmptyImage {
            width: pixels.width(),
            height: pixels.height(),
        });
    }
    let mut bytes = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Wrap a binary payload as a base64 data URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn parse_data_url(data_url: &str) -> Result<(String, Vec<u8>), CodecError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(CodecError::NotADataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(CodecError::NotADataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(CodecError::NotADataUrl)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
    Ok((mime.to_string(), bytes))
}

fn decode_data_url(data_url: &str) -> Result<RgbaImage, CodecError> {
    let (mime, bytes) = parse_data_url(data_url)?;
    if mime != PNG_MIME {
        return Err(CodecError::UnsupportedMime(mime));
    }
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;
    Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn capture_is_lossless() {
        let mut pixels = RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 255]));
        pixels.put_pixel(3, 2, Rgba([250, 1, 2, 255]));

        let captured = CapturedImage::from_rgba(&pixels).unwrap();
        assert!(captured.data_url.starts_with("data:image/png;base64,"));
        assert_eq!((captured.width, captured.height), (8, 6));
        assert_eq!(captured.decode().unwrap(), pixels);
    }

    #[test]
    fn zero_sized_buffers_are_rejected() {
        let empty = RgbaImage::new(0, 10);
        assert!(matches!(
            encode_png(&empty),
            Err(CodecError::EmptyImage { width: 0, height: 10 })
        ));
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(matches!(
            CapturedImage::from_data_url("/tmp/photo.png"),
            Err(CodecError::NotADataUrl)
        ));
    }

    #[test]
    fn rejects_foreign_mime_types() {
        let url = to_data_url("image/jpeg", &[1, 2, 3]);
        assert!(matches!(
            CapturedImage::from_data_url(url),
            Err(CodecError::UnsupportedMime(m)) if m == "image/jpeg"
        ));
    }

    #[test]
    fn from_data_url_reads_dimensions() {
        let pixels = RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255]));
        let url = CapturedImage::from_rgba(&pixels).unwrap().data_url;
        let parsed = CapturedImage::from_data_url(url).unwrap();
        assert_eq!((parsed.width, parsed.height), (4, 3));
        assert!((parsed.aspect_ratio() - 4.0 / 3.0).abs() < 1e-9);
    }
}
