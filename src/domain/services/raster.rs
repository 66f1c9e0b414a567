//! Raster helpers
//!
//! Dimension clamping and byte-to-pixel decoding shared by the in-page and
//! uploaded-file extraction paths.

use super::data_url;
use crate::domain::entities::PixelBuffer;
use image::DynamicImage;
use image::imageops::{self, FilterType};

/// Longest side of any raster handed to the decoder
pub const MAX_DIMENSION: u32 = 2048;

/// Scales `(width, height)` down so neither side exceeds `max`, keeping the
/// aspect ratio. Sizes already within bounds are returned unchanged.
pub fn clamp_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = f64::from(max) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Converts a decoded image to RGBA, downscaling oversized input
pub fn rasterize(image: &DynamicImage, max: u32) -> Option<PixelBuffer> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return None;
    }

    let (target_w, target_h) = clamp_dimensions(width, height, max);
    let rgba = image.to_rgba8();

    if (target_w, target_h) == (width, height) {
        Some(PixelBuffer::new(rgba))
    } else {
        Some(PixelBuffer::new(imageops::resize(
            &rgba,
            target_w,
            target_h,
            FilterType::Triangle,
        )))
    }
}

/// Decodes encoded image bytes (PNG, JPEG) into pixels
///
/// Used for uploaded files, where the bytes are already local.
pub fn extract_from_bytes(bytes: &[u8], max: u32) -> Option<PixelBuffer> {
    match image::load_from_memory(bytes) {
        Ok(image) => rasterize(&image, max),
        Err(e) => {
            tracing::debug!("image decode failed: {}", e);
            None
        }
    }
}

/// Decodes a base64 `data:` URL into pixels
pub fn extract_from_data_url(url: &str, max: u32) -> Option<PixelBuffer> {
    let parsed = data_url::decode(url)?;
    extract_from_bytes(&parsed.bytes, max)
}
