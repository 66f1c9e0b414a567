//! QR decode pipeline
//!
//! Pure function of pixel data: one plain attempt, then one attempt with
//! the greyscale inverted (light-on-dark symbols).

use crate::domain::entities::PixelBuffer;

/// Colour treatment applied before symbol detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inversion {
    None,
    Inverted,
}

const ATTEMPTS: [Inversion; 2] = [Inversion::None, Inversion::Inverted];

/// Decodes the first QR symbol found, `None` when both attempts miss
pub fn decode(pixels: &PixelBuffer) -> Option<String> {
    ATTEMPTS
        .into_iter()
        .find_map(|inversion| decode_with(pixels, inversion))
}

/// Single detection attempt with the given inversion
pub fn decode_with(pixels: &PixelBuffer, inversion: Inversion) -> Option<String> {
    if pixels.is_empty() {
        return None;
    }

    let width = pixels.width() as usize;
    let height = pixels.height() as usize;

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        let value = pixels.luma(x as u32, y as u32);
        match inversion {
            Inversion::None => value,
            Inversion::Inverted => 255 - value,
        }
    });

    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok().map(|(_meta, content)| content))
}
