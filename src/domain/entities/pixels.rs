//! Pixel buffer entity
//!
//! RGBA raster read back from an image, ready for symbol detection.

use image::RgbaImage;

/// RGBA pixel data with known dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Wraps an RGBA image
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Builds a buffer from raw RGBA bytes, `None` if the length is wrong
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(Self::new)
    }

    /// Solid-colour buffer, mostly useful for fixtures
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns whether either side is zero
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Greyscale value of a pixel (Rec. 709 weights, alpha ignored)
    #[inline]
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        let [r, g, b, _] = self.image.get_pixel(x, y).0;
        let value = 0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b);
        value.round().clamp(0.0, 255.0) as u8
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}
