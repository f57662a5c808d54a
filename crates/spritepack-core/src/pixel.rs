use crate::error::{AtlasError, Result};
use image::{Rgba, RgbaImage};

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Rectangular grid of RGBA8 pixels.
///
/// Rows are stored bottom-up: row 0 is the bottom row of the picture, which
/// matches the coordinate system of sprite rectangles. Conversions from and
/// to [`RgbaImage`] (top-down) flip the rows.
///
/// A `0x0` buffer is a valid empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; byte_len(width, height)],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps raw bottom-up RGBA8 bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(AtlasError::InvalidBuffer {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a buffer by evaluating `f(x, y)` for every pixel (bottom-left origin).
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Converts a decoded image; its top row becomes the last stored row.
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        Self::from_fn(w, h, |x, y| img.get_pixel(x, h - 1 - y).0)
    }

    /// Converts back to a top-down image for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let h = self.height;
        RgbaImage::from_fn(self.width, h, |x, y| {
            Rgba(self.pixel(x, h - 1 - y).unwrap_or([0, 0, 0, 0]))
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel count (`width * height`).
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel at `(x, y)`, `y` counted from the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let p = &self.pixels[i..i + CHANNELS];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// One stored row as raw bytes.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.pixels[start..start + self.width as usize * CHANNELS]
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = self.offset(0, y);
        let end = start + self.width as usize * CHANNELS;
        &mut self.pixels[start..end]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}
