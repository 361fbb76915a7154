//! Borrowed RGBA pixel buffers

use crate::error::{Result, TopoError};

/// Bytes per RGBA pixel
pub const CHANNELS: usize = 4;

/// A row-major RGBA image supplied by an external decoder
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap a flat RGBA byte buffer.
    ///
    /// Fails with `MalformedAnalysisInput` when the buffer holds fewer than
    /// `width * height * 4` bytes. Trailing bytes are ignored.
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        let needed = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| {
                TopoError::MalformedAnalysisInput(format!("{}x{} image is too large", width, height))
            })?;

        if data.len() < needed {
            return Err(TopoError::MalformedAnalysisInput(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                needed,
                data.len()
            )));
        }

        Ok(Self { data, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGB of the pixel at (x, y); alpha is dropped
    pub fn rgb(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let offset = (y * self.width + x) * CHANNELS;
        (self.data[offset], self.data[offset + 1], self.data[offset + 2])
    }
}

/// Perceived brightness (Rec. 709 luma), 0-255
pub fn pixel_brightness(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64
}

/// Rec. 601 luma, 0-255
pub fn pixel_luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Build an RGBA buffer from per-pixel gray levels, row-major
    pub fn gray_image(rows: &[&[u8]]) -> (Vec<u8>, usize, usize) {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(width * height * 4);
        for row in rows {
            for &v in row.iter() {
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        (data, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_too_short() {
        let data = vec![0u8; 4 * 3];
        assert!(PixelBuffer::new(&data, 2, 2).is_err());
        assert!(PixelBuffer::new(&data, 3, 1).is_ok());
    }

    #[test]
    fn test_zero_dimensions_are_valid() {
        let pixels = PixelBuffer::new(&[], 0, 10).unwrap();
        assert!(pixels.is_empty());
        let pixels = PixelBuffer::new(&[], 10, 0).unwrap();
        assert!(pixels.is_empty());
    }

    #[test]
    fn test_rgb_lookup() {
        let data = [1, 2, 3, 255, 4, 5, 6, 255];
        let pixels = PixelBuffer::new(&data, 2, 1).unwrap();
        assert_eq!(pixels.rgb(1, 0), (4, 5, 6));
    }

    #[test]
    fn test_luma_weights() {
        assert!((pixel_brightness(255, 255, 255) - 255.0).abs() < 1e-9);
        assert!((pixel_luma(255, 255, 255) - 255.0).abs() < 1e-9);
        assert_eq!(pixel_brightness(0, 0, 0), 0.0);
        assert!(pixel_brightness(0, 255, 0) > pixel_brightness(255, 0, 0));
    }
}
