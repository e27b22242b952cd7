use crate::error::{CoreError, Result};

/// An owned RGBA pixel buffer. 4 bytes per pixel, row-major, top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// Create a buffer where every pixel has the given RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.fill(rgba);
        buffer
    }

    /// Create from existing RGBA data, rejecting data whose length doesn't
    /// match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CoreError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Get pixel RGBA at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let idx = self.index(x, y);
        &self.data[idx..idx + 4]
    }

    /// Get mutable pixel RGBA at (x, y). Panics if out of bounds.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let idx = self.index(x, y);
        &mut self.data[idx..idx + 4]
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_buffer_new() {
        let buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.width, 4);
        assert_eq!(buf.height, 3);
        assert_eq!(buf.data.len(), 4 * 3 * 4);
        assert!(buf.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pixel_buffer_pixel_access() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.pixel_mut(2, 1).copy_from_slice(&[255, 128, 64, 255]);
        assert_eq!(buf.pixel(2, 1), &[255, 128, 64, 255]);
        assert_eq!(buf.index(2, 1), (4 + 2) * 4);
    }

    #[test]
    fn test_pixel_buffer_from_rgba() {
        let data = vec![255, 0, 0, 255, 0, 255, 0, 255];
        let buf = PixelBuffer::from_rgba(2, 1, data).unwrap();
        assert_eq!(buf.pixel(0, 0), &[255, 0, 0, 255]);
        assert_eq!(buf.pixel(1, 0), &[0, 255, 0, 255]);
    }

    #[test]
    fn test_pixel_buffer_from_rgba_wrong_size() {
        let err = PixelBuffer::from_rgba(2, 2, vec![0; 10]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::BufferSizeMismatch {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_pixel_buffer_filled() {
        let buf = PixelBuffer::filled(3, 2, [10, 20, 30, 255]);
        assert_eq!(buf.pixel_count(), 6);
        assert!(buf.data.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn test_pixel_buffer_zero_area_is_empty() {
        assert!(PixelBuffer::new(0, 5).is_empty());
        assert!(!PixelBuffer::new(1, 1).is_empty());
    }
}
