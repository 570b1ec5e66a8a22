//! Packed RGBA pixel buffer returned by every capture
//!
//! A [`PixelBuffer`] is `width * height * 4` bytes of R, G, B, A with alpha
//! always 255, row-major and top-down. Ownership passes to the caller once a
//! capture returns; the engine keeps no reference to it.
//!
//! With the `image-processing` feature the buffer converts into an
//! `image::RgbaImage` without copying, which is the hand-off point to PNG or
//! other encoders.
//!
//! # Examples
//!
//! ```
//! use win_screenshot::capture::PixelBuffer;
//!
//! let buffer = PixelBuffer::filled(4, 2, [10, 20, 30]);
//! assert_eq!(buffer.dimensions(), (4, 2));
//! assert_eq!(buffer.pixel(3, 1), Some([10, 20, 30, 255]));
//! assert_eq!(buffer.as_bytes().len(), 4 * 2 * 4);
//! ```

use super::constants::RGBA_BYTES_PER_PIXEL;
use crate::error::{CaptureError, CaptureResult};

/// Owned RGBA capture result
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width:  u32,
    height: u32,
    data:   Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Allocates a zeroed destination buffer for a capture
    ///
    /// Fails with `Allocation` when either dimension is not positive, when
    /// `width * height` exceeds `max_pixels`, or when the allocator refuses
    /// the request.
    pub fn allocate(width: i32, height: i32, max_pixels: u64) -> CaptureResult<Self> {
        let allocation_error = |reason: String| CaptureError::Allocation {
            width,
            height,
            reason,
        };

        if width <= 0 || height <= 0 {
            return Err(allocation_error("dimensions must be positive".to_string()));
        }

        let pixels = width as u64 * height as u64;
        if pixels > max_pixels {
            return Err(allocation_error(format!(
                "{} pixels exceeds the limit of {}",
                pixels, max_pixels
            )));
        }

        let len = usize::try_from(pixels)
            .ok()
            .and_then(|p| p.checked_mul(RGBA_BYTES_PER_PIXEL))
            .ok_or_else(|| allocation_error("buffer size overflows usize".to_string()))?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| allocation_error(e.to_string()))?;
        data.resize(len, 0);

        Ok(Self {
            width: width as u32,
            height: height as u32,
            data,
        })
    }

    /// Wraps existing RGBA bytes
    ///
    /// Returns `InvalidParameter` if `data` is not exactly
    /// `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> CaptureResult<Self> {
        let expected = width as usize * height as usize * RGBA_BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(CaptureError::InvalidParameter {
                parameter: "data".to_string(),
                reason:    format!(
                    "{}x{} RGBA needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    data.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates an opaque buffer of a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = [rgb[0], rgb[1], rgb[2], 0xFF]
            .repeat(width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Returns the dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row (`width * 4`, no padding)
    pub fn row_bytes(&self) -> usize {
        self.width as usize * RGBA_BYTES_PER_PIXEL
    }

    /// RGBA value at `(x, y)`, `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.row_bytes() + x as usize * RGBA_BYTES_PER_PIXEL;
        let px = &self.data[offset..offset + RGBA_BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Iterates over rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on 0, and a zero-width buffer has no bytes anyway
        self.data.chunks_exact(self.row_bytes().max(1))
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA bytes, used by the engine to fill the buffer in place
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer and returns the raw RGBA bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Converts into an `image::RgbaImage` without copying
    ///
    /// # Examples
    ///
    /// ```
    /// use win_screenshot::capture::PixelBuffer;
    ///
    /// let image = PixelBuffer::filled(8, 8, [255, 0, 0]).into_rgba_image();
    /// assert_eq!(image.dimensions(), (8, 8));
    /// assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
    /// ```
    #[cfg(feature = "image-processing")]
    pub fn into_rgba_image(self) -> image::RgbaImage {
        let (width, height) = (self.width, self.height);
        // Length is checked at construction, from_raw only fails on a short buffer
        image::RgbaImage::from_raw(width, height, self.data)
            .unwrap_or_else(|| image::RgbaImage::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_exact_length() {
        let buffer = PixelBuffer::allocate(729, 1200, u64::MAX).unwrap();
        assert_eq!(buffer.dimensions(), (729, 1200));
        assert_eq!(buffer.as_bytes().len(), 729 * 1200 * 4);
    }

    #[test]
    fn test_allocate_rejects_non_positive() {
        for (w, h) in [(0, 10), (10, 0), (-1, 10), (10, -5), (0, 0)] {
            let result = PixelBuffer::allocate(w, h, u64::MAX);
            assert!(
                matches!(result, Err(CaptureError::Allocation { .. })),
                "{}x{} should fail",
                w,
                h
            );
        }
    }

    #[test]
    fn test_allocate_respects_limit() {
        let result = PixelBuffer::allocate(100, 100, 9_999);
        assert!(matches!(result, Err(CaptureError::Allocation { .. })));
        assert!(PixelBuffer::allocate(100, 100, 10_000).is_ok());
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
        let result = PixelBuffer::from_raw(2, 2, vec![0; 15]);
        assert!(matches!(result, Err(CaptureError::InvalidParameter { .. })));
    }

    #[test]
    fn test_filled_is_opaque() {
        let buffer = PixelBuffer::filled(3, 3, [1, 2, 3]);
        assert!(buffer.as_bytes().chunks_exact(4).all(|px| px == [1, 2, 3, 255]));
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let buffer = PixelBuffer::filled(2, 2, [0, 0, 0]);
        assert!(buffer.pixel(2, 0).is_none());
        assert!(buffer.pixel(0, 2).is_none());
        assert!(buffer.pixel(1, 1).is_some());
    }

    #[test]
    fn test_rows() {
        let buffer = PixelBuffer::filled(5, 3, [9, 9, 9]);
        let rows: Vec<&[u8]> = buffer.rows().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == 20));
    }

    #[test]
    fn test_into_raw() {
        let buffer = PixelBuffer::filled(1, 1, [4, 5, 6]);
        assert_eq!(buffer.into_raw(), vec![4, 5, 6, 255]);
    }

    #[test]
    fn test_debug_omits_pixel_data() {
        let buffer = PixelBuffer::filled(2, 2, [0, 0, 0]);
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("bytes: 16"));
    }

    #[cfg(feature = "image-processing")]
    #[test]
    fn test_into_rgba_image_keeps_pixels() {
        let mut buffer = PixelBuffer::filled(2, 1, [0, 0, 0]);
        buffer.as_bytes_mut()[4..8].copy_from_slice(&[10, 20, 30, 255]);
        let image = buffer.into_rgba_image();
        assert_eq!(image.get_pixel(1, 0).0, [10, 20, 30, 255]);
    }
}
