//! DIB layout and BGRA to RGBA conversion
//!
//! `GetDIBits` hands back 32bpp pixels in B, G, R, X order where the fourth
//! byte is undefined (GDI surfaces have no alpha). Rows are padded to a
//! 4-byte boundary, which for 32bpp is always exactly `width * 4`, but the
//! stride is still computed with the general DIB formula so the conversion
//! never assumes it.

use super::constants::{DIB_BITS_PER_PIXEL, RGBA_BYTES_PER_PIXEL};
use crate::error::{CaptureError, CaptureResult};

/// Byte stride of one DIB row: `((width * bpp + 31) / 32) * 4`
pub fn dib_stride(width: u32, bits_per_pixel: u16) -> usize {
    ((width as usize * bits_per_pixel as usize + 31) / 32) * 4
}

/// Geometry of the transfer block used for one capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DibLayout {
    /// Width in pixels
    pub width:  u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row including padding
    pub stride: usize,
    /// Total bytes (`stride * height`)
    pub size:   usize,
}

impl DibLayout {
    /// Computes the 32bpp layout for a `width` x `height` capture
    ///
    /// Fails with `Allocation` if the block size overflows `usize`.
    pub fn new(width: u32, height: u32) -> CaptureResult<Self> {
        let stride = dib_stride(width, DIB_BITS_PER_PIXEL);
        let size = stride
            .checked_mul(height as usize)
            .ok_or_else(|| CaptureError::Allocation {
                width:  width as i32,
                height: height as i32,
                reason: "transfer block size overflows usize".to_string(),
            })?;

        Ok(Self {
            width,
            height,
            stride,
            size,
        })
    }
}

/// Converts strided BGRA/BGRX rows into packed RGBA with opaque alpha
///
/// `src` holds `height` rows of `stride` bytes each, top-down; `dst` must
/// hold exactly `width * height * 4` bytes. The source's fourth byte is
/// ignored and every output alpha is 255.
///
/// # Examples
///
/// ```
/// use win_screenshot::capture::convert::bgra_to_rgba;
///
/// let bgrx = [0x10, 0x20, 0x30, 0x00];
/// let mut rgba = [0u8; 4];
/// bgra_to_rgba(&bgrx, 4, 1, 1, &mut rgba).unwrap();
/// assert_eq!(rgba, [0x30, 0x20, 0x10, 0xFF]);
/// ```
pub fn bgra_to_rgba(
    src: &[u8],
    stride: usize,
    width: usize,
    height: usize,
    dst: &mut [u8],
) -> CaptureResult<()> {
    let row_bytes = width * RGBA_BYTES_PER_PIXEL;

    if stride < row_bytes {
        return Err(CaptureError::InvalidParameter {
            parameter: "stride".to_string(),
            reason:    format!("stride {} is shorter than a {}-pixel row", stride, width),
        });
    }
    if src.len() < stride * height {
        return Err(CaptureError::InvalidParameter {
            parameter: "src".to_string(),
            reason:    format!("{} bytes cannot hold {} rows of {}", src.len(), height, stride),
        });
    }
    if dst.len() != row_bytes * height {
        return Err(CaptureError::InvalidParameter {
            parameter: "dst".to_string(),
            reason:    format!("expected {} bytes, got {}", row_bytes * height, dst.len()),
        });
    }
    if row_bytes == 0 {
        return Ok(());
    }

    for (src_row, dst_row) in src.chunks(stride).zip(dst.chunks_exact_mut(row_bytes)) {
        for (bgra, rgba) in src_row[..row_bytes]
            .chunks_exact(4)
            .zip(dst_row.chunks_exact_mut(4))
        {
            rgba[0] = bgra[2];
            rgba[1] = bgra[1];
            rgba[2] = bgra[0];
            rgba[3] = 0xFF;
        }
    }

    Ok(())
}
