//! GDI bitmap capture pipeline
//!
//! [`capture_region`] copies a rectangle of the desktop into a fresh
//! [`PixelBuffer`]:
//!
//! ```text
//! allocate RGBA buffer
//!   -> GetDC(desktop)                          released by ScreenDc
//!   -> CreateCompatibleDC / CreateCompatibleBitmap   deleted by Owned
//!   -> SelectObject(memory dc, bitmap)         restored by Selection
//!   -> GlobalAlloc(GMEM_MOVEABLE | GMEM_ZEROINIT) + GlobalLock
//!                                              freed by Owned, unlocked by LockedBlock
//!   -> BitBlt(SRCCOPY) from (x, y)
//!   -> GetDIBits (top-down, 32bpp, BI_RGB) into the locked block,
//!      every scan line or Retrieval
//!   -> BGRX -> RGBA, alpha forced to 255
//! ```
//!
//! Every OS object is owned by a guard as soon as it exists, and guards are
//! declared in acquisition order so they drop in reverse: the block is
//! unlocked before it is freed, the previous selection is restored before
//! the bitmap and memory DC are deleted, and the desktop DC is released
//! last. An early `?` return at any step therefore releases exactly what was
//! acquired so far. Nothing is cached between calls, so concurrent captures
//! on different threads never share GDI objects.

use std::ptr::NonNull;

use tracing::{debug, warn};

use super::{
    PixelBuffer,
    constants::{CaptureConfig, DIB_BITS_PER_PIXEL},
    convert::{DibLayout, bgra_to_rgba},
    traits::{DibHeader, GraphicsDevice, RawHandle},
};
use crate::error::{CaptureError, CaptureResult, Surface};

/// Owned GDI object released through a device method on drop
struct Owned<'a, D: GraphicsDevice> {
    device:  &'a D,
    handle:  RawHandle,
    release: fn(&D, RawHandle),
}

impl<'a, D: GraphicsDevice> Owned<'a, D> {
    fn new(device: &'a D, handle: RawHandle, release: fn(&D, RawHandle)) -> Self {
        Self {
            device,
            handle,
            release,
        }
    }

    fn handle(&self) -> RawHandle {
        self.handle
    }
}

impl<D: GraphicsDevice> Drop for Owned<'_, D> {
    fn drop(&mut self) {
        (self.release)(self.device, self.handle);
    }
}

/// Restores a device context's previous selection on drop
struct Selection<'a, D: GraphicsDevice> {
    device:   &'a D,
    dc:       RawHandle,
    previous: RawHandle,
}

impl<D: GraphicsDevice> Drop for Selection<'_, D> {
    fn drop(&mut self) {
        self.device.select_object(self.dc, self.previous);
    }
}

/// Locked view of a movable memory block, unlocked on drop
struct LockedBlock<'a, D: GraphicsDevice> {
    device: &'a D,
    block:  RawHandle,
    ptr:    NonNull<u8>,
    len:    usize,
}

impl<D: GraphicsDevice> LockedBlock<'_, D> {
    fn as_slice(&self) -> &[u8] {
        // SAFETY: lock_block guarantees `len` zero-initialized bytes at `ptr`
        // until unlock, which only happens when this guard drops.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above; &mut self makes this the only live view.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<D: GraphicsDevice> Drop for LockedBlock<'_, D> {
    fn drop(&mut self) {
        self.device.unlock_block(self.block);
    }
}

/// Captures `width` x `height` pixels of the desktop starting at `(x, y)`
///
/// Coordinates are absolute desktop pixels and may be negative for monitors
/// left of or above the primary display. Areas outside every monitor come
/// back black.
///
/// # Errors
///
/// - `Allocation`: non-positive size, over the configured limit, or out of
///   memory (destination buffer or transfer block)
/// - `DeviceContext`, `SurfaceCreation`, `Selection`, `TransferBufferLock`:
///   a GDI resource could not be acquired
/// - `Copy`, `Retrieval`: the pixel transfer failed
///
/// No partially filled buffer is ever returned, and every acquired OS
/// object is released before this function returns.
pub fn capture_region<D: GraphicsDevice>(
    device: &D,
    config: &CaptureConfig,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> CaptureResult<PixelBuffer> {
    debug!(x, y, width, height, "capture_region");

    let mut pixels = PixelBuffer::allocate(width, height, config.max_capture_pixels)?;
    let layout = DibLayout::new(width as u32, height as u32)?;

    let screen_dc = device
        .acquire_screen_dc()
        .map(|dc| Owned::new(device, dc, D::release_screen_dc))
        .ok_or_else(|| {
            let code = device.last_error();
            warn!(code, "GetDC on desktop window failed");
            CaptureError::DeviceContext { code }
        })?;

    let memory_dc = device
        .create_memory_dc(screen_dc.handle())
        .map(|dc| Owned::new(device, dc, D::delete_memory_dc))
        .ok_or_else(|| surface_error(device, Surface::MemoryDc))?;

    let bitmap = device
        .create_bitmap(screen_dc.handle(), width, height)
        .map(|bmp| Owned::new(device, bmp, D::delete_bitmap))
        .ok_or_else(|| surface_error(device, Surface::Bitmap))?;

    let _selection = device
        .select_object(memory_dc.handle(), bitmap.handle())
        .map(|previous| Selection {
            device,
            dc: memory_dc.handle(),
            previous,
        })
        .ok_or_else(|| {
            let code = device.last_error();
            warn!(code, "SelectObject failed");
            CaptureError::Selection { code }
        })?;

    let block = device
        .alloc_block(layout.size)
        .map(|block| Owned::new(device, block, D::free_block))
        .ok_or_else(|| {
            let code = device.last_error();
            warn!(code, bytes = layout.size, "GlobalAlloc failed");
            CaptureError::Allocation {
                width,
                height,
                reason: format!("GlobalAlloc of {} bytes failed (win32 error {})", layout.size, code),
            }
        })?;

    let mut locked = device
        .lock_block(block.handle())
        .map(|ptr| LockedBlock {
            device,
            block: block.handle(),
            ptr,
            len: layout.size,
        })
        .ok_or_else(|| {
            let code = device.last_error();
            warn!(code, "GlobalLock failed");
            CaptureError::TransferBufferLock { code }
        })?;

    if !device.bit_blt(memory_dc.handle(), width, height, screen_dc.handle(), x, y) {
        let code = device.last_error();
        warn!(code, x, y, width, height, "BitBlt failed");
        return Err(CaptureError::Copy { code });
    }

    let header = DibHeader::top_down(width, height, DIB_BITS_PER_PIXEL);
    let lines = device.get_dib_bits(
        screen_dc.handle(),
        bitmap.handle(),
        &header,
        locked.as_mut_slice(),
    );
    if lines != header.scan_lines() {
        let code = device.last_error();
        warn!(code, lines, expected = header.scan_lines(), "GetDIBits returned a short copy");
        return Err(CaptureError::Retrieval { code });
    }

    bgra_to_rgba(
        locked.as_slice(),
        layout.stride,
        layout.width as usize,
        layout.height as usize,
        pixels.as_bytes_mut(),
    )?;

    debug!(width, height, "capture_region complete");
    Ok(pixels)
}

fn surface_error<D: GraphicsDevice>(device: &D, surface: Surface) -> CaptureError {
    let code = device.last_error();
    warn!(code, %surface, "GDI surface creation failed");
    CaptureError::SurfaceCreation { surface, code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::{FailStage, MockBackend, MockSurface};

    fn config() -> CaptureConfig {
        CaptureConfig::default()
    }

    #[test]
    fn test_capture_region_solid_colour() {
        let backend = MockBackend::new().with_surface(MockSurface::Solid([12, 34, 56]));
        let buffer = capture_region(&backend, &config(), 10, 20, 64, 48).unwrap();

        assert_eq!(buffer.dimensions(), (64, 48));
        assert_eq!(buffer.as_bytes().len(), 64 * 48 * 4);
        assert!(buffer.as_bytes().chunks_exact(4).all(|px| px == [12, 34, 56, 255]));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn test_capture_region_reads_from_offset() {
        let backend = MockBackend::new().with_surface(MockSurface::Coordinates);
        let buffer = capture_region(&backend, &config(), 100, 50, 4, 3).unwrap();

        for y in 0..3u32 {
            for x in 0..4u32 {
                let expected = MockSurface::Coordinates.rgb_at(100 + x as i32, 50 + y as i32);
                let px = buffer.pixel(x, y).unwrap();
                assert_eq!(&px[..3], &expected[..], "pixel ({}, {})", x, y);
                assert_eq!(px[3], 255);
            }
        }
    }

    #[test]
    fn test_capture_region_rejects_empty_before_touching_gdi() {
        let backend = MockBackend::new();
        let result = capture_region(&backend, &config(), 0, 0, 0, 10);

        assert!(matches!(result, Err(CaptureError::Allocation { .. })));
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_capture_region_respects_pixel_limit() {
        let backend = MockBackend::new();
        let limited = CaptureConfig::default().with_max_capture_pixels(99);
        let result = capture_region(&backend, &limited, 0, 0, 10, 10);

        assert!(matches!(result, Err(CaptureError::Allocation { .. })));
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_every_failure_stage_releases_everything() {
        let stages = [
            FailStage::ScreenDc,
            FailStage::MemoryDc,
            FailStage::Bitmap,
            FailStage::Select,
            FailStage::AllocBlock,
            FailStage::LockBlock,
            FailStage::BitBlt,
            FailStage::GetDibBits,
        ];

        for stage in stages {
            let backend = MockBackend::new().failing_at(stage);
            let result = capture_region(&backend, &config(), 0, 0, 16, 16);

            assert!(result.is_err(), "{:?} should fail", stage);
            assert_eq!(backend.live_handles(), 0, "{:?} leaked handles", stage);
            assert!(!backend.has_locked_blocks(), "{:?} left a block locked", stage);
            assert!(backend.selection_restored(), "{:?} left bitmap selected", stage);
        }
    }

    #[test]
    fn test_failure_stage_maps_to_error() {
        let cases: [(FailStage, fn(&CaptureError) -> bool); 8] = [
            (FailStage::ScreenDc, |e| matches!(e, CaptureError::DeviceContext { .. })),
            (FailStage::MemoryDc, |e| {
                matches!(e, CaptureError::SurfaceCreation { surface: Surface::MemoryDc, .. })
            }),
            (FailStage::Bitmap, |e| {
                matches!(e, CaptureError::SurfaceCreation { surface: Surface::Bitmap, .. })
            }),
            (FailStage::Select, |e| matches!(e, CaptureError::Selection { .. })),
            (FailStage::AllocBlock, |e| matches!(e, CaptureError::Allocation { .. })),
            (FailStage::LockBlock, |e| matches!(e, CaptureError::TransferBufferLock { .. })),
            (FailStage::BitBlt, |e| matches!(e, CaptureError::Copy { .. })),
            (FailStage::GetDibBits, |e| matches!(e, CaptureError::Retrieval { .. })),
        ];

        for (stage, check) in cases {
            let backend = MockBackend::new().failing_at(stage);
            let err = capture_region(&backend, &config(), 0, 0, 8, 8).unwrap_err();
            assert!(check(&err), "{:?} produced {:?}", stage, err);
        }
    }

    #[test]
    fn test_short_scan_line_copy_is_retrieval_error() {
        let backend = MockBackend::new()
            .with_surface(MockSurface::Solid([200, 10, 10]))
            .with_scan_line_limit(2)
            .with_last_error(87);
        let err = capture_region(&backend, &config(), 0, 0, 4, 4).unwrap_err();

        assert!(matches!(err, CaptureError::Retrieval { code: 87 }));
        assert_eq!(backend.live_handles(), 0);
        assert!(!backend.has_locked_blocks());
        assert!(backend.selection_restored());
    }

    #[test]
    fn test_full_scan_line_copy_succeeds_at_limit() {
        let backend = MockBackend::new().with_scan_line_limit(4);
        let buffer = capture_region(&backend, &config(), 0, 0, 4, 4).unwrap();
        assert_eq!(buffer.dimensions(), (4, 4));
    }

    #[test]
    fn test_error_carries_last_error_code() {
        let backend = MockBackend::new()
            .failing_at(FailStage::BitBlt)
            .with_last_error(6);
        let err = capture_region(&backend, &config(), 0, 0, 8, 8).unwrap_err();
        assert!(matches!(err, CaptureError::Copy { code: 6 }));
    }

    #[test]
    fn test_release_order_is_reverse_of_acquisition() {
        let backend = MockBackend::new();
        capture_region(&backend, &config(), 0, 0, 2, 2).unwrap();

        let events = backend.events();
        let pos = |name: &str| {
            events
                .iter()
                .position(|e| e == name)
                .unwrap_or_else(|| panic!("missing event {}", name))
        };

        assert!(pos("unlock_block") < pos("free_block"));
        assert!(pos("free_block") < pos("restore_selection"));
        assert!(pos("restore_selection") < pos("delete_bitmap"));
        assert!(pos("delete_bitmap") < pos("delete_memory_dc"));
        assert!(pos("delete_memory_dc") < pos("release_screen_dc"));
    }

    #[test]
    fn test_transfer_block_uses_dib_stride() {
        let backend = MockBackend::new();
        capture_region(&backend, &config(), 0, 0, 33, 7).unwrap();
        assert_eq!(backend.last_block_size(), Some(33 * 4 * 7));
    }

    #[test]
    fn test_dib_request_is_top_down_32bpp() {
        let backend = MockBackend::new();
        capture_region(&backend, &config(), 0, 0, 5, 9).unwrap();

        let header = backend.last_dib_header().unwrap();
        assert_eq!(header, DibHeader::top_down(5, 9, 32));
    }
}
