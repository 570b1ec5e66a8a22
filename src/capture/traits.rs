//! Composable capability traits for desktop capture backends
//!
//! Each trait covers one OS surface the capture logic needs. The logic
//! itself (enumeration walk, real-bounds fallback, the GDI pipeline with its
//! cleanup discipline, DPI-aware window lookup) lives in generic code over
//! these traits, so the same code runs against the Win32 backend and the
//! mock.
//!
//! # Trait Hierarchy
//!
//! - [`DisplayEnumerator`]: walk active monitors in OS order
//! - [`MonitorQuery`]: monitor info and current display mode lookups
//! - [`WindowLocator`]: title lookup, extended frame bounds, DPI awareness
//! - [`ScreenMetrics`]: primary screen size
//! - [`GraphicsDevice`]: raw GDI primitives used by the capture engine
//! - [`DesktopBackend`]: everything above, blanket-implemented

use std::{ops::ControlFlow, ptr::NonNull};

use crate::{
    error::CaptureResult,
    model::{DisplayMode, MonitorHandle, MonitorInfo, Rect, WindowHandle},
};

// ============================================================================
// Geometry Capabilities
// ============================================================================

/// Capability: walk the monitors attached to the virtual desktop.
///
/// The visitor runs synchronously on the calling thread, once per monitor,
/// in OS enumeration order. Returning `ControlFlow::Break` stops the walk.
pub trait DisplayEnumerator: Send + Sync {
    /// Visits each active monitor with its enumeration-reported rectangle.
    fn enumerate_displays(&self, visit: &mut dyn FnMut(MonitorHandle, Rect) -> ControlFlow<()>);
}

/// Capability: per-monitor queries used to recover unscaled bounds.
pub trait MonitorQuery: Send + Sync {
    /// Extended monitor info (device name, reported rect), `None` on failure.
    fn monitor_info(&self, monitor: MonitorHandle) -> Option<MonitorInfo>;

    /// Current display mode of the named device, `None` on failure.
    fn current_display_mode(&self, device_name: &str) -> Option<DisplayMode>;
}

/// Capability: find top-level windows and read their visible frame.
pub trait WindowLocator: Send + Sync {
    /// First top-level window whose title equals `title` exactly.
    ///
    /// A title containing `'\0'` matches nothing.
    fn find_window(&self, title: &str) -> Option<WindowHandle>;

    /// Extended frame bounds of `window` in desktop coordinates.
    fn extended_frame_bounds(&self, window: WindowHandle) -> CaptureResult<Rect>;

    /// Declares the process DPI aware.
    ///
    /// Process-wide and idempotent: the first call performs the single
    /// unaware to aware transition, later calls return the cached outcome.
    /// Returns whether the process is DPI aware.
    fn declare_dpi_aware(&self) -> bool;
}

/// Capability: primary display metrics.
pub trait ScreenMetrics: Send + Sync {
    /// Primary screen width and height in pixels.
    fn primary_screen_size(&self) -> (i32, i32);
}

// ============================================================================
// GDI Primitives
// ============================================================================

/// Opaque OS object handle (device context, bitmap, GDI object, memory block)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub isize);

/// Device-independent bitmap request passed to [`GraphicsDevice::get_dib_bits`]
///
/// Mirrors the `BITMAPINFOHEADER` fields the capture engine sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DibHeader {
    /// Width in pixels
    pub width:        i32,
    /// Height in pixels, negative for top-down row order
    pub height:       i32,
    /// Colour planes, always 1
    pub planes:       u16,
    /// Bits per pixel
    pub bit_count:    u16,
    /// `true` for uncompressed `BI_RGB`
    pub uncompressed: bool,
}

impl DibHeader {
    /// Top-down, uncompressed, single-plane header for a capture
    pub fn top_down(width: i32, height: i32, bit_count: u16) -> Self {
        Self {
            width,
            height: -height,
            planes: 1,
            bit_count,
            uncompressed: true,
        }
    }

    /// Number of scan lines described by the header
    pub fn scan_lines(&self) -> u32 {
        self.height.unsigned_abs()
    }
}

/// Capability: the GDI calls behind one bitmap capture.
///
/// Every acquiring call has a matching release call; the capture engine
/// pairs them with scope guards so each acquired object is released exactly
/// once on every exit path. Failing calls return `None`/`false` and leave
/// the reason in [`last_error`](GraphicsDevice::last_error).
pub trait GraphicsDevice: Send + Sync {
    /// `GetDC` on the desktop window.
    fn acquire_screen_dc(&self) -> Option<RawHandle>;
    /// `ReleaseDC` on the desktop window.
    fn release_screen_dc(&self, dc: RawHandle);

    /// `CreateCompatibleDC`.
    fn create_memory_dc(&self, screen_dc: RawHandle) -> Option<RawHandle>;
    /// `DeleteDC`.
    fn delete_memory_dc(&self, dc: RawHandle);

    /// `CreateCompatibleBitmap`.
    fn create_bitmap(&self, screen_dc: RawHandle, width: i32, height: i32) -> Option<RawHandle>;
    /// `DeleteObject` on a bitmap.
    fn delete_bitmap(&self, bitmap: RawHandle);

    /// `SelectObject`, returning the previously selected object.
    fn select_object(&self, dc: RawHandle, object: RawHandle) -> Option<RawHandle>;

    /// `GlobalAlloc(GMEM_MOVEABLE | GMEM_ZEROINIT, size)`. The block must
    /// start zeroed.
    fn alloc_block(&self, size: usize) -> Option<RawHandle>;
    /// `GlobalFree`.
    fn free_block(&self, block: RawHandle);
    /// `GlobalLock`, returning the start of the block.
    ///
    /// The pointer covers the block's full size, every byte initialized, and
    /// stays valid until
    /// [`unlock_block`](GraphicsDevice::unlock_block).
    fn lock_block(&self, block: RawHandle) -> Option<NonNull<u8>>;
    /// `GlobalUnlock`.
    fn unlock_block(&self, block: RawHandle);

    /// `BitBlt(SRCCOPY)` of `width` x `height` from `(x, y)` on `src` to the
    /// origin of `dst`.
    fn bit_blt(
        &self,
        dst: RawHandle,
        width: i32,
        height: i32,
        src: RawHandle,
        x: i32,
        y: i32,
    ) -> bool;

    /// `GetDIBits` into `bits`, returning the number of scan lines copied.
    fn get_dib_bits(
        &self,
        dc: RawHandle,
        bitmap: RawHandle,
        header: &DibHeader,
        bits: &mut [u8],
    ) -> u32;

    /// `GetLastError` for the calling thread.
    fn last_error(&self) -> u32;
}

/// Everything [`DesktopCapture`](super::DesktopCapture) needs from a backend.
pub trait DesktopBackend:
    DisplayEnumerator + MonitorQuery + WindowLocator + ScreenMetrics + GraphicsDevice
{
}

impl<T> DesktopBackend for T where
    T: DisplayEnumerator + MonitorQuery + WindowLocator + ScreenMetrics + GraphicsDevice
{
}
