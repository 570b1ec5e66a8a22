//! Mock desktop backend for testing
//!
//! This module provides a `MockBackend` implementing every capability trait
//! against a synthetic desktop, so the enumeration walk, the real-bounds
//! fallback, the window locator and the full GDI pipeline can be exercised
//! on any platform.
//!
//! # Features
//!
//! - **Synthetic Surface:** solid colour or a coordinate-derived pattern, so
//!   tests can check both colour fidelity and capture offsets
//! - **Scaled Monitors:** each monitor has a reported (logical) rectangle and
//!   an optional physical display mode
//! - **DPI Virtualization:** window frame bounds come back scaled until the
//!   process declares itself DPI aware
//! - **Failure Injection:** fail any single GDI or query step, or cut
//!   `get_dib_bits` short after a given number of scan lines
//! - **Handle Ledger:** tracks every live GDI object, locked block and
//!   selection so tests can assert nothing leaks on any exit path
//!
//! # Examples
//!
//! ```
//! use win_screenshot::capture::{DesktopCapture, MockBackend, MockSurface};
//!
//! let backend = MockBackend::new().with_surface(MockSurface::Solid([0, 128, 255]));
//! let capture = DesktopCapture::new(backend);
//!
//! let buffer = capture.capture_region(0, 0, 32, 32).unwrap();
//! assert_eq!(buffer.pixel(0, 0), Some([0, 128, 255, 255]));
//! assert_eq!(capture.backend().live_handles(), 0);
//! ```

use std::{
    collections::{HashMap, HashSet},
    ops::ControlFlow,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::{
    constants::DWMWA_EXTENDED_FRAME_BOUNDS,
    traits::{
        DibHeader, DisplayEnumerator, GraphicsDevice, MonitorQuery, RawHandle, ScreenMetrics,
        WindowLocator,
    },
};
use crate::{
    error::{CaptureError, CaptureResult},
    model::{DisplayMode, MonitorHandle, MonitorInfo, Rect, WindowHandle},
};

/// Handle value of the stock bitmap every new memory DC starts with
const STOCK_BITMAP: RawHandle = RawHandle(-1);

/// First monitor handle value handed out by enumeration
const MONITOR_HANDLE_BASE: isize = 0x1000;

/// `HRESULT_FROM_WIN32(ERROR_INVALID_WINDOW_HANDLE)`
const E_INVALID_WINDOW_HANDLE: i32 = 0x8007_0578_u32 as i32;

/// Step at which the mock fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStage {
    /// `GetDC` on the desktop
    ScreenDc,
    /// `CreateCompatibleDC`
    MemoryDc,
    /// `CreateCompatibleBitmap`
    Bitmap,
    /// `SelectObject` of the capture bitmap
    Select,
    /// `GlobalAlloc`
    AllocBlock,
    /// `GlobalLock`
    LockBlock,
    /// `BitBlt`
    BitBlt,
    /// `GetDIBits`
    GetDibBits,
    /// `GetMonitorInfoW`
    MonitorInfo,
    /// `EnumDisplaySettingsW`
    DisplayMode,
    /// `DwmGetWindowAttribute`
    FrameBounds,
}

/// Synthetic desktop content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSurface {
    /// Every pixel is this RGB colour
    Solid([u8; 3]),
    /// RGB derived from the desktop coordinate, see [`MockSurface::rgb_at`]
    Coordinates,
}

impl MockSurface {
    /// RGB colour of the desktop pixel at `(x, y)`
    pub fn rgb_at(&self, x: i32, y: i32) -> [u8; 3] {
        match self {
            MockSurface::Solid(rgb) => *rgb,
            MockSurface::Coordinates => [x as u8, y as u8, (x ^ y) as u8],
        }
    }
}

/// A synthetic monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockMonitor {
    /// Device name, e.g. `\\.\DISPLAY1`
    pub device_name:    String,
    /// Rectangle reported by enumeration
    pub reported:       Rect,
    /// Current physical display mode, `None` if the query fails
    pub mode:           Option<DisplayMode>,
    /// Whether the monitor-info query succeeds
    pub info_available: bool,
    /// Whether this is the primary monitor
    pub is_primary:     bool,
}

impl MockMonitor {
    /// Monitor whose physical mode matches the reported rectangle
    pub fn unscaled(device_name: &str, reported: Rect) -> Self {
        let mode = DisplayMode {
            position_x:    reported.left,
            position_y:    reported.top,
            pixels_width:  reported.width().max(0) as u32,
            pixels_height: reported.height().max(0) as u32,
        };
        Self {
            device_name: device_name.to_string(),
            reported,
            mode: Some(mode),
            info_available: true,
            is_primary: false,
        }
    }

    /// Replaces the physical display mode
    pub fn with_mode(mut self, mode: Option<DisplayMode>) -> Self {
        self.mode = mode;
        self
    }

    /// Makes the monitor-info query fail for this monitor
    pub fn without_info(mut self) -> Self {
        self.info_available = false;
        self
    }

    /// Marks this monitor as primary
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// A synthetic top-level window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    /// Window handle value
    pub handle: isize,
    /// Exact title
    pub title:  String,
    /// Extended frame bounds in physical pixels
    pub frame:  Rect,
}

/// Bitmap contents, BGRX rows top-down
#[derive(Debug)]
struct MockBitmap {
    width:  i32,
    height: i32,
    bgrx:   Vec<u8>,
}

/// Heap block handed out by `alloc_block`
#[derive(Debug, Clone, Copy)]
struct MockBlock {
    addr: usize,
    len:  usize,
}

#[derive(Debug, Default)]
struct Ledger {
    next_handle:       isize,
    live:              HashSet<RawHandle>,
    locked:            HashSet<RawHandle>,
    selections:        HashMap<RawHandle, RawHandle>,
    deleted_selected:  bool,
    bitmaps:           HashMap<RawHandle, MockBitmap>,
    blocks:            HashMap<RawHandle, MockBlock>,
    events:            Vec<String>,
    last_block_size:   Option<usize>,
    last_dib_header:   Option<DibHeader>,
}

impl Ledger {
    fn issue(&mut self, event: &str) -> RawHandle {
        self.next_handle += 1;
        let handle = RawHandle(self.next_handle);
        self.live.insert(handle);
        self.events.push(event.to_string());
        handle
    }

    fn retire(&mut self, handle: RawHandle, event: &str) {
        self.live.remove(&handle);
        self.events.push(event.to_string());
    }
}

/// Mock desktop backend for testing and development
///
/// Implements every capability trait without touching the OS. The default
/// desktop has two monitors:
///
/// - `\\.\DISPLAY1` (primary): 1920x1080 physical at 125% scaling, reported
///   as 1536x864
/// - `\\.\DISPLAY2`: 2560x1440 physical at 100%, right of the primary
///
/// and two windows, `Untitled - Notepad` and `File Explorer`.
///
/// # Thread Safety
///
/// `MockBackend` is `Send + Sync`; the ledger sits behind a mutex so
/// concurrent captures from several threads are recorded consistently.
#[derive(Debug)]
pub struct MockBackend {
    monitors:         Vec<MockMonitor>,
    windows:          Vec<MockWindow>,
    surface:          MockSurface,
    dpi_scale:        f64,
    fail_stage:       Option<FailStage>,
    scan_line_limit:  Option<u32>,
    last_error:       u32,
    ledger:           Mutex<Ledger>,
    dpi_aware:        OnceCell<bool>,
    dpi_transitions:  AtomicUsize,
    monitors_visited: AtomicUsize,
}

impl MockBackend {
    /// Creates a MockBackend with the default two-monitor desktop
    pub fn new() -> Self {
        Self {
            monitors:         Self::default_monitors(),
            windows:          Self::default_windows(),
            surface:          MockSurface::Coordinates,
            dpi_scale:        1.25,
            fail_stage:       None,
            scan_line_limit:  None,
            last_error:       0,
            ledger:           Mutex::new(Ledger::default()),
            dpi_aware:        OnceCell::new(),
            dpi_transitions:  AtomicUsize::new(0),
            monitors_visited: AtomicUsize::new(0),
        }
    }

    /// Replaces the monitor list
    pub fn with_monitors(mut self, monitors: Vec<MockMonitor>) -> Self {
        self.monitors = monitors;
        self
    }

    /// Replaces the window list
    pub fn with_windows(mut self, windows: Vec<MockWindow>) -> Self {
        self.windows = windows;
        self
    }

    /// Adds a window with the given title and physical frame bounds
    pub fn with_window(mut self, title: &str, frame: Rect) -> Self {
        let handle = 0x2000 + self.windows.len() as isize;
        self.windows.push(MockWindow {
            handle,
            title: title.to_string(),
            frame,
        });
        self
    }

    /// Sets the desktop content
    pub fn with_surface(mut self, surface: MockSurface) -> Self {
        self.surface = surface;
        self
    }

    /// Sets the scale applied to window bounds before DPI awareness
    pub fn with_dpi_scale(mut self, scale: f64) -> Self {
        self.dpi_scale = scale;
        self
    }

    /// Makes one step fail on every call
    pub fn failing_at(mut self, stage: FailStage) -> Self {
        self.fail_stage = Some(stage);
        self
    }

    /// Caps the scan lines `get_dib_bits` copies, as a short GDI read would
    pub fn with_scan_line_limit(mut self, lines: u32) -> Self {
        self.scan_line_limit = Some(lines);
        self
    }

    /// Sets the value reported by `last_error`
    pub fn with_last_error(mut self, code: u32) -> Self {
        self.last_error = code;
        self
    }

    fn default_monitors() -> Vec<MockMonitor> {
        vec![
            MockMonitor::unscaled(r"\\.\DISPLAY1", Rect::from_origin_size(0, 0, 1536, 864))
                .with_mode(Some(DisplayMode {
                    position_x:    0,
                    position_y:    0,
                    pixels_width:  1920,
                    pixels_height: 1080,
                }))
                .primary(),
            MockMonitor::unscaled(r"\\.\DISPLAY2", Rect::from_origin_size(1920, 0, 2560, 1440)),
        ]
    }

    fn default_windows() -> Vec<MockWindow> {
        vec![
            MockWindow {
                handle: 0x2000,
                title:  "Untitled - Notepad".to_string(),
                frame:  Rect::from_origin_size(100, 100, 800, 600),
            },
            MockWindow {
                handle: 0x2001,
                title:  "File Explorer".to_string(),
                frame:  Rect::from_origin_size(2000, 200, 1200, 900),
            },
        ]
    }

    fn fails(&self, stage: FailStage) -> bool {
        self.fail_stage == Some(stage)
    }

    fn monitor_for(&self, handle: MonitorHandle) -> Option<&MockMonitor> {
        let index = usize::try_from(handle.0.checked_sub(MONITOR_HANDLE_BASE)?).ok()?;
        self.monitors.get(index)
    }

    // ========== Ledger Inspection ==========

    /// Number of GDI objects and memory blocks currently alive
    pub fn live_handles(&self) -> usize {
        self.ledger.lock().live.len()
    }

    /// True if any memory block is still locked
    pub fn has_locked_blocks(&self) -> bool {
        !self.ledger.lock().locked.is_empty()
    }

    /// True if every memory DC had its original selection restored before
    /// it was deleted
    pub fn selection_restored(&self) -> bool {
        let ledger = self.ledger.lock();
        !ledger.deleted_selected && ledger.selections.values().all(|&s| s == STOCK_BITMAP)
    }

    /// Ordered log of GDI calls made so far
    pub fn events(&self) -> Vec<String> {
        self.ledger.lock().events.clone()
    }

    /// Size passed to the most recent `alloc_block`
    pub fn last_block_size(&self) -> Option<usize> {
        self.ledger.lock().last_block_size
    }

    /// Header passed to the most recent `get_dib_bits`
    pub fn last_dib_header(&self) -> Option<DibHeader> {
        self.ledger.lock().last_dib_header
    }

    /// Number of times the unaware to aware transition happened
    pub fn dpi_transitions(&self) -> usize {
        self.dpi_transitions.load(Ordering::SeqCst)
    }

    /// Total monitors handed to enumeration visitors so far
    pub fn monitors_visited(&self) -> usize {
        self.monitors_visited.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        // Free blocks a buggy caller never released so tests don't leak
        let ledger = self.ledger.get_mut();
        for (_, block) in ledger.blocks.drain() {
            free_heap_block(block);
        }
    }
}

fn free_heap_block(block: MockBlock) {
    // SAFETY: addr/len come from Box::into_raw in alloc_block and each
    // block is removed from the ledger before it is freed, so it is freed
    // exactly once.
    unsafe {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            block.addr as *mut u8,
            block.len,
        )));
    }
}

impl DisplayEnumerator for MockBackend {
    fn enumerate_displays(&self, visit: &mut dyn FnMut(MonitorHandle, Rect) -> ControlFlow<()>) {
        for (i, monitor) in self.monitors.iter().enumerate() {
            self.monitors_visited.fetch_add(1, Ordering::SeqCst);
            let handle = MonitorHandle(MONITOR_HANDLE_BASE + i as isize);
            if visit(handle, monitor.reported).is_break() {
                break;
            }
        }
    }
}

impl MonitorQuery for MockBackend {
    fn monitor_info(&self, monitor: MonitorHandle) -> Option<MonitorInfo> {
        if self.fails(FailStage::MonitorInfo) {
            return None;
        }
        let monitor = self.monitor_for(monitor)?;
        if !monitor.info_available {
            return None;
        }

        let mut work_area = monitor.reported;
        work_area.bottom = (work_area.bottom - 40).max(work_area.top);

        Some(MonitorInfo {
            device_name: monitor.device_name.clone(),
            rect: monitor.reported,
            work_area,
            is_primary: monitor.is_primary,
        })
    }

    fn current_display_mode(&self, device_name: &str) -> Option<DisplayMode> {
        if self.fails(FailStage::DisplayMode) {
            return None;
        }
        self.monitors
            .iter()
            .find(|m| m.device_name == device_name)
            .and_then(|m| m.mode)
    }
}

impl WindowLocator for MockBackend {
    fn find_window(&self, title: &str) -> Option<WindowHandle> {
        self.windows
            .iter()
            .find(|w| w.title == title)
            .map(|w| WindowHandle(w.handle))
    }

    fn extended_frame_bounds(&self, window: WindowHandle) -> CaptureResult<Rect> {
        let attribute_error = CaptureError::AttributeQuery {
            attribute: DWMWA_EXTENDED_FRAME_BOUNDS,
            code:      E_INVALID_WINDOW_HANDLE,
        };
        if self.fails(FailStage::FrameBounds) {
            return Err(attribute_error);
        }
        let frame = self
            .windows
            .iter()
            .find(|w| w.handle == window.0)
            .map(|w| w.frame)
            .ok_or(attribute_error)?;

        if self.dpi_aware.get().copied().unwrap_or(false) {
            return Ok(frame);
        }

        // Unaware processes see virtualized, scaled-down coordinates
        let scale = |v: i32| (v as f64 / self.dpi_scale).round() as i32;
        Ok(Rect {
            left:   scale(frame.left),
            top:    scale(frame.top),
            right:  scale(frame.right),
            bottom: scale(frame.bottom),
        })
    }

    fn declare_dpi_aware(&self) -> bool {
        *self.dpi_aware.get_or_init(|| {
            self.dpi_transitions.fetch_add(1, Ordering::SeqCst);
            true
        })
    }
}

impl ScreenMetrics for MockBackend {
    fn primary_screen_size(&self) -> (i32, i32) {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.first())
            .map(|m| match m.mode {
                Some(mode) => (mode.pixels_width as i32, mode.pixels_height as i32),
                None => (m.reported.width(), m.reported.height()),
            })
            .unwrap_or((0, 0))
    }
}

impl GraphicsDevice for MockBackend {
    fn acquire_screen_dc(&self) -> Option<RawHandle> {
        if self.fails(FailStage::ScreenDc) {
            return None;
        }
        Some(self.ledger.lock().issue("acquire_screen_dc"))
    }

    fn release_screen_dc(&self, dc: RawHandle) {
        self.ledger.lock().retire(dc, "release_screen_dc");
    }

    fn create_memory_dc(&self, _screen_dc: RawHandle) -> Option<RawHandle> {
        if self.fails(FailStage::MemoryDc) {
            return None;
        }
        let mut ledger = self.ledger.lock();
        let dc = ledger.issue("create_memory_dc");
        ledger.selections.insert(dc, STOCK_BITMAP);
        Some(dc)
    }

    fn delete_memory_dc(&self, dc: RawHandle) {
        let mut ledger = self.ledger.lock();
        if ledger.selections.remove(&dc).is_some_and(|s| s != STOCK_BITMAP) {
            ledger.deleted_selected = true;
        }
        ledger.retire(dc, "delete_memory_dc");
    }

    fn create_bitmap(&self, _screen_dc: RawHandle, width: i32, height: i32) -> Option<RawHandle> {
        if self.fails(FailStage::Bitmap) || width <= 0 || height <= 0 {
            return None;
        }
        let mut ledger = self.ledger.lock();
        let bitmap = ledger.issue("create_bitmap");
        ledger.bitmaps.insert(
            bitmap,
            MockBitmap {
                width,
                height,
                bgrx: vec![0; width as usize * height as usize * 4],
            },
        );
        Some(bitmap)
    }

    fn delete_bitmap(&self, bitmap: RawHandle) {
        let mut ledger = self.ledger.lock();
        ledger.bitmaps.remove(&bitmap);
        ledger.retire(bitmap, "delete_bitmap");
    }

    fn select_object(&self, dc: RawHandle, object: RawHandle) -> Option<RawHandle> {
        let mut ledger = self.ledger.lock();
        if object == STOCK_BITMAP {
            ledger.events.push("restore_selection".to_string());
        } else {
            if self.fails(FailStage::Select) {
                return None;
            }
            ledger.events.push("select_object".to_string());
        }
        ledger.selections.insert(dc, object)
    }

    fn alloc_block(&self, size: usize) -> Option<RawHandle> {
        if self.fails(FailStage::AllocBlock) || size == 0 {
            return None;
        }
        let addr = Box::into_raw(vec![0u8; size].into_boxed_slice()) as *mut u8 as usize;
        let mut ledger = self.ledger.lock();
        let block = ledger.issue("alloc_block");
        ledger.blocks.insert(block, MockBlock { addr, len: size });
        ledger.last_block_size = Some(size);
        Some(block)
    }

    fn free_block(&self, block: RawHandle) {
        let mut ledger = self.ledger.lock();
        if let Some(heap) = ledger.blocks.remove(&block) {
            free_heap_block(heap);
        }
        ledger.retire(block, "free_block");
    }

    fn lock_block(&self, block: RawHandle) -> Option<NonNull<u8>> {
        if self.fails(FailStage::LockBlock) {
            return None;
        }
        let mut ledger = self.ledger.lock();
        let heap = *ledger.blocks.get(&block)?;
        ledger.locked.insert(block);
        ledger.events.push("lock_block".to_string());
        NonNull::new(heap.addr as *mut u8)
    }

    fn unlock_block(&self, block: RawHandle) {
        let mut ledger = self.ledger.lock();
        ledger.locked.remove(&block);
        ledger.events.push("unlock_block".to_string());
    }

    fn bit_blt(
        &self,
        dst: RawHandle,
        width: i32,
        height: i32,
        _src: RawHandle,
        x: i32,
        y: i32,
    ) -> bool {
        if self.fails(FailStage::BitBlt) {
            return false;
        }
        let mut ledger = self.ledger.lock();
        ledger.events.push("bit_blt".to_string());

        let Some(&selected) = ledger.selections.get(&dst) else {
            return false;
        };
        let Some(bitmap) = ledger.bitmaps.get_mut(&selected) else {
            return false;
        };

        let (w, h) = (width.min(bitmap.width), height.min(bitmap.height));
        for row in 0..h {
            for col in 0..w {
                let [r, g, b] = self.surface.rgb_at(x + col, y + row);
                let offset = (row as usize * bitmap.width as usize + col as usize) * 4;
                // GDI leaves the fourth byte undefined; zero exercises the alpha fix-up
                bitmap.bgrx[offset..offset + 4].copy_from_slice(&[b, g, r, 0]);
            }
        }
        true
    }

    fn get_dib_bits(
        &self,
        _dc: RawHandle,
        bitmap: RawHandle,
        header: &DibHeader,
        bits: &mut [u8],
    ) -> u32 {
        let mut ledger = self.ledger.lock();
        ledger.last_dib_header = Some(*header);
        ledger.events.push("get_dib_bits".to_string());
        if self.fails(FailStage::GetDibBits) || header.bit_count != 32 {
            return 0;
        }
        let Some(bitmap) = ledger.bitmaps.get(&bitmap) else {
            return 0;
        };

        let row_bytes = bitmap.width.min(header.width).max(0) as usize * 4;
        let stride = header.width.max(0) as usize * 4;
        let lines = (header.scan_lines() as usize)
            .min(bitmap.height as usize)
            .min(self.scan_line_limit.map_or(usize::MAX, |limit| limit as usize));
        let top_down = header.height < 0;

        for line in 0..lines {
            let src_row = if top_down { line } else { lines - 1 - line };
            let src = &bitmap.bgrx[src_row * bitmap.width as usize * 4..][..row_bytes];
            let Some(dst) = bits.get_mut(line * stride..line * stride + row_bytes) else {
                return line as u32;
            };
            dst.copy_from_slice(src);
        }
        lines as u32
    }

    fn last_error(&self) -> u32 {
        self.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_default() {
        let backend = MockBackend::default();
        assert_eq!(backend.monitors.len(), 2);
        assert_eq!(backend.windows.len(), 2);
        assert_eq!(backend.live_handles(), 0);
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_surface_rgb_at() {
        assert_eq!(MockSurface::Solid([1, 2, 3]).rgb_at(999, -5), [1, 2, 3]);
        assert_eq!(MockSurface::Coordinates.rgb_at(3, 5), [3, 5, 6]);
        assert_eq!(MockSurface::Coordinates.rgb_at(256, 257), [0, 1, 1]);
    }

    #[test]
    fn test_enumeration_stops_on_break() {
        let backend = MockBackend::new();
        let mut seen = 0;
        backend.enumerate_displays(&mut |_, _| {
            seen += 1;
            ControlFlow::Break(())
        });
        assert_eq!(seen, 1);
        assert_eq!(backend.monitors_visited(), 1);
    }

    #[test]
    fn test_monitor_info_and_mode() {
        let backend = MockBackend::new();
        let info = backend.monitor_info(MonitorHandle(MONITOR_HANDLE_BASE)).unwrap();
        assert_eq!(info.device_name, r"\\.\DISPLAY1");
        assert!(info.is_primary);
        assert!(info.rect.contains_rect(&info.work_area));

        let mode = backend.current_display_mode(&info.device_name).unwrap();
        assert_eq!((mode.pixels_width, mode.pixels_height), (1920, 1080));
    }

    #[test]
    fn test_monitor_info_unknown_handle() {
        let backend = MockBackend::new();
        assert!(backend.monitor_info(MonitorHandle(0)).is_none());
        assert!(backend.monitor_info(MonitorHandle(MONITOR_HANDLE_BASE + 9)).is_none());
    }

    #[test]
    fn test_monitor_query_failure_injection() {
        let backend = MockBackend::new().failing_at(FailStage::DisplayMode);
        assert!(backend.monitor_info(MonitorHandle(MONITOR_HANDLE_BASE)).is_some());
        assert!(backend.current_display_mode(r"\\.\DISPLAY1").is_none());
    }

    #[test]
    fn test_frame_bounds_scaled_until_dpi_aware() {
        let backend = MockBackend::new()
            .with_windows(Vec::new())
            .with_window("Scaled", Rect::from_origin_size(125, 250, 500, 250));
        let hwnd = backend.find_window("Scaled").unwrap();

        let logical = backend.extended_frame_bounds(hwnd).unwrap();
        assert_eq!(logical, Rect::from_origin_size(100, 200, 400, 200));

        assert!(backend.declare_dpi_aware());
        let physical = backend.extended_frame_bounds(hwnd).unwrap();
        assert_eq!(physical, Rect::from_origin_size(125, 250, 500, 250));
    }

    #[test]
    fn test_declare_dpi_aware_single_transition() {
        let backend = MockBackend::new();
        assert!(backend.declare_dpi_aware());
        assert!(backend.declare_dpi_aware());
        assert!(backend.declare_dpi_aware());
        assert_eq!(backend.dpi_transitions(), 1);
    }

    #[test]
    fn test_find_window_exact_match_only() {
        let backend = MockBackend::new();
        assert!(backend.find_window("Untitled - Notepad").is_some());
        assert!(backend.find_window("untitled - notepad").is_none());
        assert!(backend.find_window("Notepad").is_none());
    }

    #[test]
    fn test_primary_screen_size_is_physical() {
        let backend = MockBackend::new();
        assert_eq!(backend.primary_screen_size(), (1920, 1080));

        let empty = MockBackend::new().with_monitors(Vec::new());
        assert_eq!(empty.primary_screen_size(), (0, 0));
    }

    #[test]
    fn test_ledger_tracks_gdi_objects() {
        let backend = MockBackend::new();
        let dc = backend.acquire_screen_dc().unwrap();
        let mem = backend.create_memory_dc(dc).unwrap();
        let bmp = backend.create_bitmap(dc, 4, 4).unwrap();
        assert_eq!(backend.live_handles(), 3);

        let previous = backend.select_object(mem, bmp).unwrap();
        assert_eq!(previous, STOCK_BITMAP);
        assert!(!backend.selection_restored());

        backend.select_object(mem, previous);
        backend.delete_bitmap(bmp);
        backend.delete_memory_dc(mem);
        backend.release_screen_dc(dc);
        assert_eq!(backend.live_handles(), 0);
        assert!(backend.selection_restored());
    }

    #[test]
    fn test_deleting_dc_with_bitmap_selected_is_flagged() {
        let backend = MockBackend::new();
        let dc = backend.acquire_screen_dc().unwrap();
        let mem = backend.create_memory_dc(dc).unwrap();
        let bmp = backend.create_bitmap(dc, 4, 4).unwrap();
        backend.select_object(mem, bmp).unwrap();
        backend.delete_memory_dc(mem);
        assert!(!backend.selection_restored());
    }

    #[test]
    fn test_block_lock_unlock() {
        let backend = MockBackend::new();
        let block = backend.alloc_block(64).unwrap();
        assert!(backend.lock_block(block).is_some());
        assert!(backend.has_locked_blocks());

        backend.unlock_block(block);
        backend.free_block(block);
        assert!(!backend.has_locked_blocks());
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn test_locked_block_starts_zeroed() {
        let backend = MockBackend::new();
        let block = backend.alloc_block(256).unwrap();
        let ptr = backend.lock_block(block).unwrap();

        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 256) };
        assert!(bytes.iter().all(|&b| b == 0));

        backend.unlock_block(block);
        backend.free_block(block);
    }

    #[test]
    fn test_leftover_blocks_freed_on_drop() {
        let backend = MockBackend::new();
        backend.alloc_block(1024).unwrap();
        assert_eq!(backend.live_handles(), 1);
        drop(backend);
    }

    #[test]
    fn test_get_dib_bits_bottom_up_request() {
        let backend = MockBackend::new().with_surface(MockSurface::Coordinates);
        let dc = backend.acquire_screen_dc().unwrap();
        let mem = backend.create_memory_dc(dc).unwrap();
        let bmp = backend.create_bitmap(dc, 1, 2).unwrap();
        backend.select_object(mem, bmp).unwrap();
        assert!(backend.bit_blt(mem, 1, 2, dc, 0, 10));

        let header = DibHeader {
            height: 2,
            ..DibHeader::top_down(1, 2, 32)
        };
        let mut bits = [0u8; 8];
        assert_eq!(backend.get_dib_bits(dc, bmp, &header, &mut bits), 2);
        // Bottom-up: first row returned is desktop y = 11
        assert_eq!(bits[1], 11);
        assert_eq!(bits[5], 10);
    }
}
