//! Windows desktop backend using Win32 GDI
//!
//! Implements the capability traits over the classic Win32 surfaces:
//!
//! - `EnumDisplayMonitors` for monitor enumeration
//! - `GetMonitorInfoW` + `EnumDisplaySettingsW(ENUM_CURRENT_SETTINGS)` for
//!   unscaled monitor bounds
//! - `FindWindowW` + `DwmGetWindowAttribute` for window frames
//! - `GetDC`/`BitBlt`/`GetDIBits` and friends for the pixel transfer
//!
//! All calls are synchronous and made on the caller's thread.
//!
//! # Examples
//!
//! ```rust,ignore
//! use win_screenshot::capture::{DesktopCapture, WindowsBackend};
//!
//! let capture = DesktopCapture::new(WindowsBackend::new());
//! let screen = capture.capture_screen()?;
//! println!("{}x{}", screen.width(), screen.height());
//! ```

use std::{ffi::OsString, ops::ControlFlow, os::windows::ffi::OsStringExt, ptr, ptr::NonNull};

use tracing::{debug, warn};
use windows_sys::Win32::{
    Foundation::{GetLastError, HWND, LPARAM, RECT},
    Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap,
        CreateCompatibleDC, DEVMODEW, DIB_RGB_COLORS, DeleteDC, DeleteObject, EnumDisplayMonitors,
        EnumDisplaySettingsW, GetDC, GetDIBits, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
        MONITORINFOEXW, ReleaseDC, SRCCOPY, SelectObject,
    },
    System::Memory::{
        GMEM_MOVEABLE, GMEM_ZEROINIT, GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock,
    },
    UI::WindowsAndMessaging::{
        FindWindowW, GetDesktopWindow, GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN,
    },
};

#[allow(clippy::upper_case_acronyms)]
type BOOL = i32;
const TRUE: BOOL = 1;
const FALSE: BOOL = 0;

/// `dwFlags` bit marking the primary monitor
const MONITORINFOF_PRIMARY: u32 = 1;

use super::{
    constants::{CCHDEVICENAME, ENUM_CURRENT_SETTINGS},
    convert::dib_stride,
    traits::{
        DibHeader, DisplayEnumerator, GraphicsDevice, MonitorQuery, RawHandle, ScreenMetrics,
        WindowLocator,
    },
    win32_api::Win32Api,
};
use crate::{
    error::CaptureResult,
    model::{DisplayMode, MonitorHandle, MonitorInfo, Rect, WindowHandle},
};

type Visitor<'a> = &'a mut dyn FnMut(MonitorHandle, Rect) -> ControlFlow<()>;

/// Win32 GDI desktop backend
///
/// Holds only the process-wide [`Win32Api`]; every capture creates and
/// releases its own GDI objects.
///
/// # Thread Safety
///
/// `WindowsBackend` is `Send + Sync` and can be shared across threads.
#[derive(Debug)]
pub struct WindowsBackend {
    api: &'static Win32Api,
}

impl WindowsBackend {
    /// Creates a backend bound to the process-wide Win32 entry points
    pub fn new() -> Self {
        Self {
            api: Win32Api::global(),
        }
    }
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn rect_from_win32(rect: &RECT) -> Rect {
    Rect {
        left:   rect.left,
        top:    rect.top,
        right:  rect.right,
        bottom: rect.bottom,
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn from_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    OsString::from_wide(&buffer[..len]).to_string_lossy().into_owned()
}

impl DisplayEnumerator for WindowsBackend {
    fn enumerate_displays(&self, visit: &mut dyn FnMut(MonitorHandle, Rect) -> ControlFlow<()>) {
        unsafe extern "system" fn enum_callback(
            monitor: HMONITOR,
            _dc: HDC,
            rect: *mut RECT,
            lparam: LPARAM,
        ) -> BOOL {
            // SAFETY: lparam points at the visitor borrowed by
            // enumerate_displays for the duration of EnumDisplayMonitors
            let visit = unsafe { &mut *(lparam as *mut Visitor<'_>) };

            // SAFETY: rect is either null or a valid RECT from the OS
            let reported = unsafe { rect.as_ref() }.map(rect_from_win32).unwrap_or_default();

            match visit(MonitorHandle(monitor as isize), reported) {
                ControlFlow::Continue(()) => TRUE,
                ControlFlow::Break(()) => FALSE,
            }
        }

        let mut visit: Visitor<'_> = visit;
        // SAFETY: the callback only dereferences lparam while this call is
        // on the stack, and `visit` outlives it.
        unsafe {
            EnumDisplayMonitors(
                ptr::null_mut(),
                ptr::null(),
                Some(enum_callback),
                &mut visit as *mut Visitor<'_> as LPARAM,
            );
        }
    }
}

impl MonitorQuery for WindowsBackend {
    fn monitor_info(&self, monitor: MonitorHandle) -> Option<MonitorInfo> {
        // SAFETY: MONITORINFOEXW is plain data, all-zero is a valid value
        let mut info: MONITORINFOEXW = unsafe { std::mem::zeroed() };
        info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

        // SAFETY: cbSize announces the extended struct, which starts with
        // MONITORINFO
        let ok = unsafe {
            GetMonitorInfoW(
                monitor.0 as HMONITOR,
                &mut info as *mut MONITORINFOEXW as *mut MONITORINFO,
            )
        };
        if ok == FALSE {
            // SAFETY: reads the calling thread's last-error value
            let code = unsafe { GetLastError() };
            warn!(code, handle = monitor.0, "GetMonitorInfoW failed");
            return None;
        }

        Some(MonitorInfo {
            device_name: from_wide(&info.szDevice[..CCHDEVICENAME]),
            rect:        rect_from_win32(&info.monitorInfo.rcMonitor),
            work_area:   rect_from_win32(&info.monitorInfo.rcWork),
            is_primary:  info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        })
    }

    fn current_display_mode(&self, device_name: &str) -> Option<DisplayMode> {
        let name = to_wide(device_name);
        // SAFETY: DEVMODEW is plain data, all-zero is a valid value
        let mut mode: DEVMODEW = unsafe { std::mem::zeroed() };
        mode.dmSize = std::mem::size_of::<DEVMODEW>() as u16;

        // SAFETY: `name` is NUL-terminated and `mode` has dmSize set
        let ok = unsafe { EnumDisplaySettingsW(name.as_ptr(), ENUM_CURRENT_SETTINGS, &mut mode) };
        if ok == FALSE {
            warn!(device_name, "EnumDisplaySettingsW failed");
            return None;
        }

        // SAFETY: for display devices the position member of the union is
        // the one EnumDisplaySettingsW fills in
        let position = unsafe { mode.Anonymous1.Anonymous2.dmPosition };
        Some(DisplayMode {
            position_x:    position.x,
            position_y:    position.y,
            pixels_width:  mode.dmPelsWidth,
            pixels_height: mode.dmPelsHeight,
        })
    }
}

impl WindowLocator for WindowsBackend {
    fn find_window(&self, title: &str) -> Option<WindowHandle> {
        // FindWindowW would stop at an interior NUL and match a prefix
        if title.contains('\0') {
            return None;
        }
        let title = to_wide(title);
        // SAFETY: null class matches any class; title is NUL-terminated
        let hwnd = unsafe { FindWindowW(ptr::null(), title.as_ptr()) };
        (!hwnd.is_null()).then(|| WindowHandle(hwnd as isize))
    }

    fn extended_frame_bounds(&self, window: WindowHandle) -> CaptureResult<Rect> {
        self.api.extended_frame_bounds(window.0 as HWND)
    }

    fn declare_dpi_aware(&self) -> bool {
        self.api.declare_dpi_aware()
    }
}

impl ScreenMetrics for WindowsBackend {
    fn primary_screen_size(&self) -> (i32, i32) {
        // SAFETY: GetSystemMetrics has no preconditions
        unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) }
    }
}

impl GraphicsDevice for WindowsBackend {
    fn acquire_screen_dc(&self) -> Option<RawHandle> {
        // SAFETY: the desktop window always exists
        let dc = unsafe { GetDC(GetDesktopWindow()) };
        (!dc.is_null()).then(|| RawHandle(dc as isize))
    }

    fn release_screen_dc(&self, dc: RawHandle) {
        // SAFETY: dc came from GetDC on the desktop window
        unsafe { ReleaseDC(GetDesktopWindow(), dc.0 as HDC) };
    }

    fn create_memory_dc(&self, screen_dc: RawHandle) -> Option<RawHandle> {
        // SAFETY: screen_dc is a live device context
        let dc = unsafe { CreateCompatibleDC(screen_dc.0 as HDC) };
        (!dc.is_null()).then(|| RawHandle(dc as isize))
    }

    fn delete_memory_dc(&self, dc: RawHandle) {
        // SAFETY: dc came from CreateCompatibleDC and is deleted once
        unsafe { DeleteDC(dc.0 as HDC) };
    }

    fn create_bitmap(&self, screen_dc: RawHandle, width: i32, height: i32) -> Option<RawHandle> {
        // SAFETY: screen_dc is a live device context
        let bitmap = unsafe { CreateCompatibleBitmap(screen_dc.0 as HDC, width, height) };
        (!bitmap.is_null()).then(|| RawHandle(bitmap as isize))
    }

    fn delete_bitmap(&self, bitmap: RawHandle) {
        // SAFETY: bitmap came from CreateCompatibleBitmap and is no longer
        // selected into a DC
        unsafe { DeleteObject(bitmap.0 as _) };
    }

    fn select_object(&self, dc: RawHandle, object: RawHandle) -> Option<RawHandle> {
        // SAFETY: both handles are live GDI objects
        let previous = unsafe { SelectObject(dc.0 as HDC, object.0 as _) };
        (!previous.is_null()).then(|| RawHandle(previous as isize))
    }

    fn alloc_block(&self, size: usize) -> Option<RawHandle> {
        // SAFETY: GlobalAlloc has no preconditions
        let block = unsafe { GlobalAlloc(GMEM_MOVEABLE | GMEM_ZEROINIT, size) };
        (!block.is_null()).then(|| RawHandle(block as isize))
    }

    fn free_block(&self, block: RawHandle) {
        // SAFETY: block came from GlobalAlloc, is unlocked and freed once
        unsafe { GlobalFree(block.0 as _) };
    }

    fn lock_block(&self, block: RawHandle) -> Option<NonNull<u8>> {
        // SAFETY: block came from GlobalAlloc with GMEM_ZEROINIT, so all of
        // its bytes are initialized
        NonNull::new(unsafe { GlobalLock(block.0 as _) }.cast::<u8>())
    }

    fn unlock_block(&self, block: RawHandle) {
        // SAFETY: block is currently locked by this thread
        unsafe { GlobalUnlock(block.0 as _) };
    }

    fn bit_blt(
        &self,
        dst: RawHandle,
        width: i32,
        height: i32,
        src: RawHandle,
        x: i32,
        y: i32,
    ) -> bool {
        // SAFETY: both DCs are live and dst has a bitmap selected
        unsafe { BitBlt(dst.0 as HDC, 0, 0, width, height, src.0 as HDC, x, y, SRCCOPY) != FALSE }
    }

    fn get_dib_bits(
        &self,
        dc: RawHandle,
        bitmap: RawHandle,
        header: &DibHeader,
        bits: &mut [u8],
    ) -> u32 {
        let required = dib_stride(header.width.max(0) as u32, header.bit_count)
            * header.scan_lines() as usize;
        if bits.len() < required {
            debug!(len = bits.len(), required, "GetDIBits destination too small");
            return 0;
        }

        // SAFETY: BITMAPINFO is plain data, all-zero is a valid value
        let mut info: BITMAPINFO = unsafe { std::mem::zeroed() };
        info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: header.width,
            biHeight: header.height,
            biPlanes: header.planes,
            biBitCount: header.bit_count,
            biCompression: BI_RGB as u32,
            ..info.bmiHeader
        };

        // SAFETY: `bits` holds at least `required` bytes, which is what
        // GetDIBits writes for this header
        let lines = unsafe {
            GetDIBits(
                dc.0 as HDC,
                bitmap.0 as _,
                0,
                header.scan_lines(),
                bits.as_mut_ptr().cast(),
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        lines.max(0) as u32
    }

    fn last_error(&self) -> u32 {
        // SAFETY: reads the calling thread's last-error value
        unsafe { GetLastError() }
    }
}
