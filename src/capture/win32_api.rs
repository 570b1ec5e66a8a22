//! Dynamically resolved Win32 entry points
//!
//! `SetProcessDPIAware` (user32) and `DwmGetWindowAttribute` (dwmapi) are
//! looked up at runtime so the crate still loads where either is missing.
//! Resolution happens once per process; [`Win32Api::global`] hands out the
//! shared instance, which also holds the DPI-awareness latch.

use std::ffi::c_void;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use windows_sys::Win32::{
    Foundation::{HWND, RECT},
    System::LibraryLoader::{GetProcAddress, LoadLibraryW},
};

use super::constants::DWMWA_EXTENDED_FRAME_BOUNDS;
use crate::{
    error::{CaptureError, CaptureResult},
    model::Rect,
};

#[allow(clippy::upper_case_acronyms)]
type BOOL = i32;
const FALSE: BOOL = 0;

type SetProcessDpiAwareFn = unsafe extern "system" fn() -> BOOL;
type DwmGetWindowAttributeFn =
    unsafe extern "system" fn(HWND, u32, *mut c_void, u32) -> i32;

static API: OnceCell<Win32Api> = OnceCell::new();

/// Optional Win32 functions plus the process DPI latch
#[derive(Debug)]
pub(crate) struct Win32Api {
    set_process_dpi_aware:    Option<SetProcessDpiAwareFn>,
    dwm_get_window_attribute: Option<DwmGetWindowAttributeFn>,
    dpi_aware:                OnceCell<bool>,
}

impl Win32Api {
    /// Process-wide instance, resolved on first use
    pub(crate) fn global() -> &'static Win32Api {
        API.get_or_init(Self::load)
    }

    fn load() -> Self {
        // SAFETY: transmuting between `extern "system"` function pointers
        // whose signatures match the documented exports.
        let set_process_dpi_aware = resolve("user32.dll", b"SetProcessDPIAware\0")
            .map(|f| unsafe { std::mem::transmute::<_, SetProcessDpiAwareFn>(f) });
        let dwm_get_window_attribute = resolve("dwmapi.dll", b"DwmGetWindowAttribute\0")
            .map(|f| unsafe { std::mem::transmute::<_, DwmGetWindowAttributeFn>(f) });

        debug!(
            set_process_dpi_aware = set_process_dpi_aware.is_some(),
            dwm_get_window_attribute = dwm_get_window_attribute.is_some(),
            "resolved optional Win32 entry points"
        );

        Self {
            set_process_dpi_aware,
            dwm_get_window_attribute,
            dpi_aware: OnceCell::new(),
        }
    }

    /// Declares the process DPI aware, once
    ///
    /// Later calls return the first call's outcome without touching the OS.
    pub(crate) fn declare_dpi_aware(&self) -> bool {
        *self.dpi_aware.get_or_init(|| match self.set_process_dpi_aware {
            // SAFETY: SetProcessDPIAware takes no arguments and only changes
            // process DPI state.
            Some(set_aware) => {
                let aware = unsafe { set_aware() } != FALSE;
                debug!(aware, "SetProcessDPIAware");
                aware
            }
            None => {
                warn!("SetProcessDPIAware is unavailable, coordinates may be scaled");
                false
            }
        })
    }

    /// `DwmGetWindowAttribute(DWMWA_EXTENDED_FRAME_BOUNDS)` for `hwnd`
    pub(crate) fn extended_frame_bounds(&self, hwnd: HWND) -> CaptureResult<Rect> {
        let Some(get_attribute) = self.dwm_get_window_attribute else {
            return Err(CaptureError::AttributeQuery {
                attribute: DWMWA_EXTENDED_FRAME_BOUNDS,
                code:      0,
            });
        };

        let mut rect = RECT {
            left:   0,
            top:    0,
            right:  0,
            bottom: 0,
        };
        // SAFETY: `rect` is a live RECT and the size passed matches it.
        let hr = unsafe {
            get_attribute(
                hwnd,
                DWMWA_EXTENDED_FRAME_BOUNDS,
                &mut rect as *mut RECT as *mut c_void,
                std::mem::size_of::<RECT>() as u32,
            )
        };
        if hr < 0 {
            warn!(hr, "DwmGetWindowAttribute failed");
            return Err(CaptureError::AttributeQuery {
                attribute: DWMWA_EXTENDED_FRAME_BOUNDS,
                code:      hr,
            });
        }

        Ok(Rect {
            left:   rect.left,
            top:    rect.top,
            right:  rect.right,
            bottom: rect.bottom,
        })
    }
}

/// Loads `library` and looks up `symbol` (NUL-terminated ANSI)
fn resolve(library: &str, symbol: &[u8]) -> Option<unsafe extern "system" fn() -> isize> {
    let wide: Vec<u16> = library.encode_utf16().chain(std::iter::once(0)).collect();

    // SAFETY: `wide` is NUL-terminated and outlives the call. The module is
    // never freed, so resolved pointers stay valid for the process lifetime.
    let module = unsafe { LoadLibraryW(wide.as_ptr()) };
    if module.is_null() {
        debug!(library, "LoadLibraryW failed");
        return None;
    }

    // SAFETY: `module` is a loaded module and `symbol` is NUL-terminated.
    unsafe { GetProcAddress(module, symbol.as_ptr()) }
}
