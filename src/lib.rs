//! win-screenshot: Windows desktop capture into RGBA buffers
//!
//! This library captures the primary screen, a display, a desktop rectangle
//! or a window's visible frame into an owned RGBA [`PixelBuffer`], and
//! enumerates monitors with their true (unscaled) geometry. Capture logic is
//! generic over capability traits, with a Win32 GDI backend on Windows and a
//! mock backend everywhere.
//!
//! ```
//! use win_screenshot::{DesktopCapture, MockBackend};
//!
//! let capture = DesktopCapture::new(MockBackend::new());
//! let bounds = capture.display_bounds(0).unwrap();
//! let display = capture.capture_rect(bounds).unwrap();
//! assert_eq!(display.as_bytes().len(), display.row_bytes() * display.height() as usize);
//! ```

pub mod capture;
pub mod error;
pub mod model;

#[cfg(target_os = "windows")]
pub use capture::WindowsBackend;
pub use capture::{
    AsyncDesktopCapture, CaptureConfig, DesktopCapture, MockBackend, PixelBuffer,
    create_default_backend,
};
pub use error::{CaptureError, CaptureResult, ErrorKind};
pub use model::{BoundsSource, MonitorDescriptor, Rect};
