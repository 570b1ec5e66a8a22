//! Desktop capture facade and backends
//!
//! This module ties the capture pieces together:
//!
//! - [`DesktopCapture`]: the public capture and enumeration operations,
//!   generic over a backend
//! - [`traits`]: the capability traits a backend implements
//! - [`engine`], [`monitor`], [`window`]: backend-independent logic (the
//!   GDI pipeline, display geometry resolution, window lookup)
//! - [`PixelBuffer`]: the RGBA result of every capture
//! - Backends: [`WindowsBackend`] on Windows, [`MockBackend`] everywhere
//!
//! # Blocking
//!
//! Every operation is synchronous and runs on the calling thread. There is
//! no timeout: a hung OS call blocks the caller. Use
//! [`AsyncDesktopCapture`] from async code.

use tracing::debug;

use crate::{
    error::CaptureResult,
    model::{MonitorDescriptor, Rect},
};

pub mod blocking;
pub mod constants;
pub mod convert;
pub mod engine;
pub mod mock;
pub mod monitor;
pub mod pixel_buffer;
pub mod traits;
pub mod window;

#[cfg(target_os = "windows")]
mod win32_api;
#[cfg(target_os = "windows")]
pub mod windows_backend;

pub use blocking::AsyncDesktopCapture;
pub use constants::CaptureConfig;
pub use mock::{FailStage, MockBackend, MockMonitor, MockSurface, MockWindow};
pub use pixel_buffer::PixelBuffer;
pub use traits::{
    DesktopBackend, DisplayEnumerator, GraphicsDevice, MonitorQuery, ScreenMetrics,
    WindowLocator,
};
#[cfg(target_os = "windows")]
pub use windows_backend::WindowsBackend;

/// Desktop capture operations over a backend
///
/// Captures return a fresh [`PixelBuffer`] owned by the caller. Display
/// indices follow OS enumeration order and are only stable between display
/// configuration changes.
///
/// `DesktopCapture` is `Send + Sync` and holds no per-capture state, so one
/// instance can serve concurrent captures from several threads.
///
/// # Examples
///
/// ```
/// use win_screenshot::capture::{DesktopCapture, MockBackend, MockSurface};
///
/// let capture = DesktopCapture::new(MockBackend::new().with_surface(MockSurface::Solid([9, 9, 9])));
///
/// for monitor in capture.list_monitors().unwrap() {
///     println!("{} {:?}", monitor.device_name, monitor.bounds);
/// }
///
/// let screen = capture.capture_screen().unwrap();
/// assert_eq!(screen.dimensions(), (1920, 1080));
/// ```
#[derive(Debug)]
pub struct DesktopCapture<B> {
    backend: B,
    config:  CaptureConfig,
}

impl<B: DesktopBackend> DesktopCapture<B> {
    /// Creates a facade with configuration read from the environment
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, CaptureConfig::from_env())
    }

    /// Creates a facade with an explicit configuration
    pub fn with_config(backend: B, config: CaptureConfig) -> Self {
        Self { backend, config }
    }

    /// The underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The active configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    // ========== Capture ==========

    /// Captures the primary screen from the desktop origin
    pub fn capture_screen(&self) -> CaptureResult<PixelBuffer> {
        let (width, height) = self.backend.primary_screen_size();
        debug!(width, height, "capture_screen");
        self.capture_region(0, 0, width, height)
    }

    /// Captures the visible frame of the window titled exactly `title`
    ///
    /// # Errors
    ///
    /// `WindowNotFound` if no top-level window has this title, plus any
    /// error from [`capture_rect`](Self::capture_rect).
    pub fn capture_window(&self, title: &str) -> CaptureResult<PixelBuffer> {
        let bounds = self.window_bounds(title)?;
        self.capture_rect(bounds)
    }

    /// Captures a desktop rectangle
    ///
    /// Fails with `InvalidParameter` for an inverted rectangle and with
    /// `Allocation` for an empty one.
    pub fn capture_rect(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
        rect.validate()?;
        self.capture_region(rect.left, rect.top, rect.width(), rect.height())
    }

    /// Captures `width` x `height` pixels starting at `(x, y)`
    pub fn capture_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> CaptureResult<PixelBuffer> {
        engine::capture_region(&self.backend, &self.config, x, y, width, height)
    }

    /// Captures the whole display at `index`
    pub fn capture_display(&self, index: usize) -> CaptureResult<PixelBuffer> {
        let bounds = self.display_bounds(index)?;
        self.capture_rect(bounds)
    }

    // ========== Displays ==========

    /// Number of active displays
    pub fn num_active_displays(&self) -> usize {
        monitor::num_active_displays(&self.backend)
    }

    /// Bounds of the display at `index`, physical pixels when resolvable
    pub fn display_bounds(&self, index: usize) -> CaptureResult<Rect> {
        monitor::display_bounds(&self.backend, index)
    }

    /// Describes every active display in enumeration order
    pub fn list_monitors(&self) -> CaptureResult<Vec<MonitorDescriptor>> {
        Ok(monitor::list_monitors(&self.backend))
    }

    // ========== Windows ==========

    /// Extended frame bounds of the window titled exactly `title`
    pub fn window_bounds(&self, title: &str) -> CaptureResult<Rect> {
        window::resolve_window_bounds(&self.backend, title)
    }

    /// Declares the process DPI aware, returning whether it is
    ///
    /// Only the first call changes process state.
    pub fn ensure_dpi_aware(&self) -> bool {
        self.backend.declare_dpi_aware()
    }
}

/// Creates the native capture facade for this platform
///
/// # Errors
///
/// `BackendNotAvailable` on every platform but Windows.
#[cfg(target_os = "windows")]
pub fn create_default_backend() -> CaptureResult<DesktopCapture<WindowsBackend>> {
    Ok(DesktopCapture::new(WindowsBackend::new()))
}

/// Creates the native capture facade for this platform
///
/// # Errors
///
/// `BackendNotAvailable` on every platform but Windows.
#[cfg(not(target_os = "windows"))]
pub fn create_default_backend() -> CaptureResult<DesktopCapture<MockBackend>> {
    Err(crate::error::CaptureError::BackendNotAvailable {
        platform: std::env::consts::OS.to_string(),
    })
}
