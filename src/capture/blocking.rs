//! Async adapter running captures on tokio's blocking pool
//!
//! GDI calls block, so async callers should not run them on a runtime
//! worker. [`AsyncDesktopCapture`] moves each operation onto
//! `tokio::task::spawn_blocking`. No timeout is applied; a hung OS call
//! still occupies one blocking thread until it returns.

use std::sync::Arc;

use super::{DesktopCapture, PixelBuffer, traits::DesktopBackend};
use crate::{
    error::{CaptureError, CaptureResult},
    model::{MonitorDescriptor, Rect},
};

/// Shared [`DesktopCapture`] whose operations run on the blocking pool
///
/// Cloning is cheap and every clone shares the same facade.
///
/// # Examples
///
/// ```
/// use win_screenshot::capture::{AsyncDesktopCapture, DesktopCapture, MockBackend};
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let capture = AsyncDesktopCapture::new(DesktopCapture::new(MockBackend::new()));
///
/// let buffer = runtime.block_on(capture.capture_region(0, 0, 16, 16)).unwrap();
/// assert_eq!(buffer.dimensions(), (16, 16));
/// ```
#[derive(Debug)]
pub struct AsyncDesktopCapture<B> {
    inner: Arc<DesktopCapture<B>>,
}

impl<B> Clone for AsyncDesktopCapture<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: DesktopBackend + 'static> AsyncDesktopCapture<B> {
    /// Wraps a facade
    pub fn new(capture: DesktopCapture<B>) -> Self {
        Self {
            inner: Arc::new(capture),
        }
    }

    /// Wraps a facade that is already shared
    pub fn from_shared(capture: Arc<DesktopCapture<B>>) -> Self {
        Self { inner: capture }
    }

    /// The wrapped facade, for synchronous use
    pub fn inner(&self) -> &DesktopCapture<B> {
        &self.inner
    }

    async fn run<T, F>(&self, op: F) -> CaptureResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&DesktopCapture<B>) -> CaptureResult<T> + Send + 'static,
    {
        let capture = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&capture))
            .await
            .map_err(|e| {
                tracing::error!("Capture task failed: {}", e);
                CaptureError::TaskFailed {
                    reason: e.to_string(),
                }
            })?
    }

    /// See [`DesktopCapture::capture_screen`]
    pub async fn capture_screen(&self) -> CaptureResult<PixelBuffer> {
        self.run(|c| c.capture_screen()).await
    }

    /// See [`DesktopCapture::capture_window`]
    pub async fn capture_window(&self, title: &str) -> CaptureResult<PixelBuffer> {
        let title = title.to_string();
        self.run(move |c| c.capture_window(&title)).await
    }

    /// See [`DesktopCapture::capture_rect`]
    pub async fn capture_rect(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
        self.run(move |c| c.capture_rect(rect)).await
    }

    /// See [`DesktopCapture::capture_region`]
    pub async fn capture_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> CaptureResult<PixelBuffer> {
        self.run(move |c| c.capture_region(x, y, width, height)).await
    }

    /// See [`DesktopCapture::capture_display`]
    pub async fn capture_display(&self, index: usize) -> CaptureResult<PixelBuffer> {
        self.run(move |c| c.capture_display(index)).await
    }

    /// See [`DesktopCapture::num_active_displays`]
    pub async fn num_active_displays(&self) -> CaptureResult<usize> {
        self.run(|c| Ok(c.num_active_displays())).await
    }

    /// See [`DesktopCapture::display_bounds`]
    pub async fn display_bounds(&self, index: usize) -> CaptureResult<Rect> {
        self.run(move |c| c.display_bounds(index)).await
    }

    /// See [`DesktopCapture::list_monitors`]
    pub async fn list_monitors(&self) -> CaptureResult<Vec<MonitorDescriptor>> {
        self.run(|c| c.list_monitors()).await
    }

    /// See [`DesktopCapture::window_bounds`]
    pub async fn window_bounds(&self, title: &str) -> CaptureResult<Rect> {
        let title = title.to_string();
        self.run(move |c| c.window_bounds(&title)).await
    }
}
