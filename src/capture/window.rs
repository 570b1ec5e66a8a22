//! Title lookup and frame bounds for top-level windows

use tracing::debug;

use super::traits::WindowLocator;
use crate::{
    error::{CaptureError, CaptureResult},
    model::Rect,
};

/// Visible frame of the first top-level window titled exactly `title`
///
/// Declares the process DPI aware before querying so the bounds are
/// physical pixels matching what the capture engine copies. Matching is
/// exact and case-sensitive; with duplicate titles the first window in OS
/// order wins.
///
/// # Errors
///
/// - `WindowNotFound` if no window has this title, or the title contains
///   `'\0'` (no window title can)
/// - `AttributeQuery` if the frame bounds cannot be read
pub fn resolve_window_bounds<L>(locator: &L, title: &str) -> CaptureResult<Rect>
where
    L: WindowLocator + ?Sized,
{
    let not_found = || CaptureError::WindowNotFound {
        title: title.to_string(),
    };
    if title.contains('\0') {
        debug!(title, "window title contains NUL");
        return Err(not_found());
    }

    if !locator.declare_dpi_aware() {
        debug!("process could not be made DPI aware, window bounds may be scaled");
    }

    let window = locator.find_window(title).ok_or_else(not_found)?;

    let bounds = locator.extended_frame_bounds(window)?;
    debug!(title, ?bounds, "resolved window bounds");
    Ok(bounds)
}
