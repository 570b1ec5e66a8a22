//! Win32 constants and runtime configuration for desktop capture.
//!
//! # Runtime Configuration
//!
//! The allocation limit can be overridden at runtime via environment
//! variable:
//!
//! | Environment Variable | Default | Description |
//! |---------------------|---------|-------------|
//! | `SCREENSHOT_MAX_CAPTURE_PIXELS` | 268435456 | Largest `width * height` a capture allocates |

/// Bits per pixel of the DIB requested from `GetDIBits`.
///
/// 32bpp gives BGRX pixels with no palette and rows that are always 4-byte
/// aligned.
pub const DIB_BITS_PER_PIXEL: u16 = 32;

/// Bytes per packed RGBA output pixel.
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// `iModeNum` value selecting the current display mode in
/// `EnumDisplaySettingsW`.
pub const ENUM_CURRENT_SETTINGS: u32 = 0xFFFF_FFFF;

/// `DWMWA_EXTENDED_FRAME_BOUNDS` window attribute.
///
/// Extended frame bounds are the visible outer frame including
/// compositor-drawn effects, in physical pixels once the process is DPI
/// aware.
pub const DWMWA_EXTENDED_FRAME_BOUNDS: u32 = 9;

/// Length of the device name buffer in `MONITORINFOEXW`.
pub const CCHDEVICENAME: usize = 32;

/// Default upper bound on `width * height` for a single capture.
///
/// 16384 x 16384 covers any realistic virtual desktop (eight 8K panels)
/// while refusing obviously corrupt rectangles before they reach the
/// allocator.
pub const MAX_CAPTURE_PIXELS: u64 = 16_384 * 16_384;

// =============================================================================
// Environment Variable Overrides
// =============================================================================

/// Helper to get a limit from environment variable or fall back to default.
fn get_limit_from_env(env_var: &str, default: u64) -> u64 {
    std::env::var(env_var)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

/// Get the capture pixel limit, checking environment variable override.
///
/// Override with: `SCREENSHOT_MAX_CAPTURE_PIXELS`
///
/// # Example
///
/// ```bash
/// # Refuse anything larger than a single 4K display
/// export SCREENSHOT_MAX_CAPTURE_PIXELS=8294400
/// ```
pub fn max_capture_pixels() -> u64 {
    get_limit_from_env("SCREENSHOT_MAX_CAPTURE_PIXELS", MAX_CAPTURE_PIXELS)
}

/// Runtime configuration held by [`DesktopCapture`](super::DesktopCapture).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Largest `width * height` a single capture may allocate
    pub max_capture_pixels: u64,
}

impl CaptureConfig {
    /// Reads the configuration from the environment, falling back to
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self {
            max_capture_pixels: max_capture_pixels(),
        }
    }

    /// Overrides the pixel limit
    pub fn with_max_capture_pixels(mut self, limit: u64) -> Self {
        self.max_capture_pixels = limit;
        self
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_capture_pixels: MAX_CAPTURE_PIXELS,
        }
    }
}
