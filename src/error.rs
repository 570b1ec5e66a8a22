//! Error types for screenshot capture operations
//!
//! This module defines the error taxonomy for the GDI capture pipeline, the
//! display enumerator and the window locator. Each error carries the context
//! needed to diagnose it (the failing surface, the Win32 error code, the
//! missing title or index) and suggests next steps through
//! [`CaptureError::remediation_hint`].
//!
//! Errors are never retried internally. A failed OS call is surfaced
//! immediately and no partially filled buffer is ever returned.

use std::fmt;

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Coarse classification of a [`CaptureError`]
///
/// Callers that only care about the broad category (for example to decide
/// whether to fall back to a different display) can match on this instead of
/// the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Device context, surface, bitmap or selection could not be acquired
    ResourceAcquisition,
    /// Pixel block copy or DIB retrieval failed
    Transfer,
    /// Window title or display index did not resolve
    NotFound,
    /// Pixel buffer or transfer block could not be allocated
    Allocation,
    /// Caller supplied an invalid value
    InvalidInput,
    /// The backend or a worker thread is unavailable
    Unavailable,
}

impl ErrorKind {
    /// Returns the kind as a lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ResourceAcquisition => "resource_acquisition",
            ErrorKind::Transfer => "transfer",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Allocation => "allocation",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GDI surface created during capture setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Memory device context compatible with the desktop DC
    MemoryDc,
    /// Bitmap compatible with the desktop DC
    Bitmap,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::MemoryDc => f.write_str("memory device context"),
            Surface::Bitmap => f.write_str("compatible bitmap"),
        }
    }
}

/// Error type for screenshot capture operations
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Destination pixel buffer or transfer block could not be allocated
    #[error("Failed to allocate {width}x{height} capture buffer: {reason}")]
    Allocation {
        /// Requested width in pixels
        width:  i32,
        /// Requested height in pixels
        height: i32,
        /// What went wrong
        reason: String,
    },

    /// Desktop device context is unavailable
    #[error("Failed to acquire desktop device context (win32 error {code})")]
    DeviceContext {
        /// `GetLastError` value at the time of failure
        code: u32,
    },

    /// Memory DC or compatible bitmap creation failed
    #[error("Failed to create {surface} (win32 error {code})")]
    SurfaceCreation {
        /// Which surface failed
        surface: Surface,
        /// `GetLastError` value at the time of failure
        code:    u32,
    },

    /// Bitmap could not be selected into the memory DC
    #[error("Failed to select bitmap into memory device context (win32 error {code})")]
    Selection {
        /// `GetLastError` value at the time of failure
        code: u32,
    },

    /// Transfer memory block could not be locked
    #[error("Failed to lock transfer memory block (win32 error {code})")]
    TransferBufferLock {
        /// `GetLastError` value at the time of failure
        code: u32,
    },

    /// Block pixel copy from the desktop failed
    #[error("BitBlt from desktop failed (win32 error {code})")]
    Copy {
        /// `GetLastError` value at the time of failure
        code: u32,
    },

    /// Device-independent bitmap retrieval failed
    #[error("GetDIBits failed (win32 error {code})")]
    Retrieval {
        /// `GetLastError` value at the time of failure
        code: u32,
    },

    /// No top-level window has exactly this title
    #[error("Window not found: {title:?}")]
    WindowNotFound {
        /// The title that failed to match
        title: String,
    },

    /// Display index is outside the enumerated range
    #[error("Display {index} not found ({available} active displays)")]
    DisplayNotFound {
        /// Requested index
        index:     usize,
        /// Number of displays seen during enumeration
        available: usize,
    },

    /// Window attribute query failed
    #[error("DwmGetWindowAttribute({attribute}) failed with HRESULT {code:#010x}")]
    AttributeQuery {
        /// DWMWA attribute identifier
        attribute: u32,
        /// HRESULT returned by the query, 0 if the entry point is missing
        code:      i32,
    },

    /// Invalid parameter provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: String,
        /// Reason why it's invalid
        reason:    String,
    },

    /// No capture backend exists for this platform
    #[error("Screen capture backend is not available on {platform}")]
    BackendNotAvailable {
        /// Platform identifier (`std::env::consts::OS`)
        platform: String,
    },

    /// Blocking worker task failed to complete
    #[error("Capture task failed: {reason}")]
    TaskFailed {
        /// Join error description
        reason: String,
    },
}

impl CaptureError {
    /// Returns the broad category this error belongs to
    ///
    /// # Examples
    ///
    /// ```
    /// use win_screenshot::error::{CaptureError, ErrorKind};
    ///
    /// let error = CaptureError::WindowNotFound {
    ///     title: "Notepad".to_string(),
    /// };
    /// assert_eq!(error.kind(), ErrorKind::NotFound);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::DeviceContext { .. }
            | CaptureError::SurfaceCreation { .. }
            | CaptureError::Selection { .. }
            | CaptureError::TransferBufferLock { .. }
            | CaptureError::AttributeQuery { .. } => ErrorKind::ResourceAcquisition,
            CaptureError::Copy { .. } | CaptureError::Retrieval { .. } => ErrorKind::Transfer,
            CaptureError::WindowNotFound { .. } | CaptureError::DisplayNotFound { .. } => {
                ErrorKind::NotFound
            }
            CaptureError::Allocation { .. } => ErrorKind::Allocation,
            CaptureError::InvalidParameter { .. } => ErrorKind::InvalidInput,
            CaptureError::BackendNotAvailable { .. } | CaptureError::TaskFailed { .. } => {
                ErrorKind::Unavailable
            }
        }
    }

    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use win_screenshot::error::CaptureError;
    ///
    /// let error = CaptureError::DisplayNotFound {
    ///     index:     3,
    ///     available: 1,
    /// };
    /// assert!(error.remediation_hint().contains("num_active_displays"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            CaptureError::Allocation { width, height, .. } if *width <= 0 || *height <= 0 => {
                "The capture region is empty. Pass a rectangle with positive width and height."
            }
            CaptureError::Allocation { .. } => {
                "The capture region is too large for available memory. Capture a smaller region \
                 or raise SCREENSHOT_MAX_CAPTURE_PIXELS if the limit was hit."
            }
            CaptureError::DeviceContext { .. } => {
                "The desktop device context is unavailable. Capture must run in an interactive \
                 session; services and locked workstations have no visible desktop."
            }
            CaptureError::SurfaceCreation { .. } | CaptureError::Selection { .. } => {
                "GDI could not create capture surfaces. The process may have exhausted its GDI \
                 object quota; close leaked handles or capture a smaller region."
            }
            CaptureError::TransferBufferLock { .. } => {
                "The transfer memory block could not be locked. Check available system memory."
            }
            CaptureError::Copy { .. } | CaptureError::Retrieval { .. } => {
                "Copying pixels from the desktop failed. The desktop may have switched (UAC \
                 prompt, lock screen) during capture; retry once it is visible again."
            }
            CaptureError::WindowNotFound { .. } => {
                "No top-level window has exactly this title. Titles are matched exactly and are \
                 case-sensitive; check the current title of the window (it may change \
                 dynamically)."
            }
            CaptureError::DisplayNotFound { .. } => {
                "Display indices run from 0 to num_active_displays() - 1 and follow OS \
                 enumeration order. Re-enumerate after display configuration changes."
            }
            CaptureError::AttributeQuery { .. } => {
                "The window's extended frame bounds could not be read. Desktop composition \
                 (dwmapi.dll) must be available and the window must still exist."
            }
            CaptureError::InvalidParameter { parameter, .. } => match parameter.as_str() {
                "rect" => "Rectangles need right >= left and bottom >= top.",
                _ => "Check the parameter value against the API documentation.",
            },
            CaptureError::BackendNotAvailable { .. } => {
                "GDI screen capture is only available on Windows. Use MockBackend for tests on \
                 other platforms."
            }
            CaptureError::TaskFailed { .. } => {
                "The blocking capture task panicked or was cancelled. Check the logs for the \
                 underlying failure."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_not_found_error_message() {
        let error = CaptureError::WindowNotFound {
            title: "Untitled - Notepad".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("Window not found"));
        assert!(msg.contains("Untitled - Notepad"));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.remediation_hint().contains("exactly"));
    }

    #[test]
    fn test_display_not_found_error_message() {
        let error = CaptureError::DisplayNotFound {
            index:     4,
            available: 2,
        };

        let msg = error.to_string();
        assert!(msg.contains("Display 4"));
        assert!(msg.contains("2 active displays"));
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_surface_creation_message_names_surface() {
        let error = CaptureError::SurfaceCreation {
            surface: Surface::Bitmap,
            code:    8,
        };

        let msg = error.to_string();
        assert!(msg.contains("compatible bitmap"));
        assert!(msg.contains("8"));
        assert_eq!(error.kind(), ErrorKind::ResourceAcquisition);
        assert!(error.remediation_hint().contains("GDI"));
    }

    #[test]
    fn test_transfer_errors_classified() {
        assert_eq!(CaptureError::Copy { code: 5 }.kind(), ErrorKind::Transfer);
        assert_eq!(CaptureError::Retrieval { code: 0 }.kind(), ErrorKind::Transfer);
    }

    #[test]
    fn test_resource_errors_classified() {
        assert_eq!(CaptureError::DeviceContext { code: 0 }.kind(), ErrorKind::ResourceAcquisition);
        assert_eq!(CaptureError::Selection { code: 0 }.kind(), ErrorKind::ResourceAcquisition);
        assert_eq!(
            CaptureError::TransferBufferLock { code: 0 }.kind(),
            ErrorKind::ResourceAcquisition
        );
    }

    #[test]
    fn test_allocation_hint_distinguishes_empty_region() {
        let empty = CaptureError::Allocation {
            width:  0,
            height: 10,
            reason: "empty".to_string(),
        };
        assert!(empty.remediation_hint().contains("positive width"));

        let huge = CaptureError::Allocation {
            width:  100_000,
            height: 100_000,
            reason: "limit".to_string(),
        };
        assert!(huge.remediation_hint().contains("SCREENSHOT_MAX_CAPTURE_PIXELS"));
        assert_eq!(huge.kind(), ErrorKind::Allocation);
    }

    #[test]
    fn test_attribute_query_formats_hresult() {
        let error = CaptureError::AttributeQuery {
            attribute: 9,
            code:      0x8007_0578_u32 as i32,
        };

        let msg = error.to_string();
        assert!(msg.contains("DwmGetWindowAttribute(9)"));
        assert!(msg.contains("0x80070578"));
        assert_eq!(error.kind(), ErrorKind::ResourceAcquisition);
    }

    #[test]
    fn test_invalid_parameter_rect_hint() {
        let error = CaptureError::InvalidParameter {
            parameter: "rect".to_string(),
            reason:    "right < left".to_string(),
        };

        assert!(error.to_string().contains("Invalid parameter 'rect'"));
        assert!(error.remediation_hint().contains("right >= left"));
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_backend_not_available() {
        let error = CaptureError::BackendNotAvailable {
            platform: "linux".to_string(),
        };

        assert!(error.to_string().contains("linux"));
        assert!(error.remediation_hint().contains("MockBackend"));
        assert_eq!(error.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ResourceAcquisition.to_string(), "resource_acquisition");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
