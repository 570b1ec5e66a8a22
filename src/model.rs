//! Data models for desktop capture
//!
//! This module defines the geometry and descriptor types shared by the
//! capture engine, the display enumerator and the window locator:
//! - [`Rect`] in absolute desktop pixel coordinates
//! - Opaque OS handles ([`MonitorHandle`], [`WindowHandle`])
//! - Monitor resolution results ([`MonitorInfo`], [`DisplayMode`],
//!   [`MonitorDescriptor`])

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};

/// Rectangle in absolute desktop pixel coordinates
///
/// `right` and `bottom` are exclusive. A well-formed rectangle has
/// `right >= left` and `bottom >= top`; zero-area rectangles are legal
/// values but cannot be captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive)
    pub left:   i32,
    /// Top edge (inclusive)
    pub top:    i32,
    /// Right edge (exclusive)
    pub right:  i32,
    /// Bottom edge (exclusive)
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its four edges
    ///
    /// Returns `InvalidParameter` if the edges are inverted.
    ///
    /// # Examples
    ///
    /// ```
    /// use win_screenshot::model::Rect;
    ///
    /// let rect = Rect::new(1191, 0, 1920, 1200).unwrap();
    /// assert_eq!((rect.width(), rect.height()), (729, 1200));
    /// assert!(Rect::new(10, 0, 5, 5).is_err());
    /// ```
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> CaptureResult<Self> {
        let rect = Self {
            left,
            top,
            right,
            bottom,
        };
        rect.validate()?;
        Ok(rect)
    }

    /// Creates a rectangle from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left:   x,
            top:    y,
            right:  x.saturating_add(width.min(i32::MAX as u32) as i32),
            bottom: y.saturating_add(height.min(i32::MAX as u32) as i32),
        }
    }

    /// Checks the `right >= left`, `bottom >= top` invariant
    pub fn validate(&self) -> CaptureResult<()> {
        if self.right < self.left || self.bottom < self.top {
            return Err(CaptureError::InvalidParameter {
                parameter: "rect".to_string(),
                reason:    format!(
                    "inverted rectangle ({}, {}, {}, {})",
                    self.left, self.top, self.right, self.bottom
                ),
            });
        }
        Ok(())
    }

    /// Width in pixels (negative only for malformed rectangles)
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels (negative only for malformed rectangles)
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Top-left corner
    pub fn origin(&self) -> (i32, i32) {
        (self.left, self.top)
    }

    /// Number of pixels covered, 0 for empty or malformed rectangles
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.width() as u64 * self.height() as u64
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// True when `other` lies entirely inside `self`
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

/// Opaque monitor handle, valid for the duration of one enumeration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorHandle(pub isize);

/// Opaque top-level window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

/// Result of the monitor-info query (resolver step one)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    /// Device name, e.g. `\\.\DISPLAY1`
    pub device_name: String,
    /// Monitor rectangle as reported by the OS (possibly DPI-scaled)
    pub rect:        Rect,
    /// Work area (monitor minus taskbar and app bars)
    pub work_area:   Rect,
    /// Whether this is the primary monitor
    pub is_primary:  bool,
}

/// Current display mode of a device (resolver step two)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMode {
    /// Desktop x coordinate of the device's top-left corner
    pub position_x:    i32,
    /// Desktop y coordinate of the device's top-left corner
    pub position_y:    i32,
    /// Physical width in pixels
    pub pixels_width:  u32,
    /// Physical height in pixels
    pub pixels_height: u32,
}

impl DisplayMode {
    /// Physical bounds of the device, `None` for a degenerate mode
    pub fn bounds(&self) -> Option<Rect> {
        if self.pixels_width == 0 || self.pixels_height == 0 {
            return None;
        }
        Some(Rect::from_origin_size(
            self.position_x,
            self.position_y,
            self.pixels_width,
            self.pixels_height,
        ))
    }
}

/// Where a monitor's resolved bounds came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsSource {
    /// Unscaled physical bounds from the device's current display mode
    Real,
    /// Enumeration-reported bounds, possibly DPI-scaled
    Reported,
}

/// A monitor as seen by one enumeration pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorDescriptor {
    /// Position in OS enumeration order
    pub index:       usize,
    /// OS handle, only meaningful within the same enumeration pass
    pub handle:      MonitorHandle,
    /// Device name, empty if the monitor-info query failed
    pub device_name: String,
    /// Rectangle reported by enumeration
    pub reported:    Rect,
    /// Resolved rectangle used for capture
    pub bounds:      Rect,
    /// Whether `bounds` is the physical or the reported rectangle
    pub source:      BoundsSource,
    /// Whether this is the primary monitor
    pub is_primary:  bool,
}

impl MonitorDescriptor {
    /// True when `bounds` are physical (unscaled) pixels
    pub fn is_real(&self) -> bool {
        self.source == BoundsSource::Real
    }
}
