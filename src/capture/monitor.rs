//! Display enumeration and real-resolution resolution
//!
//! Enumeration reports monitor rectangles in the coordinate space of the
//! calling process, which under display scaling may be DPI-virtualized. The
//! resolver recovers physical bounds with a two-step query (monitor info for
//! the device name, then the device's current display mode) and callers fall
//! back to the reported rectangle when either step fails.

use std::ops::ControlFlow;

use tracing::{debug, warn};

use super::traits::{DisplayEnumerator, MonitorQuery};
use crate::{
    error::{CaptureError, CaptureResult},
    model::{BoundsSource, MonitorDescriptor, MonitorHandle, Rect},
};

/// Collects every active monitor with its reported rectangle, in OS order
pub fn enumerate_monitor_handles<E>(enumerator: &E) -> Vec<(MonitorHandle, Rect)>
where
    E: DisplayEnumerator + ?Sized,
{
    let mut monitors = Vec::new();
    enumerator.enumerate_displays(&mut |handle, rect| {
        monitors.push((handle, rect));
        ControlFlow::Continue(())
    });
    monitors
}

/// Counts active monitors
pub fn num_active_displays<E>(enumerator: &E) -> usize
where
    E: DisplayEnumerator + ?Sized,
{
    let mut count = 0;
    enumerator.enumerate_displays(&mut |_, _| {
        count += 1;
        ControlFlow::Continue(())
    });
    count
}

/// Unscaled bounds of `monitor`, or `None` if either query step fails
///
/// A display mode with zero width or height counts as a failure.
pub fn resolve_real_bounds<Q>(query: &Q, monitor: MonitorHandle) -> Option<Rect>
where
    Q: MonitorQuery + ?Sized,
{
    let info = query.monitor_info(monitor)?;
    let mode = query.current_display_mode(&info.device_name)?;
    mode.bounds()
}

/// Bounds of the display at `index`, physical when resolvable
///
/// Enumeration stops as soon as the index is reached.
///
/// # Errors
///
/// `DisplayNotFound` when `index` is not below the number of active
/// displays.
pub fn display_bounds<B>(backend: &B, index: usize) -> CaptureResult<Rect>
where
    B: DisplayEnumerator + MonitorQuery + ?Sized,
{
    let mut seen = 0;
    let mut found = None;
    backend.enumerate_displays(&mut |handle, rect| {
        if seen == index {
            found = Some((handle, rect));
            return ControlFlow::Break(());
        }
        seen += 1;
        ControlFlow::Continue(())
    });

    let Some((handle, reported)) = found else {
        return Err(CaptureError::DisplayNotFound {
            index,
            available: seen,
        });
    };

    match resolve_real_bounds(backend, handle) {
        Some(bounds) => {
            debug!(index, ?bounds, "display bounds resolved from display mode");
            Ok(bounds)
        }
        None => {
            warn!(index, ?reported, "display mode unavailable, using reported bounds");
            Ok(reported)
        }
    }
}

/// Describes every active monitor in OS order
pub fn list_monitors<B>(backend: &B) -> Vec<MonitorDescriptor>
where
    B: DisplayEnumerator + MonitorQuery + ?Sized,
{
    enumerate_monitor_handles(backend)
        .into_iter()
        .enumerate()
        .map(|(index, (handle, reported))| {
            let info = backend.monitor_info(handle);
            let real = info
                .as_ref()
                .and_then(|info| backend.current_display_mode(&info.device_name))
                .and_then(|mode| mode.bounds());

            let (bounds, source) = match real {
                Some(bounds) => (bounds, BoundsSource::Real),
                None => {
                    warn!(index, ?reported, "display mode unavailable, using reported bounds");
                    (reported, BoundsSource::Reported)
                }
            };

            MonitorDescriptor {
                index,
                handle,
                device_name: info.as_ref().map(|i| i.device_name.clone()).unwrap_or_default(),
                reported,
                bounds,
                source,
                is_primary: info.is_some_and(|i| i.is_primary),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::mock::{FailStage, MockBackend, MockMonitor},
        model::DisplayMode,
    };

    #[test]
    fn test_enumerate_in_os_order() {
        let backend = MockBackend::new();
        let monitors = enumerate_monitor_handles(&backend);
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[0].1, Rect::from_origin_size(0, 0, 1536, 864));
        assert_eq!(monitors[1].1, Rect::from_origin_size(1920, 0, 2560, 1440));
    }

    #[test]
    fn test_num_active_displays() {
        assert_eq!(num_active_displays(&MockBackend::new()), 2);
        assert_eq!(num_active_displays(&MockBackend::new().with_monitors(Vec::new())), 0);
    }

    #[test]
    fn test_resolve_real_bounds_uses_display_mode() {
        let backend = MockBackend::new();
        let (handle, reported) = enumerate_monitor_handles(&backend)[0];
        let real = resolve_real_bounds(&backend, handle).unwrap();
        assert_eq!(real, Rect::from_origin_size(0, 0, 1920, 1080));
        assert_ne!(real, reported);
    }

    #[test]
    fn test_resolve_real_bounds_fails_without_info() {
        let backend = MockBackend::new().failing_at(FailStage::MonitorInfo);
        let (handle, _) = enumerate_monitor_handles(&backend)[0];
        assert!(resolve_real_bounds(&backend, handle).is_none());
    }

    #[test]
    fn test_resolve_real_bounds_rejects_degenerate_mode() {
        let monitor = MockMonitor::unscaled("DEGENERATE", Rect::from_origin_size(0, 0, 800, 600))
            .with_mode(Some(DisplayMode {
                position_x:    0,
                position_y:    0,
                pixels_width:  0,
                pixels_height: 600,
            }));
        let backend = MockBackend::new().with_monitors(vec![monitor]);
        let (handle, _) = enumerate_monitor_handles(&backend)[0];
        assert!(resolve_real_bounds(&backend, handle).is_none());
    }

    #[test]
    fn test_display_bounds_stops_at_index() {
        let backend = MockBackend::new();
        display_bounds(&backend, 0).unwrap();
        assert_eq!(backend.monitors_visited(), 1);
    }

    #[test]
    fn test_display_bounds_falls_back_to_reported() {
        let reported = Rect::from_origin_size(-1280, 0, 1280, 1024);
        let monitor = MockMonitor::unscaled("LEFT", reported).with_mode(None);
        let backend = MockBackend::new().with_monitors(vec![monitor]);
        assert_eq!(display_bounds(&backend, 0).unwrap(), reported);
    }

    #[test]
    fn test_display_bounds_out_of_range() {
        let backend = MockBackend::new();
        let err = display_bounds(&backend, 2).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::DisplayNotFound {
                index:     2,
                available: 2,
            }
        ));
    }

    #[test]
    fn test_list_monitors_marks_source() {
        let backend = MockBackend::new().with_monitors(vec![
            MockMonitor::unscaled("A", Rect::from_origin_size(0, 0, 1920, 1080)).primary(),
            MockMonitor::unscaled("B", Rect::from_origin_size(1920, 0, 1280, 1024)).without_info(),
        ]);
        let monitors = list_monitors(&backend);

        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[0].device_name, "A");
        assert!(monitors[0].is_real());
        assert!(monitors[0].is_primary);

        assert_eq!(monitors[1].index, 1);
        assert!(monitors[1].device_name.is_empty());
        assert_eq!(monitors[1].source, BoundsSource::Reported);
        assert_eq!(monitors[1].bounds, monitors[1].reported);
        assert!(!monitors[1].is_primary);
    }
}
