//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use win_screenshot::PixelBuffer;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber honouring `RUST_LOG`, once per binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Asserts the packed RGBA invariants every capture must hold
pub fn assert_valid_capture(buffer: &PixelBuffer, width: u32, height: u32) {
    assert_eq!(buffer.dimensions(), (width, height));
    assert_eq!(
        buffer.as_bytes().len(),
        width as usize * height as usize * 4,
        "buffer length must be width * height * 4"
    );
    let transparent = buffer
        .as_bytes()
        .chunks_exact(4)
        .filter(|px| px[3] != 0xFF)
        .count();
    assert_eq!(transparent, 0, "{} pixels without opaque alpha", transparent);
}

/// Fraction of pixels that are not pure black
pub fn non_black_ratio(buffer: &PixelBuffer) -> f64 {
    let total = buffer.as_bytes().len() / 4;
    if total == 0 {
        return 0.0;
    }
    let lit = buffer
        .as_bytes()
        .chunks_exact(4)
        .filter(|px| px[0] != 0 || px[1] != 0 || px[2] != 0)
        .count();
    lit as f64 / total as f64
}
