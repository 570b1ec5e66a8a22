//! Pixel pipeline performance benchmarks
//!
//! Measures the BGRX to RGBA conversion and a full mock capture on 1080p and
//! 4K (3840x2160) buffers, the per-frame cost on top of the GDI transfer.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use win_screenshot::{
    CaptureConfig, DesktopCapture, MockBackend,
    capture::{MockSurface, convert::bgra_to_rgba},
};

fn create_bgrx_frame(width: usize, height: usize) -> Vec<u8> {
    (0..width * height * 4).map(|i| (i % 251) as u8).collect()
}

fn bench_convert_1080p(c: &mut Criterion) {
    let (width, height) = (1920, 1080);
    let src = create_bgrx_frame(width, height);
    let mut dst = vec![0u8; width * height * 4];

    c.bench_function("bgra_to_rgba_1080p", |b| {
        b.iter(|| {
            bgra_to_rgba(black_box(&src), width * 4, width, height, black_box(&mut dst)).unwrap();
        });
    });
}

fn bench_convert_4k(c: &mut Criterion) {
    let (width, height) = (3840, 2160);
    let src = create_bgrx_frame(width, height);
    let mut dst = vec![0u8; width * height * 4];

    c.bench_function("bgra_to_rgba_4k", |b| {
        b.iter(|| {
            bgra_to_rgba(black_box(&src), width * 4, width, height, black_box(&mut dst)).unwrap();
        });
    });
}

fn bench_mock_capture_1080p(c: &mut Criterion) {
    let capture = DesktopCapture::with_config(
        MockBackend::new().with_surface(MockSurface::Solid([40, 80, 120])),
        CaptureConfig::default(),
    );

    c.bench_function("mock_capture_region_1080p", |b| {
        b.iter(|| {
            black_box(capture.capture_region(0, 0, 1920, 1080).unwrap());
        });
    });
}

criterion_group!(benches, bench_convert_1080p, bench_convert_4k, bench_mock_capture_1080p);
criterion_main!(benches);
