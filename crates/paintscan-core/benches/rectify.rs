use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point2;
use paintscan_core::{
    canonical_square, homography_from_4pt, rectify, Image, Interpolation, PixelFormat,
    RectifyParams,
};

fn synthetic_frame(w: usize, h: usize) -> Image {
    let mut data = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        for x in 0..w {
            let px = [(x & 0xff) as u8, (y & 0xff) as u8, ((x + y) & 0xff) as u8, 255];
            data.extend_from_slice(&px);
        }
    }
    Image::from_raw(w, h, PixelFormat::Rgba8, data).expect("valid frame")
}

fn bench_rectify(c: &mut Criterion) {
    let frame = synthetic_frame(1920, 1080);
    let quad = [
        Point2::new(610.0, 220.0),
        Point2::new(1390.0, 260.0),
        Point2::new(1460.0, 930.0),
        Point2::new(540.0, 880.0),
    ];

    let mut group = c.benchmark_group("rectify_1080p_rgba");
    for size in [256usize, 512, 1024] {
        let h = homography_from_4pt(&quad, &canonical_square(size as f64)).expect("estimate");
        for interpolation in [Interpolation::Bilinear, Interpolation::Nearest] {
            let params = RectifyParams {
                interpolation,
                ..RectifyParams::square(size)
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{interpolation:?}"), size),
                &params,
                |b, params| b.iter(|| rectify(black_box(&frame.view()), &h, params)),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_rectify);
criterion_main!(benches);
