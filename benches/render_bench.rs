use criterion::{criterion_group, criterion_main, Criterion};
use layout_shift_gif::animation::encode_diff;
use layout_shift_gif::collector::{
    collect, AffectedElement, Rect, ShiftNotification, ShiftReport, WindowingMode,
};
use layout_shift_gif::rendering::{render_diff, Pixmap};
use layout_shift_gif::GifOptions;

// A mobile-sized page with a few dozen shifted elements
fn sample_report() -> ShiftReport {
    let notifications = (0..40)
        .map(|i| {
            let y = (i * 17) as f64;
            ShiftNotification::new(
                0.004 * (i % 7 + 1) as f64,
                (i * 40) as f64,
                vec![AffectedElement {
                    previous_rect: Rect::new((i % 5) as f64 * 70.0, y, 60.0, 24.0),
                    current_rect: Rect::new((i % 5) as f64 * 70.0, y + 30.0, 60.0, 24.0),
                    selector: None,
                }],
            )
        })
        .collect::<Vec<_>>();
    collect(notifications, WindowingMode::SessionWindowed)
}

fn background() -> Pixmap {
    let mut p = Pixmap::new(1082, 1922).expect("pixmap");
    p.fill(tiny_skia::Color::from_rgba8(240, 240, 236, 255));
    p
}

fn bench_render_diff(c: &mut Criterion) {
    let report = sample_report();
    let bg = background();

    c.bench_function("render_diff", |b| {
        b.iter(|| {
            let _ = render_diff(&bg, &report, 2.625).unwrap();
        })
    });
}

fn bench_encode_gif(c: &mut Criterion) {
    let frames = render_diff(&background(), &sample_report(), 2.625).unwrap();
    let options = GifOptions::default();

    let mut group = c.benchmark_group("encode_gif");
    group.sample_size(10);
    group.bench_function("two_frames", |b| {
        b.iter(|| {
            let _ = encode_diff(&frames, &options).unwrap();
        })
    });
    group.finish();
}

criterion_group!(benches, bench_render_diff, bench_encode_gif);
criterion_main!(benches);
