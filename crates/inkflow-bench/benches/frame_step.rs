//! Criterion benchmarks for whole frames of the CPU pipeline.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use inkflow_bench::{reference_profile, run_frames, stress_profile, warmed_scheduler};
use inkflow_engine::NullSink;

fn bench_frame_128(c: &mut Criterion) {
    let (mut scheduler, mut forcing) = warmed_scheduler(&reference_profile(), 10);

    c.bench_function("frame_128x128", |b| {
        b.iter(|| {
            let metrics = scheduler.step(&mut forcing, &mut NullSink).unwrap();
            black_box(metrics.total_us);
        });
    });
}

fn bench_frame_512(c: &mut Criterion) {
    let (mut scheduler, mut forcing) = warmed_scheduler(&stress_profile(), 1);

    let mut group = c.benchmark_group("stress");
    group.sample_size(10);
    group.bench_function("frame_512x512", |b| {
        b.iter(|| {
            let metrics = scheduler.step(&mut forcing, &mut NullSink).unwrap();
            black_box(metrics.total_us);
        });
    });
    group.finish();
}

fn bench_100_frames_128(c: &mut Criterion) {
    let mut group = c.benchmark_group("runs");
    group.sample_size(10);
    group.bench_function("100_frames_128x128", |b| {
        b.iter(|| {
            let (mut scheduler, mut forcing) = warmed_scheduler(&reference_profile(), 0);
            run_frames(&mut scheduler, &mut forcing, 100);
            black_box(scheduler.frame());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_frame_128, bench_frame_512, bench_100_frames_128);
criterion_main!(benches);
