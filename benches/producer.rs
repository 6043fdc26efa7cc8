//! Benchmarks for blockprof producer paths.
//!
//! Run with: cargo bench

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use blockprof::{ProfileConfig, Profiler};

fn bench_config() -> ProfileConfig {
    ProfileConfig::default()
        .with_blocks(65535)
        .with_output_wait(Duration::from_millis(1))
}

fn bench_scopes(c: &mut Criterion) {
    // No sink: the drain recycles records without serializing them, so the
    // numbers isolate producer cost.
    let profiler = Profiler::new(bench_config());
    profiler.enable(true);

    let mut group = c.benchmark_group("scopes");
    group.throughput(Throughput::Elements(1));

    group.bench_function("begin_end", |b| {
        b.iter(|| {
            profiler.begin_block(black_box("bench"));
            profiler.end_block();
        })
    });

    group.bench_function("begin_end_nested_4", |b| {
        b.iter(|| {
            for _ in 0..4 {
                profiler.begin_block(black_box("nested"));
            }
            for _ in 0..4 {
                profiler.end_block();
            }
        })
    });

    group.bench_function("scope_guard", |b| {
        b.iter(|| {
            let _scope = profiler.scope(black_box("guarded"));
        })
    });

    group.finish();
    profiler.finalize();
}

fn bench_events(c: &mut Criterion) {
    let profiler = Profiler::new(bench_config());
    profiler.enable(true);

    let mut group = c.benchmark_group("events");
    group.throughput(Throughput::Elements(1));

    group.bench_function("log_short", |b| {
        b.iter(|| profiler.log(black_box("short message")))
    });

    group.bench_function("log_split_3", |b| {
        b.iter(|| profiler.log(black_box("a message long enough to span three records")))
    });

    group.bench_function("end_frame", |b| {
        let mut frame = 0u64;
        b.iter(|| {
            frame += 1;
            profiler.end_frame(black_box(frame));
        })
    });

    group.finish();
    profiler.finalize();
}

criterion_group!(benches, bench_scopes, bench_events);
criterion_main!(benches);
