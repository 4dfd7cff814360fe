//! Performance benchmarks for the presence engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use presence_engine::crypto::{constant_time_eq, generate_code, verify_code};
use presence_engine::domain::{Coordinates, VenueSecret};
use presence_engine::verify::{haversine_distance_meters, score_location};

const T0: u64 = 1_700_000_010;

/// Benchmark rotating code generation
fn bench_generate_code(c: &mut Criterion) {
    let secret = VenueSecret::generate();

    c.bench_function("generate_code", |b| {
        b.iter(|| {
            black_box(generate_code(black_box(&secret), black_box(T0)));
        });
    });
}

/// Benchmark code verification (both accepted windows are always checked)
fn bench_verify_code(c: &mut Criterion) {
    let secret = VenueSecret::generate();
    let valid = generate_code(&secret, T0);

    let mut group = c.benchmark_group("verify_code");
    group.bench_function("valid", |b| {
        b.iter(|| {
            black_box(verify_code(black_box(&valid), &secret, T0));
        });
    });
    group.bench_function("invalid", |b| {
        b.iter(|| {
            black_box(verify_code(black_box("000000"), &secret, T0));
        });
    });
    group.finish();
}

/// Benchmark constant-time comparison across input sizes
fn bench_constant_time_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("constant_time_eq");

    for size in [6, 64, 1024].iter() {
        let a = vec![0x5au8; *size];
        let b = vec![0x5au8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("equal", size), size, |bench, _| {
            bench.iter(|| {
                black_box(constant_time_eq(black_box(&a), black_box(&b)));
            });
        });
    }

    group.finish();
}

/// Benchmark haversine distance and location scoring
fn bench_location_scoring(c: &mut Criterion) {
    let venue = Coordinates::new(37.5665, 126.978);
    let user = Coordinates::new(37.5670, 126.979);

    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            black_box(haversine_distance_meters(black_box(&user), black_box(&venue)));
        });
    });

    c.bench_function("score_location", |b| {
        b.iter(|| {
            black_box(score_location(black_box(&user), black_box(&venue), 100.0));
        });
    });
}

criterion_group!(
    benches,
    bench_generate_code,
    bench_verify_code,
    bench_constant_time_eq,
    bench_location_scoring
);
criterion_main!(benches);
