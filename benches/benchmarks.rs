//! Benchmarks for psquare
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use psquare::quantiles::{estimate, P2State, PSquare, Targets};
use psquare::traits::QuantileSketch;

/// Deterministic pseudo-random values in [0, 1)
fn values(n: usize) -> Vec<f64> {
    let mut x = 0x853c49e6748fea9bu64;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

// ============================================================================
// P2State Benchmarks
// ============================================================================

fn bench_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("p2_state");
    group.throughput(Throughput::Elements(1));

    let data = values(4096);

    group.bench_function("observe", |b| {
        let mut state = P2State::new([0.1, 0.3, 0.5, 0.7, 0.9], Targets::default());
        let mut i = 0usize;
        b.iter(|| {
            state = state.observe(black_box(data[i & 4095]));
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("estimates", |b| {
        let state = P2State::new([0.1, 0.3, 0.5, 0.7, 0.9], Targets::default())
            .observe_all(data.iter().copied());
        b.iter(|| black_box(state.estimates()));
    });

    group.finish();
}

// ============================================================================
// PSquare Benchmarks
// ============================================================================

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("psquare");
    group.throughput(Throughput::Elements(1));

    for p in [0.5, 0.9, 0.99] {
        group.bench_function(format!("add_p{}", p), |b| {
            let mut estimator = PSquare::with_quantile(p).unwrap();
            let mut i = 0u64;
            b.iter(|| {
                estimator.add(black_box(i as f64));
                i = i.wrapping_add(1);
            });
        });
    }

    group.bench_function("quantile", |b| {
        let mut estimator = PSquare::default();
        for v in values(100_000) {
            estimator.add(v);
        }
        b.iter(|| black_box(estimator.quantile(0.42)));
    });

    group.finish();
}

// ============================================================================
// Batch Benchmarks
// ============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");

    for size in [1_000usize, 100_000] {
        let data = values(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(estimate(data, 0.5).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_state, bench_streaming, bench_batch);
criterion_main!(benches);
