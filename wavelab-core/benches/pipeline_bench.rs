//! Criterion benchmarks for the WaveLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator precompute (full `compute_indicators` stage stack)
//! 2. Nadaraya-Watson kernel, centered vs causal
//! 3. Entry/exit fusion over a precomputed frame
//! 4. Multi-timeframe evaluation on 1m bars

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wavelab_core::domain::{Bar, PriceSeries, Timeframe};
use wavelab_core::indicators::{nadaraya_watson, KernelMode};
use wavelab_core::ml::EvaluationContext;
use wavelab_core::mtf::compute_mtf;
use wavelab_core::params::StrategyParameters;
use wavelab_core::strategy::{compute_entry_signal, compute_exit_signal, compute_indicators};

// ── Helpers ──────────────────────────────────────────────────────────

/// Seeded random walk on 1m bars.
fn random_walk(n: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut close = 100.0_f64;
    let bars = (0..n)
        .map(|i| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.004..0.004);
            let spread = rng.gen_range(0.0..0.002);
            Bar {
                timestamp: start + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) * (1.0 + spread),
                low: open.min(close) * (1.0 - spread),
                close,
                volume: rng.gen_range(500.0..1500.0),
            }
        })
        .collect();
    PriceSeries::new("BENCH", Timeframe::M1, bars).unwrap()
}

// ── 1. Indicator precompute ──────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");
    let params = StrategyParameters::default();

    for bar_count in [500, 5_000] {
        let series = random_walk(bar_count, 7);
        group.bench_with_input(
            BenchmarkId::new("full_pipeline", bar_count),
            &series,
            |b, s| b.iter(|| compute_indicators(black_box(s), &params).unwrap()),
        );
    }

    group.finish();
}

// ── 2. Kernel smoother ───────────────────────────────────────────────

fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("nadaraya_watson");
    let closes = random_walk(5_000, 11).closes();

    for (label, mode) in [("centered", KernelMode::Centered), ("causal", KernelMode::Causal)] {
        group.bench_function(label, |b| {
            b.iter(|| nadaraya_watson(black_box(&closes), 3.5, 25, 1.2, mode))
        });
    }

    group.finish();
}

// ── 3. Signal fusion ─────────────────────────────────────────────────

fn bench_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_fusion");
    let params = StrategyParameters::default();
    let ctx = EvaluationContext::new();
    let frame = compute_indicators(&random_walk(5_000, 13), &params).unwrap();

    group.bench_function("entry_5000", |b| {
        b.iter(|| compute_entry_signal(black_box(&frame), &params, &ctx).unwrap())
    });
    group.bench_function("exit_5000", |b| {
        b.iter(|| compute_exit_signal(black_box(&frame), &params).unwrap())
    });

    group.finish();
}

// ── 4. Multi-timeframe ───────────────────────────────────────────────

fn bench_mtf(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_timeframe");
    group.sample_size(20);
    let params = StrategyParameters::default();
    let series = random_walk(6_000, 17);

    group.bench_function("mtf_6000_1m", |b| {
        b.iter(|| compute_mtf(black_box(&series), &params).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_kernel, bench_fusion, bench_mtf);
criterion_main!(benches);
