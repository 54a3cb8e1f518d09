//! Criterion benchmarks for the runner.
//!
//! Run with: `cargo bench -p signallab-runner`
//!
//! - Ledger metrics over growing trade counts
//! - A 4-point threshold sweep, serial vs parallel

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use signallab_core::data::FeatureTable;
use signallab_core::domain::{FeatureRow, Ledger, Trade};
use signallab_core::engine::BacktestParams;
use signallab_core::model::ForestConfig;
use signallab_runner::{LoadedData, ParamSweep, PerformanceMetrics, SweepGrid};

fn make_ledger(n: usize) -> Ledger {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let mut balance = 100_000.0;
    let trades: Vec<Trade> = (0..n)
        .map(|i| {
            let r = ((i * 13) as f64 * 0.37).sin() * 0.03;
            let size = balance * 0.01;
            let profit = size * r;
            balance += profit;
            Trade {
                date: base + chrono::Duration::days((i / 3) as i64),
                ticker: format!("SYM{}", i % 3),
                predicted_probability_up: 0.8,
                forward_return: r,
                position_size: size,
                profit,
                balance_after: balance,
            }
        })
        .collect();
    let mut ledger = Ledger::new(100_000.0);
    ledger.append(trades);
    ledger
}

fn make_data(n_dates: usize, n_tickers: usize) -> LoadedData {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let names = vec!["trend_a".to_string(), "momentum_b".to_string()];
    let mut rows = Vec::with_capacity(n_dates * n_tickers);
    for d in 0..n_dates {
        for t in 0..n_tickers {
            let a = ((d * 31 + t * 17) as f64 * 0.07).sin();
            let b = ((d * 11 + t * 5) as f64 * 0.13).cos();
            let fwd = 0.02 * a;
            rows.push(FeatureRow {
                date: base + chrono::Duration::days(d as i64),
                ticker: format!("SYM{t}"),
                features: BTreeMap::from([(names[0].clone(), a), (names[1].clone(), b)]),
                label: u8::from(fwd > 0.0),
                close_price: 100.0,
                volatility_measure: 3.0,
                forward_return: Some(fwd),
            });
        }
    }
    LoadedData::from_table(FeatureTable::new(rows, names), "bench")
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics_compute");
    for n in [100, 1_000, 10_000] {
        let ledger = make_ledger(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ledger, |b, ledger| {
            b.iter(|| PerformanceMetrics::compute(black_box(ledger)));
        });
    }
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_4_points");
    group.sample_size(10);

    let data = make_data(60, 8);
    let base = BacktestParams {
        warmup_days: 20,
        model: ForestConfig {
            n_trees: 20,
            max_depth: 5,
            ..ForestConfig::default()
        },
        ..BacktestParams::default()
    };
    let grid = SweepGrid {
        confidence_thresholds: vec![0.6, 0.7],
        volatility_thresholds: vec![0.01, 0.02],
        position_fractions: Vec::new(),
        parallel: true,
    };

    for parallel in [false, true] {
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            b.iter(|| {
                ParamSweep::new()
                    .with_parallelism(parallel)
                    .sweep(black_box(&grid), &base, &data)
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_metrics, bench_sweep);
criterion_main!(benches);
