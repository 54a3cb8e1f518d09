//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Accounting identity: every simulated ledger passes `verify()`
//! 2. Compounding: the closing balance is the product of per-trade growth factors
//! 3. Filter monotonicity: a higher confidence threshold never adds candidates
//! 4. Scaler: transformed training columns have zero mean

use chrono::NaiveDate;
use proptest::prelude::*;
use signallab_core::data::FeatureTable;
use signallab_core::domain::{FeatureRow, Ledger};
use signallab_core::engine::{score, simulate, ScoredCandidate, Thresholds};
use signallab_core::model::{Classifier, StandardScaler};
use std::collections::BTreeMap;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_forward_return() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        4 => (-0.3..0.3_f64).prop_map(Some),
        1 => Just(None),
    ]
}

fn arb_fraction() -> impl Strategy<Value = f64> {
    0.001..1.0_f64
}

fn arb_balance() -> impl Strategy<Value = f64> {
    1_000.0..1_000_000.0_f64
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

fn rows_with(returns: &[Option<f64>], probs: &[f64]) -> Vec<FeatureRow> {
    returns
        .iter()
        .zip(probs)
        .enumerate()
        .map(|(i, (fwd, p))| FeatureRow {
            date: date(),
            ticker: format!("T{i:03}"),
            features: BTreeMap::from([("momentum_p".to_string(), *p)]),
            label: 1,
            close_price: 100.0,
            volatility_measure: 5.0,
            forward_return: *fwd,
        })
        .collect()
}

fn candidates(rows: &[FeatureRow]) -> Vec<ScoredCandidate<'_>> {
    rows.iter()
        .map(|row| ScoredCandidate {
            row,
            predicted_probability_up: 0.9,
            volatility_ratio: 0.05,
        })
        .collect()
}

/// Reads back the raw feature through a scaler fitted on {0, 1} (x -> 2x - 1).
struct Passthrough;

impl Classifier for Passthrough {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        ((features[0] + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

// ── 1. Accounting Identity ───────────────────────────────────────────

proptest! {
    #[test]
    fn simulated_ledger_verifies(
        returns in prop::collection::vec(arb_forward_return(), 0..40),
        fraction in arb_fraction(),
        balance in arb_balance(),
    ) {
        let probs = vec![0.9; returns.len()];
        let rows = rows_with(&returns, &probs);
        let (closing, trades) = simulate(&candidates(&rows), balance, fraction);

        prop_assert_eq!(trades.len(), returns.iter().filter(|r| r.is_some()).count());
        let mut ledger = Ledger::new(balance);
        ledger.append(trades);
        prop_assert!(ledger.verify().is_ok());
        prop_assert_eq!(ledger.final_balance(), closing);
    }
}

// ── 2. Compounding ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn closing_balance_is_product_of_growth_factors(
        returns in prop::collection::vec(arb_forward_return(), 1..20),
        fraction in arb_fraction(),
        balance in arb_balance(),
    ) {
        let probs = vec![0.9; returns.len()];
        let rows = rows_with(&returns, &probs);
        let (closing, trades) = simulate(&candidates(&rows), balance, fraction);

        let expected = returns
            .iter()
            .flatten()
            .fold(balance, |b, r| b * (1.0 + fraction * r));
        prop_assert!((closing - expected).abs() <= 1e-9 * expected.abs().max(1.0));

        for t in &trades {
            prop_assert!((t.position_size - t.balance_before() * fraction).abs() <= 1e-6);
        }
    }
}

// ── 3. Filter Monotonicity ───────────────────────────────────────────

proptest! {
    #[test]
    fn raising_confidence_never_adds_candidates(
        probs in prop::collection::vec(0.0..1.0_f64, 1..30),
        low in 0.0..1.0_f64,
        bump in 0.0..0.5_f64,
    ) {
        let returns = vec![Some(0.01); probs.len()];
        let rows = rows_with(&returns, &probs);
        let table = FeatureTable::new(rows, vec!["momentum_p".to_string()]);
        let slice = table.evaluation_slice(date());
        let names = table.feature_names().to_vec();
        let scaler = StandardScaler::fit(&[vec![0.0], vec![1.0]]).unwrap();

        let at = |confidence: f64| {
            let thresholds = Thresholds { volatility: 0.02, confidence };
            score(&slice, &names, &scaler, &Passthrough, thresholds)
                .unwrap()
                .candidates
                .iter()
                .map(|c| c.ticker().to_string())
                .collect::<Vec<_>>()
        };
        let loose = at(low);
        let strict = at(low + bump);

        prop_assert!(strict.len() <= loose.len());
        prop_assert!(strict.iter().all(|t| loose.contains(t)));
    }
}

// ── 4. Scaler ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn scaled_columns_are_centred(
        rows in prop::collection::vec(prop::collection::vec(-1e3..1e3_f64, 3), 2..50),
    ) {
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform_all(&rows);
        for j in 0..3 {
            let mean = scaled.iter().map(|r| r[j]).sum::<f64>() / scaled.len() as f64;
            prop_assert!(mean.abs() < 1e-6, "column {} mean {}", j, mean);
        }
    }
}
