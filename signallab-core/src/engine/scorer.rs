//! Scorer & filter: attach P(up) to the evaluation slice and keep tradable rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::EvaluationSlice;
use crate::domain::{DataQualityIssue, FeatureRow, IssueKind};
use crate::model::{Classifier, StandardScaler};

use super::error::EngineError;

/// Filter thresholds. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub volatility: f64,
    pub confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            volatility: 0.02,
            confidence: 0.7,
        }
    }
}

/// An evaluation row that passed both filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub row: &'a FeatureRow,
    pub predicted_probability_up: f64,
    pub volatility_ratio: f64,
}

impl ScoredCandidate<'_> {
    pub fn date(&self) -> NaiveDate {
        self.row.date
    }

    pub fn ticker(&self) -> &str {
        &self.row.ticker
    }

    pub fn forward_return(&self) -> Option<f64> {
        self.row.forward_return
    }
}

/// Scored candidates and the row issues found while scoring.
#[derive(Debug, Clone, Default)]
pub struct ScoreOutput<'a> {
    pub candidates: Vec<ScoredCandidate<'a>>,
    pub issues: Vec<DataQualityIssue>,
}

/// Volatility measure over close, or `None` when the close is unusable.
pub fn volatility_ratio(volatility_measure: f64, close_price: f64) -> Option<f64> {
    if !close_price.is_finite() || close_price <= 0.0 {
        return None;
    }
    Some(volatility_measure / close_price)
}

pub fn passes_volatility(ratio: f64, threshold: f64) -> bool {
    ratio > threshold
}

pub fn passes_confidence(probability_up: f64, threshold: f64) -> bool {
    probability_up > threshold
}

/// Score every row of the slice and keep those passing both filters.
///
/// Output keeps the slice order. Rows with an unusable close or volatility,
/// and repeated tickers after the first, are excluded and reported as
/// issues. A training feature missing from any row aborts.
pub fn score<'a, C: Classifier + ?Sized>(
    slice: &EvaluationSlice<'a>,
    feature_names: &[String],
    scaler: &StandardScaler,
    model: &C,
    thresholds: Thresholds,
) -> Result<ScoreOutput<'a>, EngineError> {
    let mut out = ScoreOutput::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(slice.len());

    for row in slice.rows {
        if !seen.insert(row.ticker.as_str()) {
            out.issues.push(DataQualityIssue::new(
                Some(row.date),
                Some(&row.ticker),
                IssueKind::DuplicateKey,
                "repeated ticker on evaluation date; first occurrence kept",
            ));
            continue;
        }

        let Some(ratio) = volatility_ratio(row.volatility_measure, row.close_price) else {
            out.issues.push(DataQualityIssue::new(
                Some(row.date),
                Some(&row.ticker),
                IssueKind::NonPositiveClose,
                format!("close = {}", row.close_price),
            ));
            continue;
        };
        if !row.volatility_measure.is_finite() || row.volatility_measure < 0.0 {
            out.issues.push(DataQualityIssue::new(
                Some(row.date),
                Some(&row.ticker),
                IssueKind::InvalidVolatility,
                format!("volatility = {}", row.volatility_measure),
            ));
            continue;
        }

        let raw = row
            .feature_vector(feature_names)
            .map_err(|feature| EngineError::MissingFeature {
                cutoff: slice.date,
                ticker: row.ticker.clone(),
                feature,
            })?;

        if !passes_volatility(ratio, thresholds.volatility) {
            continue;
        }
        let p = model.predict_proba(&scaler.transform(&raw));
        if passes_confidence(p, thresholds.confidence) {
            out.candidates.push(ScoredCandidate {
                row,
                predicted_probability_up: p,
                volatility_ratio: ratio,
            });
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureTable;
    use std::collections::BTreeMap;

    /// Classifier that returns the first scaled feature, clamped.
    struct Echo;

    impl Classifier for Echo {
        fn predict_proba(&self, features: &[f64]) -> f64 {
            features[0].clamp(0.0, 1.0)
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn identity_scaler() -> StandardScaler {
        // mean 0.5, std 0.5: maps x to 2x - 1
        StandardScaler::fit(&[vec![0.0], vec![1.0]]).unwrap()
    }

    /// Feature value that the identity scaler maps onto `p`.
    fn raw_for(p: f64) -> f64 {
        p * 0.5 + 0.5
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn row(ticker: &str, p: f64, close: f64, vol: f64) -> FeatureRow {
        FeatureRow {
            date: date(),
            ticker: ticker.into(),
            features: BTreeMap::from([("trend_p".to_string(), raw_for(p))]),
            label: 1,
            close_price: close,
            volatility_measure: vol,
            forward_return: Some(0.02),
        }
    }

    fn names() -> Vec<String> {
        vec!["trend_p".to_string()]
    }

    fn run(rows: Vec<FeatureRow>, thresholds: Thresholds) -> (Vec<(String, f64)>, Vec<IssueKind>) {
        let table = FeatureTable::new(rows, names());
        let slice = table.evaluation_slice(date());
        let out = score(&slice, &names(), &identity_scaler(), &Echo, thresholds).unwrap();
        (
            out.candidates
                .iter()
                .map(|c| (c.ticker().to_string(), c.predicted_probability_up))
                .collect(),
            out.issues.iter().map(|i| i.kind).collect(),
        )
    }

    #[test]
    fn predicates_are_strict() {
        assert!(passes_volatility(0.03, 0.02));
        assert!(!passes_volatility(0.02, 0.02));
        assert!(passes_confidence(0.85, 0.7));
        assert!(!passes_confidence(0.7, 0.7));
    }

    #[test]
    fn volatility_ratio_rejects_bad_close() {
        assert_eq!(volatility_ratio(3.0, 100.0), Some(0.03));
        assert_eq!(volatility_ratio(3.0, 0.0), None);
        assert_eq!(volatility_ratio(3.0, -5.0), None);
        assert_eq!(volatility_ratio(3.0, f64::NAN), None);
    }

    #[test]
    fn keeps_confident_volatile_rows_in_order() {
        let rows = vec![
            row("ZZZ", 0.9, 100.0, 3.0),
            row("AAA", 0.8, 100.0, 3.0),
            row("LOW", 0.6, 100.0, 3.0),
            row("CALM", 0.95, 100.0, 1.0),
        ];
        let (kept, issues) = run(rows, Thresholds::default());
        let tickers: Vec<&str> = kept.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tickers, vec!["ZZZ", "AAA"]);
        assert!((kept[0].1 - 0.9).abs() < 1e-12);
        assert!(issues.is_empty());
    }

    #[test]
    fn non_positive_close_is_an_issue() {
        let rows = vec![row("BAD", 0.9, 0.0, 3.0), row("OK", 0.9, 100.0, 3.0)];
        let (kept, issues) = run(rows, Thresholds::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(issues, vec![IssueKind::NonPositiveClose]);
    }

    #[test]
    fn negative_volatility_is_an_issue() {
        let (kept, issues) = run(vec![row("NEG", 0.9, 100.0, -1.0)], Thresholds::default());
        assert!(kept.is_empty());
        assert_eq!(issues, vec![IssueKind::InvalidVolatility]);
    }

    #[test]
    fn duplicate_ticker_keeps_first() {
        let rows = vec![row("DUP", 0.9, 100.0, 3.0), row("DUP", 0.99, 100.0, 3.0)];
        let (kept, issues) = run(rows, Thresholds::default());
        assert_eq!(kept.len(), 1);
        assert!((kept[0].1 - 0.9).abs() < 1e-12);
        assert_eq!(issues, vec![IssueKind::DuplicateKey]);
    }

    #[test]
    fn missing_feature_aborts() {
        let mut r = row("GAP", 0.9, 100.0, 3.0);
        r.features.clear();
        let table = FeatureTable::new(vec![r], names());
        let slice = table.evaluation_slice(date());
        let err = score(&slice, &names(), &identity_scaler(), &Echo, Thresholds::default())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingFeature {
                cutoff: date(),
                ticker: "GAP".into(),
                feature: "trend_p".into()
            }
        );
    }
}
