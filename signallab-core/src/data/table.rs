//! In-memory feature table and its per-cutoff views.
//!
//! Rows are stably sorted by date on construction, so for any cutoff the
//! training window is a prefix of the row slice and the evaluation slice is
//! the contiguous run of rows dated exactly on the cutoff. Neither view can
//! contain a row dated after the cutoff.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::FeatureRow;

/// A fully materialized, date-ordered feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    feature_names: Vec<String>,
}

impl FeatureTable {
    /// Build a table. Rows are stably sorted by date; rows sharing a date keep
    /// their input order.
    pub fn new(mut rows: Vec<FeatureRow>, feature_names: Vec<String>) -> Self {
        rows.sort_by_key(|r| r.date);
        Self {
            rows,
            feature_names,
        }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Feature columns in their canonical training order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dates present in the table, ascending.
    pub fn distinct_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.dedup();
        dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// All rows with `date < cutoff`.
    pub fn training_window(&self, cutoff: NaiveDate) -> TrainingWindow<'_> {
        let end = self.rows.partition_point(|r| r.date < cutoff);
        TrainingWindow {
            cutoff,
            rows: &self.rows[..end],
        }
    }

    /// All rows with `date == cutoff`, in table order.
    pub fn evaluation_slice(&self, cutoff: NaiveDate) -> EvaluationSlice<'_> {
        let start = self.rows.partition_point(|r| r.date < cutoff);
        let end = self.rows.partition_point(|r| r.date <= cutoff);
        EvaluationSlice {
            date: cutoff,
            rows: &self.rows[start..end],
        }
    }
}

/// Rows strictly before a cutoff date.
#[derive(Debug, Clone, Copy)]
pub struct TrainingWindow<'a> {
    pub cutoff: NaiveDate,
    pub rows: &'a [FeatureRow],
}

impl<'a> TrainingWindow<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows labelled 1.
    pub fn positives(&self) -> usize {
        self.rows.iter().filter(|r| r.is_positive()).count()
    }

    /// Latest date present in the window.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Rows dated exactly on a cutoff date.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationSlice<'a> {
    pub date: NaiveDate,
    pub rows: &'a [FeatureRow],
}

impl<'a> EvaluationSlice<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(day: u32, ticker: &str, label: u8) -> FeatureRow {
        let mut features = BTreeMap::new();
        features.insert("momentum_x".to_string(), day as f64);
        FeatureRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ticker: ticker.into(),
            features,
            label,
            close_price: 10.0,
            volatility_measure: 0.5,
            forward_return: Some(0.01),
        }
    }

    fn table() -> FeatureTable {
        // Deliberately unsorted input
        FeatureTable::new(
            vec![
                row(3, "B", 1),
                row(1, "A", 0),
                row(2, "A", 1),
                row(3, "A", 0),
                row(1, "B", 1),
            ],
            vec!["momentum_x".into()],
        )
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn rows_sorted_stably_by_date() {
        let t = table();
        let keys: Vec<(u32, &str)> = t
            .rows()
            .iter()
            .map(|r| (chrono::Datelike::day(&r.date), r.ticker.as_str()))
            .collect();
        assert_eq!(keys, vec![(1, "A"), (1, "B"), (2, "A"), (3, "B"), (3, "A")]);
    }

    #[test]
    fn distinct_dates_ascending() {
        assert_eq!(table().distinct_dates(), vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn training_window_is_strictly_before_cutoff() {
        let t = table();
        let window = t.training_window(d(3));
        assert_eq!(window.len(), 3);
        assert!(window.rows.iter().all(|r| r.date < d(3)));
        assert_eq!(window.positives(), 2);
        assert_eq!(window.last_date(), Some(d(2)));
    }

    #[test]
    fn training_window_before_first_date_is_empty() {
        assert!(table().training_window(d(1)).is_empty());
    }

    #[test]
    fn evaluation_slice_keeps_input_order() {
        let t = table();
        let slice = t.evaluation_slice(d(3));
        let tickers: Vec<&str> = slice.rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["B", "A"]);
    }

    #[test]
    fn evaluation_slice_for_absent_date_is_empty() {
        assert!(table().evaluation_slice(d(9)).is_empty());
    }
}
