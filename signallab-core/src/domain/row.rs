//! FeatureRow: one ticker on one date, as delivered by the feature table provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single daily per-ticker row of the feature table.
///
/// Rows are immutable once ingested. `forward_return` is `None` when the
/// future horizon has not been realized yet (the last few dates of a table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub ticker: String,
    /// Named numeric features. `BTreeMap` keeps hashing and serialization deterministic.
    pub features: BTreeMap<String, f64>,
    /// Binary label: 1 if the forward return was positive, else 0.
    pub label: u8,
    pub close_price: f64,
    pub volatility_measure: f64,
    pub forward_return: Option<f64>,
}

impl FeatureRow {
    /// Look up a feature by name.
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    pub fn is_positive(&self) -> bool {
        self.label == 1
    }

    /// Extract feature values in the given order.
    ///
    /// Returns the name of the first missing feature on failure.
    pub fn feature_vector(&self, feature_names: &[String]) -> Result<Vec<f64>, String> {
        feature_names
            .iter()
            .map(|name| self.feature(name).ok_or_else(|| name.clone()))
            .collect()
    }
}
