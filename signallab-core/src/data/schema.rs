use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column naming convention of the feature table.
///
/// Feature columns are not listed explicitly: every column whose name starts
/// with one of `feature_prefixes` is a feature, in file column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub date: String,
    pub ticker: String,
    pub label: String,
    pub close: String,
    pub volatility: String,
    pub forward_return: String,
    pub feature_prefixes: Vec<String>,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            date: "date".into(),
            ticker: "ticker".into(),
            label: "target".into(),
            close: "Close".into(),
            volatility: "volatility_atr".into(),
            forward_return: "future_return_5d".into(),
            feature_prefixes: vec![
                "volume_".into(),
                "trend_".into(),
                "momentum_".into(),
                "volatility_".into(),
                "others_".into(),
            ],
        }
    }
}

impl ColumnSchema {
    /// The non-feature columns every table must carry.
    pub fn required_columns(&self) -> [&str; 6] {
        [
            self.date.as_str(),
            self.ticker.as_str(),
            self.label.as_str(),
            self.close.as_str(),
            self.volatility.as_str(),
            self.forward_return.as_str(),
        ]
    }

    pub fn is_feature_column(&self, name: &str) -> bool {
        self.feature_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Feature columns among `columns`, preserving their order.
    pub fn select_feature_columns<'a, I>(&self, columns: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        columns
            .into_iter()
            .filter(|c| self.is_feature_column(c))
            .map(str::to_string)
            .collect()
    }

    /// Validate DataFrame against schema and return its feature columns.
    pub fn validate(&self, df: &DataFrame) -> Result<Vec<String>, SchemaError> {
        let schema = df.schema();
        for name in self.required_columns() {
            if !schema.contains(name) {
                return Err(SchemaError::MissingColumn(name.to_string()));
            }
        }

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        let features = self.select_feature_columns(names.iter().map(String::as_str));
        if features.is_empty() {
            return Err(SchemaError::NoFeatureColumns(self.feature_prefixes.clone()));
        }
        Ok(features)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("No feature columns match prefixes {0:?}")]
    NoFeatureColumns(Vec<String>),
}
