//! Structural failures of a walk-forward run.
//!
//! Row-level problems are `DataQualityIssue`s and never reach this type.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("insufficient history: {distinct_dates} distinct dates, need more than {warmup_days}")]
    InsufficientHistory {
        distinct_dates: usize,
        warmup_days: usize,
    },

    #[error("degenerate training data before {cutoff}: {rows} rows, {positives} positive")]
    DegenerateTrainingData {
        cutoff: NaiveDate,
        rows: usize,
        positives: usize,
    },

    #[error("empty training window before {cutoff}")]
    EmptyTrainingWindow { cutoff: NaiveDate },

    #[error("feature '{feature}' missing for {ticker} on {cutoff}")]
    MissingFeature {
        cutoff: NaiveDate,
        ticker: String,
        feature: String,
    },

    #[error("model fit failed before {cutoff}: {source}")]
    Model {
        cutoff: NaiveDate,
        source: ModelError,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Cutoff date the failure is attached to, if any.
    pub fn cutoff(&self) -> Option<NaiveDate> {
        match self {
            EngineError::DegenerateTrainingData { cutoff, .. }
            | EngineError::EmptyTrainingWindow { cutoff }
            | EngineError::MissingFeature { cutoff, .. }
            | EngineError::Model { cutoff, .. } => Some(*cutoff),
            EngineError::InsufficientHistory { .. } | EngineError::InvalidConfig(_) => None,
        }
    }
}
