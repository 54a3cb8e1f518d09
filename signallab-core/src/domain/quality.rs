//! Row-level data quality issues. Recorded and excluded, never fatal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What was wrong with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Close price was zero, negative or not finite.
    NonPositiveClose,
    /// Volatility measure was negative or not finite.
    InvalidVolatility,
    /// A required field (other than the forward return) was null or unparsable.
    MissingField,
    /// Label was not 0 or 1.
    InvalidLabel,
    /// The same ticker appeared more than once on one date.
    DuplicateKey,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::NonPositiveClose => "non_positive_close",
            IssueKind::InvalidVolatility => "invalid_volatility",
            IssueKind::MissingField => "missing_field",
            IssueKind::InvalidLabel => "invalid_label",
            IssueKind::DuplicateKey => "duplicate_key",
        };
        f.write_str(s)
    }
}

/// A recorded data quality problem. `date`/`ticker` are `None` when the
/// offending field itself could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub date: Option<NaiveDate>,
    pub ticker: Option<String>,
    pub kind: IssueKind,
    pub detail: String,
}

impl DataQualityIssue {
    pub fn new(
        date: Option<NaiveDate>,
        ticker: Option<&str>,
        kind: IssueKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            date,
            ticker: ticker.map(str::to_string),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".into());
        let ticker = self.ticker.as_deref().unwrap_or("?");
        write!(f, "{date} {ticker}: {} ({})", self.kind, self.detail)
    }
}
