//! Backtest driver: the expanding-window, day-by-day walk-forward loop.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::FeatureTable;
use crate::domain::{DataQualityIssue, Ledger};
use crate::model::{Classifier, ForestConfig};

use super::error::EngineError;
use super::scorer::{score, Thresholds};
use super::simulator::simulate;
use super::trainer::fit;

/// What to do when a training window holds a single label class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    #[default]
    Abort,
    SkipDay,
}

/// Parameters of one walk-forward run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    /// Leading distinct dates never used as cutoffs.
    pub warmup_days: usize,
    pub initial_balance: f64,
    pub volatility_threshold: f64,
    pub confidence_threshold: f64,
    /// Fraction of the current balance committed per trade.
    pub position_fraction: f64,
    pub degenerate_policy: DegeneratePolicy,
    pub model: ForestConfig,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            warmup_days: 100,
            initial_balance: 100_000.0,
            volatility_threshold: 0.02,
            confidence_threshold: 0.7,
            position_fraction: 0.01,
            degenerate_policy: DegeneratePolicy::Abort,
            model: ForestConfig::default(),
        }
    }
}

impl BacktestParams {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            volatility: self.volatility_threshold,
            confidence: self.confidence_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if !(self.position_fraction > 0.0 && self.position_fraction <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "position_fraction must be in (0, 1], got {}",
                self.position_fraction
            )));
        }
        if !self.volatility_threshold.is_finite() {
            return Err(EngineError::InvalidConfig(
                "volatility_threshold must be finite".into(),
            ));
        }
        if !self.confidence_threshold.is_finite() {
            return Err(EngineError::InvalidConfig(
                "confidence_threshold must be finite".into(),
            ));
        }
        self.model
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }
}

/// Summary of one evaluated cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub training_rows: usize,
    pub evaluation_rows: usize,
    pub candidates: usize,
    pub trades: usize,
    pub balance_after_day: f64,
}

/// A cutoff skipped under `DegeneratePolicy::SkipDay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: String,
}

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub final_balance: f64,
    pub ledger: Ledger,
    pub days: Vec<DayReport>,
    pub data_quality: Vec<DataQualityIssue>,
    pub skipped_days: Vec<SkippedDay>,
}

impl BacktestOutcome {
    pub fn days_with_trades(&self) -> usize {
        self.days.iter().filter(|d| d.trades > 0).count()
    }
}

/// Run the walk-forward backtest over every date after the warmup.
///
/// Each cutoff trains a fresh model on rows strictly before it, scores that
/// date's rows, and books trades against the running balance. The first
/// structural failure aborts the run.
pub fn run(
    table: &FeatureTable,
    feature_names: &[String],
    params: &BacktestParams,
) -> Result<BacktestOutcome, EngineError> {
    params.validate()?;
    if feature_names.is_empty() {
        return Err(EngineError::InvalidConfig("no feature columns".into()));
    }

    let dates = table.distinct_dates();
    if dates.len() <= params.warmup_days {
        return Err(EngineError::InsufficientHistory {
            distinct_dates: dates.len(),
            warmup_days: params.warmup_days,
        });
    }
    let cutoffs = &dates[params.warmup_days..];
    info!(
        rows = table.len(),
        features = feature_names.len(),
        cutoffs = cutoffs.len(),
        first = %cutoffs[0],
        "starting walk-forward backtest"
    );

    let thresholds = params.thresholds();
    let mut balance = params.initial_balance;
    let mut ledger = Ledger::new(params.initial_balance);
    let mut days = Vec::with_capacity(cutoffs.len());
    let mut data_quality = Vec::new();
    let mut skipped_days = Vec::new();

    for &cutoff in cutoffs {
        let window = table.training_window(cutoff);
        let slice = table.evaluation_slice(cutoff);

        let fitted = match fit(&window, feature_names, &params.model) {
            Ok(f) => f,
            Err(err @ EngineError::DegenerateTrainingData { .. })
                if params.degenerate_policy == DegeneratePolicy::SkipDay =>
            {
                warn!(%cutoff, "skipping day: {err}");
                skipped_days.push(SkippedDay {
                    date: cutoff,
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        let scored = score(&slice, feature_names, &fitted.scaler, &fitted.forest, thresholds)?;
        for issue in &scored.issues {
            warn!("data quality: {issue}");
        }
        let (new_balance, trades) = simulate(&scored.candidates, balance, params.position_fraction);

        debug!(
            %cutoff,
            model = fitted.forest.name(),
            training_rows = window.len(),
            evaluation_rows = slice.len(),
            candidates = scored.candidates.len(),
            trades = trades.len(),
            balance = new_balance,
            "day complete"
        );

        days.push(DayReport {
            date: cutoff,
            training_rows: window.len(),
            evaluation_rows: slice.len(),
            candidates: scored.candidates.len(),
            trades: trades.len(),
            balance_after_day: new_balance,
        });
        data_quality.extend(scored.issues);
        ledger.append(trades);
        balance = new_balance;
    }

    info!(
        final_balance = balance,
        trades = ledger.len(),
        skipped = skipped_days.len(),
        issues = data_quality.len(),
        "walk-forward backtest complete"
    );

    Ok(BacktestOutcome {
        final_balance: balance,
        ledger,
        days,
        data_quality,
        skipped_days,
    })
}
