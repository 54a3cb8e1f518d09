//! Backtest runner: wires together data loading, the engine, and metrics.
//!
//! Two entry points:
//! - `run_from_config()`: loads the configured table, then runs. Used by CLI.
//! - `run_backtest_from_data()`: takes pre-loaded data. Used by sweeps.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use signallab_core::domain::{DataQualityIssue, Ledger, LedgerError};
use signallab_core::engine::{run, BacktestParams, DayReport, EngineError, SkippedDay};
use signallab_core::fingerprint::{params_hash, RunFingerprint};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_feature_table, LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("ledger check failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub fingerprint: RunFingerprint,
    pub final_balance: f64,
    pub metrics: PerformanceMetrics,
    pub ledger: Ledger,
    pub days: Vec<DayReport>,
    /// Ingestion issues followed by issues found while scoring.
    pub data_quality: Vec<DataQualityIssue>,
    pub skipped_days: Vec<SkippedDay>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the configured table and run one backtest.
pub fn run_from_config(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let data = load_feature_table(&config.data.path, &config.data.columns)?;
    run_backtest_from_data(&data, &config.params())
}

/// Run a backtest with pre-loaded data, no I/O.
///
/// The ledger's accounting identity is re-checked before metrics are computed.
pub fn run_backtest_from_data(
    data: &LoadedData,
    params: &BacktestParams,
) -> Result<BacktestResult, RunError> {
    let outcome = run(&data.table, data.feature_names(), params)?;
    outcome.ledger.verify()?;

    let config_hash = params_hash(params).map_err(ConfigError::from)?;
    let fingerprint = RunFingerprint::new(
        &data.table,
        params,
        config_hash,
        data.dataset_hash.clone(),
        chrono::Utc::now().naive_utc(),
    );

    let metrics = PerformanceMetrics::compute(&outcome.ledger);
    info!(
        run_id = %fingerprint.run_id.short(),
        final_balance = outcome.final_balance,
        total_return = metrics.total_return,
        trades = metrics.trade_count,
        "backtest finished"
    );

    let mut data_quality = data.issues.clone();
    data_quality.extend(outcome.data_quality);

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        fingerprint,
        final_balance: outcome.final_balance,
        metrics,
        ledger: outcome.ledger,
        days: outcome.days,
        data_quality,
        skipped_days: outcome.skipped_days,
    })
}
