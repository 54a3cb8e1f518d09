//! SignalLab Runner: backtest orchestration, sweeps, metrics and artifacts.
//!
//! This crate builds on `signallab-core` to provide:
//! - TOML configuration with validation and a stable config hash
//! - Feature table loading with data quality reporting
//! - Single-backtest runner with ledger verification and metrics
//! - Parameter sweeps over filter thresholds, serial or parallel
//! - CSV/JSON artifact export
//! - Train-once / predict-daily model workflow

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod workflow;

pub use config::{BacktestConfig, BacktestSection, ConfigError, DataSection, OutputSection};
pub use data_loader::{load_feature_table, LoadError, LoadedData};
pub use export::{
    export_days_csv, export_ledger_csv, export_manifest_json, export_predictions_csv,
    import_ledger_csv, import_manifest_json, load_manifest, save_artifacts, write_predictions,
    ExportError, Manifest,
};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest_from_data, run_from_config, BacktestResult, RunError, SCHEMA_VERSION};
pub use sweep::{ParamSweep, SweepGrid, SweepPoint, SweepResults};
pub use workflow::{
    predict_from_config, train_from_config, PredictSummary, TrainSummary, WorkflowError,
};
