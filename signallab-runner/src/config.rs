//! TOML backtest configuration.
//!
//! ```toml
//! [data]
//! path = "data/features.parquet"
//!
//! [data.columns]
//! forward_return = "future_return_5d"
//!
//! [backtest]
//! warmup_days = 100
//! confidence_threshold = 0.7
//!
//! [model]
//! n_trees = 200
//!
//! [sweep]
//! confidence_thresholds = [0.6, 0.7, 0.8]
//! ```
//!
//! Every field has a default; only `data.path` is required in practice.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use signallab_core::data::ColumnSchema;
use signallab_core::domain::ConfigHash;
use signallab_core::engine::{BacktestParams, DegeneratePolicy};
use signallab_core::fingerprint::params_hash;
use signallab_core::model::ForestConfig;

use crate::sweep::SweepGrid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Input table location and column mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub path: PathBuf,
    pub columns: ColumnSchema,
}

/// Walk-forward and simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub warmup_days: usize,
    pub initial_balance: f64,
    pub volatility_threshold: f64,
    pub confidence_threshold: f64,
    pub position_fraction: f64,
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for BacktestSection {
    fn default() -> Self {
        let p = BacktestParams::default();
        Self {
            warmup_days: p.warmup_days,
            initial_balance: p.initial_balance,
            volatility_threshold: p.volatility_threshold,
            confidence_threshold: p.confidence_threshold,
            position_fraction: p.position_fraction,
            degenerate_policy: p.degenerate_policy,
        }
    }
}

/// Where artifacts and model bundles go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

/// Complete configuration of a run, sweep, or train/predict workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub data: DataSection,
    pub backtest: BacktestSection,
    pub model: ForestConfig,
    pub output: OutputSection,
    pub sweep: SweepGrid,
}

impl BacktestConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Engine parameters assembled from `[backtest]` and `[model]`.
    pub fn params(&self) -> BacktestParams {
        BacktestParams {
            warmup_days: self.backtest.warmup_days,
            initial_balance: self.backtest.initial_balance,
            volatility_threshold: self.backtest.volatility_threshold,
            confidence_threshold: self.backtest.confidence_threshold,
            position_fraction: self.backtest.position_fraction,
            degenerate_policy: self.backtest.degenerate_policy,
            model: self.model,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.columns.feature_prefixes.is_empty() {
            return Err(ConfigError::Invalid(
                "data.columns.feature_prefixes must not be empty".into(),
            ));
        }
        self.params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.sweep.validate().map_err(ConfigError::Invalid)
    }

    /// BLAKE3 over the canonical JSON of the engine parameters.
    ///
    /// Paths and output locations do not affect results and are excluded.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        Ok(params_hash(&self.params())?)
    }
}
