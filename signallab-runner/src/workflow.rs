//! Train-once / predict-daily workflow.
//!
//! `train_from_config` fits a bundle on every realized row of the configured
//! table and saves it. `predict_from_config` loads a bundle, scores the rows of
//! one date (the latest by default) and writes the filtered predictions.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use signallab_core::engine::{latest_rows, predict, train_model, EngineError, Prediction};
use signallab_core::model::{BundleError, ModelBundle};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_feature_table, LoadError};
use crate::export::{write_predictions, ExportError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("model bundle error: {0}")]
    Bundle(#[from] BundleError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("no rows dated {0} in the feature table")]
    NoRowsForDate(NaiveDate),
    #[error("bundle features do not match the table: missing {0:?}")]
    FeatureMismatch(Vec<String>),
}

/// Summary of a training run.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub model_path: PathBuf,
    pub training_rows: usize,
    pub trained_through: Option<NaiveDate>,
    pub feature_count: usize,
}

/// Summary of a prediction run.
#[derive(Debug, Clone)]
pub struct PredictSummary {
    pub date: Option<NaiveDate>,
    pub scored_rows: usize,
    pub predictions: Vec<Prediction>,
    pub output_path: PathBuf,
}

/// Fit a model on the configured table and save it to `model_path`.
pub fn train_from_config(
    config: &BacktestConfig,
    model_path: &Path,
) -> Result<TrainSummary, WorkflowError> {
    config.validate()?;
    let data = load_feature_table(&config.data.path, &config.data.columns)?;
    let bundle = train_model(&data.table, data.feature_names(), &config.model)?;
    bundle.save(model_path)?;

    info!(
        path = %model_path.display(),
        rows = bundle.training_rows,
        "model bundle saved"
    );
    Ok(TrainSummary {
        model_path: model_path.to_path_buf(),
        training_rows: bundle.training_rows,
        trained_through: bundle.trained_through,
        feature_count: bundle.feature_names.len(),
    })
}

/// Score one date of the configured table with a saved bundle.
///
/// With `date = None` the table's most recent date is used. Thresholds come
/// from the config's `[backtest]` section.
pub fn predict_from_config(
    config: &BacktestConfig,
    bundle_path: &Path,
    output_path: &Path,
    date: Option<NaiveDate>,
) -> Result<PredictSummary, WorkflowError> {
    config.validate()?;
    let bundle = ModelBundle::load(bundle_path)?;
    let data = load_feature_table(&config.data.path, &config.data.columns)?;

    let missing: Vec<String> = bundle
        .feature_names
        .iter()
        .filter(|name| !data.feature_names().contains(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(WorkflowError::FeatureMismatch(missing));
    }

    let rows = match date {
        Some(d) => {
            let slice = data.table.evaluation_slice(d).rows;
            if slice.is_empty() {
                return Err(WorkflowError::NoRowsForDate(d));
            }
            slice
        }
        None => latest_rows(&data.table),
    };
    let scored_date = rows.first().map(|r| r.date);

    let output = predict(&bundle, rows, config.params().thresholds())?;
    for issue in &output.issues {
        warn!("data quality: {issue}");
    }
    write_predictions(output_path, &output.predictions)?;

    info!(
        date = ?scored_date,
        scored = rows.len(),
        selected = output.predictions.len(),
        path = %output_path.display(),
        "predictions written"
    );
    Ok(PredictSummary {
        date: scored_date,
        scored_rows: rows.len(),
        predictions: output.predictions,
        output_path: output_path.to_path_buf(),
    })
}
