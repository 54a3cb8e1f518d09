//! Artifact export: CSV tables and a JSON manifest per run.
//!
//! A run directory `{output_dir}/{run_id}/` holds:
//! - `ledger.csv`: one row per trade, in simulation order
//! - `days.csv`: one row per evaluated cutoff
//! - `manifest.json`: identity, hashes, metrics, issues and skipped days
//!
//! The manifest carries a `schema_version`. Unknown versions are rejected on load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use signallab_core::domain::{ConfigHash, DataQualityIssue, DatasetHash, Trade};
use signallab_core::engine::{BacktestParams, DayReport, Prediction, SkippedDay};

use crate::metrics::PerformanceMetrics;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8,

    #[error("unsupported schema version {found} (max supported: {SCHEMA_VERSION})")]
    SchemaVersion { found: u32 },
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Ledger columns: date, ticker, predicted_probability_up, forward_return,
/// profit, balance_after.
pub fn export_ledger_csv(trades: &[Trade]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "ticker",
        "predicted_probability_up",
        "forward_return",
        "profit",
        "balance_after",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.date.to_string(),
            &t.ticker,
            &t.predicted_probability_up.to_string(),
            &t.forward_return.to_string(),
            &t.profit.to_string(),
            &t.balance_after.to_string(),
        ])?;
    }
    finish(wtr)
}

pub fn export_days_csv(days: &[DayReport]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for d in days {
        wtr.serialize(d)?;
    }
    finish(wtr)
}

/// Prediction columns: date, ticker, predicted_probability_up, close_price.
pub fn export_predictions_csv(predictions: &[Prediction]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "ticker", "predicted_probability_up", "close_price"])?;
    for p in predictions {
        wtr.write_record([
            &p.date.to_string(),
            &p.ticker,
            &p.predicted_probability_up.to_string(),
            &p.close_price.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Parse a ledger CSV written by `export_ledger_csv`.
///
/// `position_size` is not part of the ledger columns and is rebuilt as
/// `profit / forward_return` (0 when the return is 0).
pub fn import_ledger_csv(csv_text: &str) -> Result<Vec<Trade>, ExportError> {
    #[derive(Deserialize)]
    struct Row {
        date: chrono::NaiveDate,
        ticker: String,
        predicted_probability_up: f64,
        forward_return: f64,
        profit: f64,
        balance_after: f64,
    }

    let mut rdr = csv::Reader::from_reader(csv_text.as_bytes());
    rdr.deserialize::<Row>()
        .map(|row| {
            let r = row?;
            let position_size = if r.forward_return == 0.0 {
                0.0
            } else {
                r.profit / r.forward_return
            };
            Ok(Trade {
                date: r.date,
                ticker: r.ticker,
                predicted_probability_up: r.predicted_probability_up,
                forward_return: r.forward_return,
                position_size,
                profit: r.profit,
                balance_after: r.balance_after,
            })
        })
        .collect()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

// ─── Manifest ───────────────────────────────────────────────────────

/// Summary of a run persisted as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub run_id: String,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub created_at: chrono::NaiveDateTime,
    pub params: BacktestParams,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub metrics: PerformanceMetrics,
    pub days_evaluated: usize,
    pub trade_count: usize,
    pub data_quality: Vec<DataQualityIssue>,
    pub skipped_days: Vec<SkippedDay>,
}

impl Manifest {
    pub fn from_result(result: &BacktestResult) -> Self {
        let fp = &result.fingerprint;
        Self {
            schema_version: result.schema_version,
            run_id: fp.run_id.hash(),
            config_hash: fp.config_hash.clone(),
            dataset_hash: fp.dataset_hash.clone(),
            created_at: fp.timestamp,
            params: fp.params.clone(),
            initial_balance: result.ledger.initial_balance(),
            final_balance: result.final_balance,
            metrics: result.metrics.clone(),
            days_evaluated: result.days.len(),
            trade_count: result.ledger.len(),
            data_quality: result.data_quality.clone(),
            skipped_days: result.skipped_days.clone(),
        }
    }
}

pub fn export_manifest_json(manifest: &Manifest) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(manifest)?)
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<Manifest, ExportError> {
    let manifest: Manifest = serde_json::from_str(json)?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(ExportError::SchemaVersion {
            found: manifest.schema_version,
        });
    }
    Ok(manifest)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{output_dir}/{short run id}/`. Re-running the same configuration
/// on the same data overwrites the same directory. Returns the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf, ExportError> {
    let run_dir = output_dir.join(result.fingerprint.run_id.short());
    std::fs::create_dir_all(&run_dir).map_err(|source| ExportError::Io {
        path: run_dir.clone(),
        source,
    })?;

    write(&run_dir.join("ledger.csv"), &export_ledger_csv(result.ledger.trades())?)?;
    write(&run_dir.join("days.csv"), &export_days_csv(&result.days)?)?;
    write(
        &run_dir.join("manifest.json"),
        &export_manifest_json(&Manifest::from_result(result))?,
    )?;

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load the manifest from an artifact directory.
pub fn load_manifest(dir: &Path) -> Result<Manifest, ExportError> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    import_manifest_json(&json)
}

/// Write predictions to a CSV file, creating parent directories.
pub fn write_predictions(path: &Path, predictions: &[Prediction]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write(path, &export_predictions_csv(predictions)?)
}

fn write(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
