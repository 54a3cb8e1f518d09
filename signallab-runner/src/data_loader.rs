//! Feature table loading for the runner.
//!
//! Reads the configured CSV/Parquet file once, records row-level data quality
//! issues, and fingerprints the materialized table. Everything downstream
//! (single runs, sweeps, training) works off the returned `LoadedData`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use signallab_core::data::{read_feature_file, ColumnSchema, FeatureTable, IngestError};
use signallab_core::domain::{DataQualityIssue, DatasetHash};
use signallab_core::fingerprint::dataset_hash;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("feature file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to ingest feature table: {0}")]
    Ingest(#[from] IngestError),

    #[error("feature file {0} contains no usable rows")]
    Empty(PathBuf),
}

/// A materialized feature table with provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub table: FeatureTable,
    /// Rows dropped during ingestion.
    pub issues: Vec<DataQualityIssue>,
    /// BLAKE3 content hash of `table`.
    pub dataset_hash: DatasetHash,
    pub source: PathBuf,
}

impl LoadedData {
    /// Wrap an in-memory table (tests, callers with their own ingestion).
    pub fn from_table(table: FeatureTable, source: impl Into<PathBuf>) -> Self {
        let dataset_hash = dataset_hash(&table);
        Self {
            table,
            issues: Vec::new(),
            dataset_hash,
            source: source.into(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        self.table.feature_names()
    }
}

/// Load and fingerprint the feature table at `path`.
pub fn load_feature_table(path: &Path, schema: &ColumnSchema) -> Result<LoadedData, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ingested = read_feature_file(path, schema)?;
    for issue in &ingested.issues {
        warn!("data quality: {issue}");
    }
    if ingested.table.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let hash = dataset_hash(&ingested.table);
    info!(
        path = %path.display(),
        rows = ingested.table.len(),
        dates = ingested.table.distinct_dates().len(),
        features = ingested.table.feature_names().len(),
        dropped = ingested.issues.len(),
        dataset_hash = %hash,
        "loaded feature table"
    );

    Ok(LoadedData {
        table: ingested.table,
        issues: ingested.issues,
        dataset_hash: hash,
        source: path.to_path_buf(),
    })
}
