//! Run fingerprinting: deterministic identity of inputs and parameters.
//!
//! - `dataset_hash`: content hash of the materialized feature table.
//! - `params_hash`: hash of the canonical JSON of the backtest parameters.
//! - `RunFingerprint`: complete record of a run, written into the manifest.

use crate::data::FeatureTable;
use crate::domain::{ConfigHash, DatasetHash, RunId};
use crate::engine::BacktestParams;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// BLAKE3 over feature names and every row field, in table order.
///
/// Floats are hashed by bit pattern, so the hash changes on any value change,
/// however small.
pub fn dataset_hash(table: &FeatureTable) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for name in table.feature_names() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    for row in table.rows() {
        hasher.update(row.date.to_string().as_bytes());
        hasher.update(row.ticker.as_bytes());
        hasher.update(&[0, row.label]);
        hasher.update(&row.close_price.to_bits().to_le_bytes());
        hasher.update(&row.volatility_measure.to_bits().to_le_bytes());
        match row.forward_return {
            Some(r) => {
                hasher.update(&[1]);
                hasher.update(&r.to_bits().to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        for name in table.feature_names() {
            let v = row.feature(name).unwrap_or(f64::NAN);
            hasher.update(&v.to_bits().to_le_bytes());
        }
    }
    DatasetHash::from_hash(&hasher.finalize().to_hex())
}

/// Hash of the parameters' canonical JSON (struct field order is fixed).
pub fn params_hash(params: &BacktestParams) -> Result<ConfigHash, serde_json::Error> {
    let json = serde_json::to_vec(params)?;
    Ok(ConfigHash::from_bytes(&json))
}

/// Complete fingerprint of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    // ── Identity ──
    pub run_id: RunId,
    pub timestamp: chrono::NaiveDateTime,
    pub seed: u64,

    // ── Inputs ──
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub rows: usize,
    pub feature_count: usize,

    // ── Configuration ──
    pub params: BacktestParams,

    // ── Derived hashes ──
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
}

impl RunFingerprint {
    pub fn new(
        table: &FeatureTable,
        params: &BacktestParams,
        config_hash: ConfigHash,
        dataset_hash: DatasetHash,
        timestamp: chrono::NaiveDateTime,
    ) -> Self {
        let seed = params.model.seed;
        Self {
            run_id: RunId::new(config_hash.clone(), dataset_hash.clone(), seed),
            timestamp,
            seed,
            first_date: table.first_date(),
            last_date: table.last_date(),
            rows: table.len(),
            feature_count: table.feature_names().len(),
            params: params.clone(),
            config_hash,
            dataset_hash,
        }
    }
}
