use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic configuration hash (backtest parameters + model hyperparameters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic dataset hash (content hash of the materialized feature table)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic run ID (config + dataset + seed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub seed: u64,
}

impl RunId {
    pub fn new(config_hash: ConfigHash, dataset_hash: DatasetHash, seed: u64) -> Self {
        Self {
            config_hash,
            dataset_hash,
            seed,
        }
    }

    /// Stable BLAKE3 hash over the canonical JSON of the three parts.
    pub fn hash(&self) -> String {
        let canonical = serde_json::json!({
            "config_hash": &self.config_hash.0,
            "dataset_hash": &self.dataset_hash.0,
            "seed": self.seed,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// First 12 hex characters of `hash()`, used for run directory names.
    pub fn short(&self) -> String {
        self.hash()[..12].to_string()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.config_hash, self.dataset_hash, self.seed)
    }
}
