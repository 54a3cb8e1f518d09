//! Serialized model: feature order, scaler and forest, persisted as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Classifier, RandomForest, StandardScaler};

/// Bumped when the on-disk layout changes.
pub const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bundle JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported bundle version {found} (expected {BUNDLE_VERSION})")]
    Version { found: u32 },

    #[error("bundle is inconsistent: {0}")]
    Inconsistent(String),
}

/// Everything needed to score new rows exactly as the model was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub version: u32,
    /// Training feature order; scoring uses the same order.
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    /// Latest date present in the training rows.
    pub trained_through: Option<NaiveDate>,
    pub training_rows: usize,
}

impl ModelBundle {
    pub fn new(
        feature_names: Vec<String>,
        scaler: StandardScaler,
        forest: RandomForest,
        trained_through: Option<NaiveDate>,
        training_rows: usize,
    ) -> Self {
        Self {
            version: BUNDLE_VERSION,
            feature_names,
            scaler,
            forest,
            trained_through,
            training_rows,
        }
    }

    /// Scale a raw feature vector and return P(up).
    pub fn predict_proba(&self, raw: &[f64]) -> f64 {
        self.forest.predict_proba(&self.scaler.transform(raw))
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, BundleError> {
        let bundle: Self = serde_json::from_str(json)?;
        bundle.check()?;
        Ok(bundle)
    }

    pub fn save(&self, path: &Path) -> Result<(), BundleError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| BundleError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, self.to_json()?).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let json = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn check(&self) -> Result<(), BundleError> {
        if self.version != BUNDLE_VERSION {
            return Err(BundleError::Version {
                found: self.version,
            });
        }
        let n = self.feature_names.len();
        if self.scaler.n_features() != n || self.forest.n_features() != n {
            return Err(BundleError::Inconsistent(format!(
                "{} feature names, scaler has {}, forest has {}",
                n,
                self.scaler.n_features(),
                self.forest.n_features()
            )));
        }
        Ok(())
    }
}
