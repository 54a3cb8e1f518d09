//! Classifier layer: feature scaling, CART trees and the random forest.

pub mod bundle;
pub mod forest;
pub mod scaler;
pub mod tree;

pub use bundle::{BundleError, ModelBundle};
pub use forest::{ForestConfig, RandomForest};
pub use scaler::{StandardScaler, STD_EPSILON};
pub use tree::{DecisionTree, TreeConfig, TreeNode};

use thiserror::Error;

/// A fitted probabilistic binary classifier.
///
/// Input rows are already scaled and ordered like the training features.
pub trait Classifier: Send + Sync {
    /// P(label = 1), in [0, 1].
    fn predict_proba(&self, features: &[f64]) -> f64;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid model config: {0}")]
    InvalidConfig(String),
}
