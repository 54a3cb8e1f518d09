//! Random forest classifier: bootstrap-aggregated CART trees.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeConfig};
use super::{Classifier, ModelError};
use crate::rng::RngHierarchy;

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Master seed; per-tree seeds are derived from it
    pub seed: u64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split (ceil(sqrt(n)) if None)
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 10,
            seed: 42,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidConfig("n_trees must be >= 1".into()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig("max_depth must be >= 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(
                "min_samples_split must be >= 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidConfig(
                "min_samples_leaf must be >= 1".into(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidConfig("max_features must be >= 1".into()));
        }
        Ok(())
    }

    /// Features drawn per split for a table of `n_features` columns:
    /// `floor(sqrt(n))`, at least 1, unless set explicitly.
    pub fn resolved_max_features(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features.max(1))
    }
}

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on a scaled, row-major matrix with binary labels.
    ///
    /// Trees are grown in parallel. Each tree draws from its own RNG stream
    /// derived from `(seed, tree index)`, and results are collected in tree
    /// order, so the fitted forest does not depend on the thread count.
    pub fn fit(x: &[Vec<f64>], y: &[u8], config: &ForestConfig) -> Result<Self, ModelError> {
        config.validate()?;
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some(bad) = x.iter().find(|r| r.len() != n_features) {
            return Err(ModelError::DimensionMismatch {
                expected: n_features,
                actual: bad.len(),
            });
        }

        let n = x.len();
        let seeds = RngHierarchy::new(config.seed);
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.resolved_max_features(n_features),
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = seeds.rng_for("tree", t as u64);
                let sample: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, y, &sample, tree_config, &mut rng)
            })
            .collect();

        Ok(Self {
            config: *config,
            n_features,
            trees,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Classifier for RandomForest {
    /// Mean of the per-tree leaf probabilities.
    fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        sum / self.trees.len() as f64
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}
