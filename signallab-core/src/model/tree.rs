//! CART classification tree with Gini impurity.
//!
//! Split search sorts each candidate feature once per node and sweeps the
//! sorted values, so a node costs O(k · n log n) for k candidate features
//! instead of re-partitioning for every threshold.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Per-tree growth limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn (without replacement) at every split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Fraction of positive samples that reached this leaf.
        p_up: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// A fitted binary classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    config: TreeConfig,
    n_features: usize,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` selected by `sample` (indices may repeat,
    /// as with bootstrap samples).
    ///
    /// Callers guarantee `x` and `y` have equal length, every row has the same
    /// width, and `sample` is non-empty.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        sample: &[usize],
        config: TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let builder = Builder {
            x,
            y,
            config,
            n_features: x.first().map(|r| r.len()).unwrap_or(0),
        };
        let root = builder.build(sample.to_vec(), 0, rng);
        Self { root }
    }

    /// Probability that the label is 1.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { p_up, .. } => return *p_up,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }
}

impl<'a> Builder<'a> {
    fn build(&self, idx: Vec<usize>, depth: usize, rng: &mut StdRng) -> TreeNode {
        let n = idx.len();
        let positives = idx.iter().filter(|&&i| self.y[i] == 1).count();

        if depth >= self.config.max_depth
            || n < self.config.min_samples_split
            || positives == 0
            || positives == n
        {
            return leaf(positives, n);
        }

        let Some(split) = self.best_split(&idx, positives, rng) else {
            return leaf(positives, n);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
            .iter()
            .partition(|&&i| self.x[i][split.feature] <= split.threshold);

        let left = self.build(left_idx, depth + 1, rng);
        let right = self.build(right_idx, depth + 1, rng);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn best_split(
        &self,
        idx: &[usize],
        positives: usize,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);
        let max_features = self.config.max_features.clamp(1, self.n_features.max(1));

        let n = idx.len();
        let parent = gini(positives, n);
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;

        let mut column: Vec<(f64, u8)> = Vec::with_capacity(n);
        // Past `max_features` draws, keep drawing only until some split is found.
        for (drawn, &feature) in features.iter().enumerate() {
            if drawn >= max_features && best.is_some() {
                break;
            }
            column.clear();
            column.extend(idx.iter().map(|&i| (self.x[i][feature], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0usize;
            for k in 1..n {
                left_pos += column[k - 1].1 as usize;
                if column[k - 1].0 == column[k].0 {
                    continue;
                }
                let right_n = n - k;
                if k < min_leaf || right_n < min_leaf {
                    continue;
                }
                let weighted = (k as f64 * gini(left_pos, k)
                    + right_n as f64 * gini(positives - left_pos, right_n))
                    / n as f64;
                let gain = parent - weighted;
                if gain > best.as_ref().map(|b| b.gain).unwrap_or(0.0) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (column[k - 1].0 + column[k].0) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn leaf(positives: usize, n: usize) -> TreeNode {
    TreeNode::Leaf {
        p_up: if n == 0 { 0.5 } else { positives as f64 / n as f64 },
        n_samples: n,
    }
}

/// Binary Gini impurity: 2p(1-p).
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}
