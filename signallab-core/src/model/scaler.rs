//! Standard scaler: per-feature z-score fitted on training rows only.

use serde::{Deserialize, Serialize};

/// Floor applied to the standard deviation of constant features.
pub const STD_EPSILON: f64 = 1e-8;

/// Per-feature mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit on a row-major matrix. Every row must have the same width.
    ///
    /// Returns `None` for an empty matrix.
    pub fn fit(rows: &[Vec<f64>]) -> Option<Self> {
        let first = rows.first()?;
        let n_features = first.len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; n_features];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut vars = vec![0.0; n_features];
        for row in rows {
            for ((v, x), m) in vars.iter_mut().zip(row).zip(&means) {
                *v += (x - m).powi(2);
            }
        }
        let stds = vars
            .into_iter()
            .map(|v| (v / n).sqrt().max(STD_EPSILON))
            .collect();

        Some(Self { means, stds })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    /// `(x - mean) / std` for one row.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_computes_population_statistics() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.means(), &[2.0, 10.0]);
        assert!((scaler.stds()[0] - 1.0).abs() < 1e-12);
        assert_eq!(scaler.stds()[1], STD_EPSILON);
    }

    #[test]
    fn transform_centres_and_scales() {
        let rows = vec![vec![1.0], vec![3.0], vec![5.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let t = scaler.transform_all(&rows);
        let mean: f64 = t.iter().map(|r| r[0]).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!(t[0][0] < 0.0 && t[2][0] > 0.0);
    }

    #[test]
    fn constant_feature_does_not_divide_by_zero() {
        let rows = vec![vec![4.0], vec![4.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let t = scaler.transform(&[4.0]);
        assert_eq!(t, vec![0.0]);
        assert!(scaler.transform(&[5.0])[0].is_finite());
    }

    #[test]
    fn empty_matrix_cannot_be_fitted() {
        assert!(StandardScaler::fit(&[]).is_none());
    }
}
