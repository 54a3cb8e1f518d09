//! Parameter sweep over filter thresholds and position sizing.
//!
//! Every grid point is a full, independent walk-forward run over the same
//! preloaded table, so points can run on a rayon pool. Results are collected
//! in grid order either way; serial and parallel sweeps are identical.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use signallab_core::engine::BacktestParams;

use crate::data_loader::LoadedData;
use crate::metrics::PerformanceMetrics;
use crate::runner::{run_backtest_from_data, RunError};

/// Values to sweep. An empty list keeps the base configuration's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub confidence_thresholds: Vec<f64>,
    pub volatility_thresholds: Vec<f64>,
    pub position_fractions: Vec<f64>,
    pub parallel: bool,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            confidence_thresholds: vec![0.6, 0.7, 0.8],
            volatility_thresholds: vec![0.01, 0.02, 0.03],
            position_fractions: Vec::new(),
            parallel: true,
        }
    }
}

impl SweepGrid {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(v) = self
            .confidence_thresholds
            .iter()
            .chain(&self.volatility_thresholds)
            .find(|v| !v.is_finite())
        {
            return Err(format!("sweep thresholds must be finite, got {v}"));
        }
        if let Some(f) = self
            .position_fractions
            .iter()
            .find(|f| !(**f > 0.0 && **f <= 1.0))
        {
            return Err(format!("sweep position fractions must be in (0, 1], got {f}"));
        }
        Ok(())
    }

    /// Number of grid points.
    pub fn size(&self) -> usize {
        self.confidence_thresholds.len().max(1)
            * self.volatility_thresholds.len().max(1)
            * self.position_fractions.len().max(1)
    }

    /// All parameter sets, confidence-major, then volatility, then fraction.
    pub fn generate_params(&self, base: &BacktestParams) -> Vec<BacktestParams> {
        let or_base = |values: &[f64], base: f64| -> Vec<f64> {
            if values.is_empty() {
                vec![base]
            } else {
                values.to_vec()
            }
        };
        let confidences = or_base(&self.confidence_thresholds, base.confidence_threshold);
        let volatilities = or_base(&self.volatility_thresholds, base.volatility_threshold);
        let fractions = or_base(&self.position_fractions, base.position_fraction);

        let mut out = Vec::with_capacity(self.size());
        for &confidence in &confidences {
            for &volatility in &volatilities {
                for &fraction in &fractions {
                    out.push(BacktestParams {
                        confidence_threshold: confidence,
                        volatility_threshold: volatility,
                        position_fraction: fraction,
                        ..base.clone()
                    });
                }
            }
        }
        out
    }
}

/// Result of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub confidence_threshold: f64,
    pub volatility_threshold: f64,
    pub position_fraction: f64,
    pub final_balance: f64,
    pub metrics: PerformanceMetrics,
}

/// Parameter sweep executor.
#[derive(Debug, Clone, Copy)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every grid point against the preloaded data.
    pub fn sweep(
        &self,
        grid: &SweepGrid,
        base: &BacktestParams,
        data: &LoadedData,
    ) -> Result<SweepResults, RunError> {
        self.sweep_with_progress(grid, base, data, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each point completes with its grid index,
    /// the total number of points, and the result. Under parallel execution the
    /// callback order is unspecified; the returned results are in grid order.
    pub fn sweep_with_progress<F>(
        &self,
        grid: &SweepGrid,
        base: &BacktestParams,
        data: &LoadedData,
        progress: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &SweepPoint) + Send + Sync,
    {
        let params = grid.generate_params(base);
        let total = params.len();
        info!(points = total, parallel = self.parallel, "starting parameter sweep");

        let run_point = |(idx, p): (usize, &BacktestParams)| -> Result<SweepPoint, RunError> {
            let result = run_backtest_from_data(data, p)?;
            let point = SweepPoint {
                confidence_threshold: p.confidence_threshold,
                volatility_threshold: p.volatility_threshold,
                position_fraction: p.position_fraction,
                final_balance: result.final_balance,
                metrics: result.metrics,
            };
            progress(idx, total, &point);
            Ok(point)
        };

        let points: Vec<SweepPoint> = if self.parallel {
            params
                .par_iter()
                .enumerate()
                .map(run_point)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            params
                .iter()
                .enumerate()
                .map(run_point)
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults { points })
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    points: Vec<SweepPoint>,
}

impl SweepResults {
    pub fn all(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points sorted by final balance, best first. Ties keep grid order.
    pub fn sorted_by_final_balance(&self) -> Vec<&SweepPoint> {
        let mut sorted: Vec<&SweepPoint> = self.points.iter().collect();
        sorted.sort_by(|a, b| b.final_balance.total_cmp(&a.final_balance));
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&SweepPoint> {
        self.sorted_by_final_balance().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&SweepPoint> {
        self.sorted_by_final_balance().into_iter().next()
    }
}
