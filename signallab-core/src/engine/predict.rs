//! Single-date workflow: train once on all realized rows, then score new rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{EvaluationSlice, FeatureTable, TrainingWindow};
use crate::domain::{DataQualityIssue, FeatureRow};
use crate::model::{Classifier, ForestConfig, ModelBundle};

use super::error::EngineError;
use super::scorer::{score, Thresholds};
use super::trainer::fit;

/// A filtered prediction for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub ticker: String,
    pub predicted_probability_up: f64,
    pub close_price: f64,
}

/// Predictions plus the rows excluded for data-quality reasons.
#[derive(Debug, Clone, Default)]
pub struct PredictOutput {
    pub predictions: Vec<Prediction>,
    pub issues: Vec<DataQualityIssue>,
}

/// Fit a model bundle on every row whose forward return is realized.
///
/// Rows from the most recent dates, whose horizon has not elapsed, carry no
/// trustworthy label and are left out.
pub fn train_model(
    table: &FeatureTable,
    feature_names: &[String],
    config: &ForestConfig,
) -> Result<ModelBundle, EngineError> {
    config
        .validate()
        .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
    let realized: Vec<FeatureRow> = table
        .rows()
        .iter()
        .filter(|r| r.forward_return.is_some())
        .cloned()
        .collect();
    let trained_through = realized.iter().map(|r| r.date).max();
    // Guard date for error reporting: the day after the last realized row.
    let cutoff = trained_through
        .and_then(|d| d.succ_opt())
        .or(table.last_date())
        .unwrap_or(NaiveDate::MIN);

    let window = TrainingWindow {
        cutoff,
        rows: &realized,
    };
    let fitted = fit(&window, feature_names, config)?;

    info!(
        model = fitted.forest.name(),
        rows = window.len(),
        positives = window.positives(),
        trees = config.n_trees,
        trained_through = ?trained_through,
        "model trained"
    );

    Ok(ModelBundle::new(
        feature_names.to_vec(),
        fitted.scaler,
        fitted.forest,
        trained_through,
        window.len(),
    ))
}

/// Score rows with a trained bundle and keep those passing both filters.
///
/// Consecutive rows sharing a date are scored as one evaluation slice, with
/// the same exclusions as the walk-forward loop: a ticker repeated within a
/// date is predicted once. Callers usually pass one date's rows.
pub fn predict(
    bundle: &ModelBundle,
    rows: &[FeatureRow],
    thresholds: Thresholds,
) -> Result<PredictOutput, EngineError> {
    let mut out = PredictOutput::default();
    for chunk in rows.chunk_by(|a, b| a.date == b.date) {
        let slice = EvaluationSlice {
            date: chunk[0].date,
            rows: chunk,
        };
        let scored = score(
            &slice,
            &bundle.feature_names,
            &bundle.scaler,
            &bundle.forest,
            thresholds,
        )?;
        out.predictions
            .extend(scored.candidates.into_iter().map(|c| Prediction {
                date: c.row.date,
                ticker: c.row.ticker.clone(),
                predicted_probability_up: c.predicted_probability_up,
                close_price: c.row.close_price,
            }));
        out.issues.extend(scored.issues);
    }
    Ok(out)
}

/// Rows of the most recent date in the table.
pub fn latest_rows(table: &FeatureTable) -> &[FeatureRow] {
    match table.last_date() {
        Some(last) => table.evaluation_slice(last).rows,
        None => &[],
    }
}
