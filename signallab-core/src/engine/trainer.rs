//! Walk-forward trainer: fit scaler + forest on strictly-prior rows.

use crate::data::TrainingWindow;
use crate::model::{ForestConfig, RandomForest, StandardScaler};

use super::error::EngineError;

/// Scaler and classifier fitted for one cutoff.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub forest: RandomForest,
}

/// Fit a scaler on the window and a forest on the scaled window.
///
/// A window with a single label class is rejected rather than producing a
/// constant-probability model.
pub fn fit(
    window: &TrainingWindow<'_>,
    feature_names: &[String],
    config: &ForestConfig,
) -> Result<FittedModel, EngineError> {
    let cutoff = window.cutoff;
    if window.is_empty() {
        return Err(EngineError::EmptyTrainingWindow { cutoff });
    }
    let positives = window.positives();
    if positives == 0 || positives == window.len() {
        return Err(EngineError::DegenerateTrainingData {
            cutoff,
            rows: window.len(),
            positives,
        });
    }

    let (x, y) = design_matrix(window, feature_names)?;
    let scaler = StandardScaler::fit(&x).ok_or(EngineError::EmptyTrainingWindow { cutoff })?;
    let scaled = scaler.transform_all(&x);
    let forest = RandomForest::fit(&scaled, &y, config)
        .map_err(|source| EngineError::Model { cutoff, source })?;

    Ok(FittedModel { scaler, forest })
}

/// Raw feature matrix in `feature_names` order plus labels.
pub fn design_matrix(
    window: &TrainingWindow<'_>,
    feature_names: &[String],
) -> Result<(Vec<Vec<f64>>, Vec<u8>), EngineError> {
    let mut x = Vec::with_capacity(window.len());
    let mut y = Vec::with_capacity(window.len());
    for row in window.rows {
        let v = row
            .feature_vector(feature_names)
            .map_err(|feature| EngineError::MissingFeature {
                cutoff: window.cutoff,
                ticker: row.ticker.clone(),
                feature,
            })?;
        x.push(v);
        y.push(row.label);
    }
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureTable;
    use crate::domain::FeatureRow;
    use crate::model::Classifier;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn row(day: u32, ticker: &str, x: f64, label: u8) -> FeatureRow {
        FeatureRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ticker: ticker.into(),
            features: BTreeMap::from([("momentum_x".to_string(), x)]),
            label,
            close_price: 100.0,
            volatility_measure: 3.0,
            forward_return: Some(0.01),
        }
    }

    fn names() -> Vec<String> {
        vec!["momentum_x".to_string()]
    }

    fn config() -> ForestConfig {
        ForestConfig {
            n_trees: 10,
            max_depth: 3,
            ..ForestConfig::default()
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fits_on_prior_rows() {
        let mut rows = Vec::new();
        for d in 1..=10 {
            rows.push(row(d, "AAA", 1.0 + d as f64, 1));
            rows.push(row(d, "BBB", -1.0 - d as f64, 0));
        }
        let table = FeatureTable::new(rows, names());
        let window = table.training_window(date(10));
        assert_eq!(window.len(), 18);

        let fitted = fit(&window, &names(), &config()).unwrap();
        let up = fitted.forest.predict_proba(&fitted.scaler.transform(&[5.0]));
        let down = fitted.forest.predict_proba(&fitted.scaler.transform(&[-5.0]));
        assert!(up > 0.8);
        assert!(down < 0.2);
    }

    #[test]
    fn single_class_window_is_degenerate() {
        let rows = vec![row(1, "AAA", 1.0, 1), row(2, "AAA", 2.0, 1), row(3, "AAA", 3.0, 0)];
        let table = FeatureTable::new(rows, names());
        let err = fit(&table.training_window(date(3)), &names(), &config()).unwrap_err();
        assert_eq!(
            err,
            EngineError::DegenerateTrainingData {
                cutoff: date(3),
                rows: 2,
                positives: 2
            }
        );
    }

    #[test]
    fn empty_window_is_rejected() {
        let table = FeatureTable::new(vec![row(5, "AAA", 1.0, 1)], names());
        let err = fit(&table.training_window(date(5)), &names(), &config()).unwrap_err();
        assert_eq!(err, EngineError::EmptyTrainingWindow { cutoff: date(5) });
    }

    #[test]
    fn missing_training_feature_is_reported() {
        let mut bad = row(1, "CCC", 1.0, 0);
        bad.features.clear();
        let rows = vec![row(1, "AAA", 1.0, 1), bad, row(2, "AAA", 1.0, 1)];
        let table = FeatureTable::new(rows, names());
        let err = fit(&table.training_window(date(2)), &names(), &config()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingFeature { ref ticker, ref feature, .. }
                if ticker == "CCC" && feature == "momentum_x"
        ));
    }
}
