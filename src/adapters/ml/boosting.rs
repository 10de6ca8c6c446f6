//! Gradient-boosted trees for binary log-loss.

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use super::tree::{normalize, Criterion, DecisionTree, TreeParams};
use super::{check_training_set, sigmoid};
use crate::ports::{ensure_columns, Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed: 42,
        }
    }
}

/// Additive model in log-odds space.
///
/// Each stage fits a regression tree to the negative gradient `y - p` and
/// replaces its leaf values with one Newton step
/// `sum(y - p) / sum(p * (1 - p))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    prior: f64,
    learning_rate: f64,
    stages: Vec<DecisionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl GradientBoosting {
    /// # Errors
    /// Returns error if the training set or parameters are invalid.
    pub fn fit(
        params: &BoostingParams,
        x: ArrayView2<'_, f64>,
        y: &[u8],
    ) -> Result<Self, ModelError> {
        check_training_set(x, y)?;
        if params.n_estimators == 0 || params.max_depth == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators and max_depth must be positive".into(),
            ));
        }
        if params.learning_rate.is_nan() || params.learning_rate <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                params.learning_rate
            )));
        }

        let n = x.nrows();
        let targets: Vec<f64> = y.iter().map(|&l| f64::from(l)).collect();
        let positive_rate = targets.iter().sum::<f64>() / n as f64;
        let prior = (positive_rate / (1.0 - positive_rate)).ln();

        let tree_params = TreeParams {
            criterion: Criterion::SquaredError,
            max_depth: Some(params.max_depth),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        };
        let all_rows: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha20Rng::seed_from_u64(params.seed);

        let mut raw = vec![prior; n];
        let mut stages = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let prob: Vec<f64> = raw.iter().map(|&f| sigmoid(f)).collect();
            let residual: Vec<f64> = targets.iter().zip(&prob).map(|(t, p)| t - p).collect();

            let mut tree = DecisionTree::fit(x, &residual, &all_rows, &tree_params, &mut rng)?;

            let leaves: Vec<usize> = x.outer_iter().map(|row| tree.leaf_index(row)).collect();
            let mut sums: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
            for (i, &leaf) in leaves.iter().enumerate() {
                let entry = sums.entry(leaf).or_insert((0.0, 0.0));
                entry.0 += residual[i];
                entry.1 += prob[i] * (1.0 - prob[i]);
            }
            for (&leaf, &(numerator, denominator)) in &sums {
                let value = if denominator.abs() < 1e-150 {
                    0.0
                } else {
                    numerator / denominator
                };
                tree.set_leaf_value(leaf, value);
            }

            for (i, row) in x.outer_iter().enumerate() {
                raw[i] += params.learning_rate * tree.predict_row(row);
            }
            stages.push(tree);
        }

        let mut importances = vec![0.0; x.ncols()];
        for stage in &stages {
            for (acc, w) in importances.iter_mut().zip(stage.importances()) {
                *acc += w;
            }
        }
        normalize(&mut importances);

        Ok(Self {
            prior,
            learning_rate: params.learning_rate,
            stages,
            n_features: x.ncols(),
            importances,
        })
    }

    /// # Errors
    /// Returns a description of the first malformed stage.
    pub fn check_structure(&self) -> Result<(), String> {
        for (i, stage) in self.stages.iter().enumerate() {
            stage
                .check_structure(self.n_features)
                .map_err(|e| format!("stage {i}: {e}"))?;
        }
        Ok(())
    }

    /// Raw log-odds score per row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the column count is wrong.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        ensure_columns(self.n_features, x)?;
        Ok(x
            .outer_iter()
            .map(|row| {
                self.prior
                    + self.learning_rate
                        * self.stages.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }
}

impl Classifier for GradientBoosting {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ml::testing::separable;

    #[test]
    fn test_boosting_fits_training_data() {
        let (x, y) = separable(40);
        let params = BoostingParams {
            n_estimators: 30,
            ..BoostingParams::default()
        };
        let model = GradientBoosting::fit(&params, x.view(), &y).expect("fit");
        assert_eq!(model.predict(x.view()).expect("predict").to_vec(), y);
    }

    #[test]
    fn test_prior_is_log_odds_of_base_rate() {
        let (x, y) = separable(40);
        let params = BoostingParams {
            n_estimators: 1,
            learning_rate: 1e-9,
            ..BoostingParams::default()
        };
        let model = GradientBoosting::fit(&params, x.view(), &y).expect("fit");
        // Balanced labels: prior is 0, so every probability stays near 0.5.
        let proba = model.predict_proba(x.view()).expect("proba");
        assert!(proba.iter().all(|p| (p - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = separable(40);
        let model = GradientBoosting::fit(&BoostingParams::default(), x.view(), &y).expect("fit");
        let importances = model.feature_importances().expect("importances");
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_learning_rate() {
        let (x, y) = separable(10);
        let params = BoostingParams {
            learning_rate: 0.0,
            ..BoostingParams::default()
        };
        assert!(GradientBoosting::fit(&params, x.view(), &y).is_err());
    }
}
