//! Random forest classifier.

use ndarray::{Array1, ArrayView2};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::check_training_set;
use super::tree::{normalize, Criterion, DecisionTree, TreeParams};
use crate::ports::{ensure_columns, Classifier, ModelError};

/// Forest hyper-parameters; the tuning grid varies the first four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Bagged Gini trees with `sqrt(n_features)` candidate features per split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit the forest; trees are grown in parallel from per-tree seeds so
    /// the result does not depend on thread scheduling.
    ///
    /// # Errors
    /// Returns error if the training set or parameters are invalid.
    pub fn fit(
        params: &ForestParams,
        x: ArrayView2<'_, f64>,
        y: &[u8],
    ) -> Result<Self, ModelError> {
        check_training_set(x, y)?;
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".into(),
            ));
        }

        let n = x.nrows();
        let n_features = x.ncols();
        let targets: Vec<f64> = y.iter().map(|&l| f64::from(l)).collect();
        let tree_params = TreeParams {
            criterion: Criterion::Gini,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: Some(((n_features as f64).sqrt() as usize).max(1)),
        };

        let mut master = ChaCha20Rng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.next_u64()).collect();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha20Rng::seed_from_u64(seed);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, &targets, &bootstrap, &tree_params, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            for (acc, w) in importances.iter_mut().zip(tree.importances()) {
                *acc += w;
            }
        }
        normalize(&mut importances);

        tracing::debug!(
            "Fitted random forest: {} trees, {} leaves total",
            trees.len(),
            trees.iter().map(DecisionTree::n_leaves).sum::<usize>()
        );

        Ok(Self {
            trees,
            n_features,
            importances,
        })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// # Errors
    /// Returns a description of the first malformed tree.
    pub fn check_structure(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree
                .check_structure(self.n_features)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        ensure_columns(self.n_features, x)?;
        let n_trees = self.trees.len() as f64;
        Ok(x
            .outer_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}
