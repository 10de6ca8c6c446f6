//! k-nearest-neighbours classifier.

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::check_training_set;
use crate::ports::{ensure_columns, Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnParams {
    pub k: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Uniform-weight vote among the `k` closest training rows (Euclidean).
///
/// Equidistant neighbours are taken in training-row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighbors {
    k: usize,
    points: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl NearestNeighbors {
    /// # Errors
    /// Returns error if the training set is invalid or `k` is zero.
    pub fn fit(params: &KnnParams, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<Self, ModelError> {
        check_training_set(x, y)?;
        if params.k == 0 {
            return Err(ModelError::InvalidParameter("k must be at least 1".into()));
        }
        Ok(Self {
            k: params.k.min(x.nrows()),
            points: x.outer_iter().map(|row| row.to_vec()).collect(),
            labels: y.to_vec(),
        })
    }

    fn n_columns(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }
}

impl Classifier for NearestNeighbors {
    fn n_features(&self) -> usize {
        self.n_columns()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        ensure_columns(self.n_columns(), x)?;
        let mut proba = Array1::zeros(x.nrows());
        for (out, row) in proba.iter_mut().zip(x.outer_iter()) {
            let mut distances: Vec<(f64, usize)> = self
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let d: f64 = p.iter().zip(row.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                    (d, i)
                })
                .collect();
            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let positives = distances[..self.k]
                .iter()
                .filter(|(_, i)| self.labels[*i] != 0)
                .count();
            *out = positives as f64 / self.k as f64;
        }
        Ok(proba)
    }
}
