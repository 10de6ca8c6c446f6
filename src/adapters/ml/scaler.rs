//! Per-column standardization.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::ports::{ensure_columns, ModelError};

/// Zero-mean, unit-variance scaling fitted on training data.
///
/// Uses the population standard deviation; constant columns get scale 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and deviations.
    ///
    /// # Errors
    /// Returns `ModelError::EmptyTrainingSet` if `x` has no rows.
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self, ModelError> {
        let mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyTrainingSet)?;
        let std = x.std_axis(Axis(0), 0.0);
        let scale = std
            .iter()
            .map(|&s| if s > f64::EPSILON { s } else { 1.0 })
            .collect();
        Ok(Self {
            mean: mean.to_vec(),
            scale,
        })
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Apply the learned scaling.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the column count differs.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        ensure_columns(self.n_features(), x)?;
        let mut out = x.to_owned();
        for (j, mut column) in out.columns_mut().into_iter().enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            column.mapv_inplace(|v| (v - m) / s);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaled_columns_are_standardized() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = StandardScaler::fit(x.view()).expect("fit");
        let z = scaler.transform(x.view()).expect("transform");

        let mean = z.mean_axis(Axis(0)).expect("rows");
        assert!(mean.iter().all(|m| m.abs() < 1e-12));
        assert!((z.column(0).std(0.0) - 1.0).abs() < 1e-12);
        // Constant column is centred but not divided by zero.
        assert!(z.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let scaler = StandardScaler::fit(array![[1.0, 2.0], [2.0, 3.0]].view()).expect("fit");
        let err = scaler
            .transform(array![[1.0, 2.0, 3.0]].view())
            .expect_err("wrong width");
        assert_eq!(err, ModelError::ShapeMismatch { expected: 2, actual: 3 });
    }

    #[test]
    fn test_empty_fit_fails() {
        let x = Array2::<f64>::zeros((0, 3));
        assert_eq!(
            StandardScaler::fit(x.view()).expect_err("empty"),
            ModelError::EmptyTrainingSet
        );
    }
}
