//! L2-regularized logistic regression.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{check_training_set, sigmoid};
use crate::ports::{ensure_columns, Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength; `f64::INFINITY` disables the penalty
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 10_000,
            tol: 1e-6,
        }
    }
}

/// Linear model on the log-odds scale.
///
/// Minimizes mean log-loss plus `||w||^2 / (2 * C * n)` by full-batch
/// gradient descent with a fixed step of `1 / L`, where `L` bounds the
/// gradient's Lipschitz constant. The intercept is not penalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// # Errors
    /// Returns error if the training set or parameters are invalid.
    pub fn fit(
        params: &LogisticParams,
        x: ArrayView2<'_, f64>,
        y: &[u8],
    ) -> Result<Self, ModelError> {
        check_training_set(x, y)?;
        let targets: Vec<f64> = y.iter().map(|&l| f64::from(l)).collect();
        Self::fit_targets(params, x, &targets)
    }

    /// Fit against soft targets in `[0, 1]`.
    ///
    /// # Errors
    /// Returns error if `x` is empty, the target length differs or `c` is
    /// not positive.
    pub fn fit_targets(
        params: &LogisticParams,
        x: ArrayView2<'_, f64>,
        targets: &[f64],
    ) -> Result<Self, ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if targets.len() != x.nrows() {
            return Err(ModelError::InvalidParameter(format!(
                "{} targets for {} rows",
                targets.len(),
                x.nrows()
            )));
        }
        if params.c.is_nan() || params.c <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "C must be positive, got {}",
                params.c
            )));
        }

        let n = x.nrows() as f64;
        let t = ArrayView1::from(targets);
        let reg = if params.c.is_finite() {
            1.0 / (params.c * n)
        } else {
            0.0
        };
        let mean_sq_norm = x.iter().map(|v| v * v).sum::<f64>() / n;
        let step = 1.0 / (0.25 * (mean_sq_norm + 1.0) + reg);

        let mut w = Array1::<f64>::zeros(x.ncols());
        let mut b = 0.0;
        let mut iterations = 0;
        for _ in 0..params.max_iter {
            iterations += 1;
            let residual = (x.dot(&w) + b).mapv(sigmoid) - t;
            let grad_w = x.t().dot(&residual) / n + &w * reg;
            let grad_b = residual.sum() / n;

            w.scaled_add(-step, &grad_w);
            b -= step * grad_b;

            let norm = (grad_w.dot(&grad_w) + grad_b * grad_b).sqrt();
            if norm < params.tol {
                break;
            }
        }
        tracing::debug!("Logistic regression stopped after {iterations} iterations");

        Ok(Self {
            coefficients: w.to_vec(),
            intercept: b,
        })
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Log-odds per row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the column count is wrong.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        ensure_columns(self.coefficients.len(), x)?;
        Ok(x.dot(&ArrayView1::from(&self.coefficients[..])) + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ml::testing::separable;
    use ndarray::array;

    #[test]
    fn test_logistic_separates_clusters() {
        let (x, y) = separable(40);
        let model = LogisticRegression::fit(&LogisticParams::default(), x.view(), &y).expect("fit");
        assert_eq!(model.predict(x.view()).expect("predict").to_vec(), y);
        assert!(model.coefficients()[0] > 0.0);
        assert!(model.feature_importances().is_none());
    }

    #[test]
    fn test_soft_targets_recover_sigmoid() {
        // Targets generated from p = sigmoid(2x - 1) are fitted exactly
        // without a penalty.
        let xs = [-2.0, -1.0, 0.0, 0.5, 1.0, 2.0, 3.0];
        let x = ndarray::Array2::from_shape_fn((xs.len(), 1), |(i, _)| xs[i]);
        let targets: Vec<f64> = xs.iter().map(|&v| sigmoid(2.0 * v - 1.0)).collect();
        let params = LogisticParams {
            c: f64::INFINITY,
            max_iter: 200_000,
            tol: 1e-10,
        };
        let model = LogisticRegression::fit_targets(&params, x.view(), &targets).expect("fit");
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-3);
        assert!((model.intercept() + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let x = array![[1.0], [2.0]];
        assert_eq!(
            LogisticRegression::fit(&LogisticParams::default(), x.view(), &[1, 1])
                .expect_err("single class"),
            ModelError::SingleClass
        );
        let params = LogisticParams {
            c: -1.0,
            ..LogisticParams::default()
        };
        assert!(matches!(
            LogisticRegression::fit(&params, x.view(), &[0, 1]),
            Err(ModelError::InvalidParameter(_))
        ));
        let model =
            LogisticRegression::fit(&LogisticParams::default(), x.view(), &[0, 1]).expect("fit");
        assert!(model.predict_proba(array![[1.0, 2.0]].view()).is_err());
    }
}
