//! RBF-kernel support vector classifier with Platt-scaled probabilities.
//!
//! The dual is solved by SMO with maximal-violating-pair working-set
//! selection. Class 1 is the positive (`+1`) side.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::check_training_set;
use super::logistic::{LogisticParams, LogisticRegression};
use crate::ports::{ensure_columns, Classifier, ModelError};

const TAU: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    pub c: f64,
    /// Kernel width; `None` uses `1 / (n_features * var(X))`
    pub gamma: Option<f64>,
    /// KKT violation tolerance
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tol: 1e-3,
            max_iter: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    support_vectors: Vec<Vec<f64>>,
    /// `alpha_i * y_i` per support vector
    dual_coef: Vec<f64>,
    rho: f64,
    gamma: f64,
    n_features: usize,
    platt: LogisticRegression,
}

fn rbf(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, gamma: f64) -> f64 {
    let sq: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum();
    (-gamma * sq).exp()
}

fn scale_gamma(x: ArrayView2<'_, f64>) -> f64 {
    let n = x.len() as f64;
    let mean = x.sum() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    if var > 0.0 {
        1.0 / (x.ncols() as f64 * var)
    } else {
        1.0
    }
}

/// Sigmoid calibration of decision values against the smoothed targets
/// `(n+ + 1) / (n+ + 2)` and `1 / (n- + 2)`.
fn fit_platt(decision: &[f64], y: &[u8]) -> Result<LogisticRegression, ModelError> {
    let positives = y.iter().filter(|&&l| l != 0).count() as f64;
    let negatives = y.len() as f64 - positives;
    let hi = (positives + 1.0) / (positives + 2.0);
    let lo = 1.0 / (negatives + 2.0);
    let targets: Vec<f64> = y.iter().map(|&l| if l == 0 { lo } else { hi }).collect();

    let column = ArrayView1::from(decision).insert_axis(Axis(1));
    let params = LogisticParams {
        c: f64::INFINITY,
        ..LogisticParams::default()
    };
    LogisticRegression::fit_targets(&params, column, &targets)
}

impl SupportVectorClassifier {
    /// # Errors
    /// Returns error if the training set or parameters are invalid.
    pub fn fit(params: &SvmParams, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<Self, ModelError> {
        check_training_set(x, y)?;
        if params.c.is_nan() || params.c <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "C must be positive, got {}",
                params.c
            )));
        }
        let gamma = match params.gamma {
            Some(g) if g > 0.0 => g,
            Some(g) => {
                return Err(ModelError::InvalidParameter(format!(
                    "gamma must be positive, got {g}"
                )))
            }
            None => scale_gamma(x),
        };

        let n = x.nrows();
        let signs: Vec<f64> = y.iter().map(|&l| if l == 0 { -1.0 } else { 1.0 }).collect();
        let kernel = Array2::from_shape_fn((n, n), |(i, j)| rbf(x.row(i), x.row(j), gamma));
        let q = |i: usize, j: usize| signs[i] * signs[j] * kernel[[i, j]];

        let c = params.c;
        let mut alpha = vec![0.0; n];
        let mut grad = vec![-1.0; n];
        let mut iterations = 0;

        while iterations < params.max_iter {
            iterations += 1;

            let mut i_up = None;
            let mut best_up = f64::NEG_INFINITY;
            let mut j_low = None;
            let mut best_low = f64::INFINITY;
            for t in 0..n {
                let value = -signs[t] * grad[t];
                let in_up = (signs[t] > 0.0 && alpha[t] < c) || (signs[t] < 0.0 && alpha[t] > 0.0);
                let in_low = (signs[t] > 0.0 && alpha[t] > 0.0) || (signs[t] < 0.0 && alpha[t] < c);
                if in_up && value > best_up {
                    best_up = value;
                    i_up = Some(t);
                }
                if in_low && value < best_low {
                    best_low = value;
                    j_low = Some(t);
                }
            }
            let (Some(i), Some(j)) = (i_up, j_low) else {
                break;
            };
            if best_up - best_low < params.tol {
                break;
            }

            let (old_i, old_j) = (alpha[i], alpha[j]);
            if signs[i] != signs[j] {
                let quad = (q(i, i) + q(j, j) + 2.0 * q(i, j)).max(TAU);
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = alpha[i] - alpha[j];
                alpha[i] += delta;
                alpha[j] += delta;
                if diff > 0.0 {
                    if alpha[j] < 0.0 {
                        alpha[j] = 0.0;
                        alpha[i] = diff;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = -diff;
                }
                if diff > 0.0 {
                    if alpha[i] > c {
                        alpha[i] = c;
                        alpha[j] = c - diff;
                    }
                } else if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = c + diff;
                }
            } else {
                let quad = (q(i, i) + q(j, j) - 2.0 * q(i, j)).max(TAU);
                let delta = (grad[i] - grad[j]) / quad;
                let sum = alpha[i] + alpha[j];
                alpha[i] -= delta;
                alpha[j] += delta;
                if sum > c {
                    if alpha[i] > c {
                        alpha[i] = c;
                        alpha[j] = sum - c;
                    }
                } else if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = sum;
                }
                if sum > c {
                    if alpha[j] > c {
                        alpha[j] = c;
                        alpha[i] = sum - c;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = sum;
                }
            }

            let (d_i, d_j) = (alpha[i] - old_i, alpha[j] - old_j);
            for (t, g) in grad.iter_mut().enumerate() {
                *g += q(t, i) * d_i + q(t, j) * d_j;
            }
        }
        if iterations >= params.max_iter {
            tracing::warn!("SMO reached max_iter ({}) before convergence", params.max_iter);
        }

        let rho = Self::compute_rho(&alpha, &grad, &signs, c);

        let mut support_vectors = Vec::new();
        let mut dual_coef = Vec::new();
        for (i, &a) in alpha.iter().enumerate() {
            if a > 0.0 {
                support_vectors.push(x.row(i).to_vec());
                dual_coef.push(a * signs[i]);
            }
        }
        tracing::debug!(
            "SMO finished after {iterations} iterations with {} support vectors",
            support_vectors.len()
        );

        let decision: Vec<f64> = (0..n)
            .map(|i| (0..n).map(|j| alpha[j] * signs[j] * kernel[[i, j]]).sum::<f64>() - rho)
            .collect();
        let platt = fit_platt(&decision, y)?;

        Ok(Self {
            support_vectors,
            dual_coef,
            rho,
            gamma,
            n_features: x.ncols(),
            platt,
        })
    }

    fn compute_rho(alpha: &[f64], grad: &[f64], signs: &[f64], c: f64) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut free = 0usize;
        let mut free_sum = 0.0;
        for t in 0..alpha.len() {
            let yg = signs[t] * grad[t];
            if alpha[t] >= c {
                if signs[t] < 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else if alpha[t] <= 0.0 {
                if signs[t] > 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else {
                free += 1;
                free_sum += yg;
            }
        }
        if free > 0 {
            free_sum / free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    #[must_use]
    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    /// Signed distance to the separating surface; positive means class 1.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the column count is wrong.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        ensure_columns(self.n_features, x)?;
        Ok(x
            .outer_iter()
            .map(|row| {
                self.support_vectors
                    .iter()
                    .zip(&self.dual_coef)
                    .map(|(sv, coef)| coef * rbf(ArrayView1::from(&sv[..]), row, self.gamma))
                    .sum::<f64>()
                    - self.rho
            })
            .collect())
    }
}

impl Classifier for SupportVectorClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let column = self.decision_function(x)?.insert_axis(Axis(1));
        self.platt.predict_proba(column.view())
    }

    /// Sign of the decision function, which may disagree with
    /// `predict_proba` near the boundary.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, ModelError> {
        Ok(self.decision_function(x)?.mapv(|d| u8::from(d > 0.0)))
    }
}
