//! Classifier port: Trait for a fitted binary classifier.
//!
//! This trait abstracts the machine-learning library from the prediction
//! path and the model-selection pipeline.

use ndarray::{Array1, ArrayView2};

/// Errors raised by estimators while fitting or predicting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training labels contain a single class")]
    SingleClass,

    #[error("Expected {expected} feature columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Check the column count of an input matrix.
///
/// # Errors
/// Returns `ModelError::ShapeMismatch` if it differs from `expected`.
pub fn ensure_columns(expected: usize, x: ArrayView2<'_, f64>) -> Result<(), ModelError> {
    if x.ncols() == expected {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            expected,
            actual: x.ncols(),
        })
    }
}

/// A fitted binary classifier.
///
/// Implementations are immutable after fitting and safe to share across
/// threads; every method takes `&self`.
pub trait Classifier: Send + Sync {
    /// Number of feature columns the model was trained on.
    fn n_features(&self) -> usize;

    /// Probability of class 1 for each row.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the column count is wrong.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;

    /// Predicted class (0 or 1) for each row.
    ///
    /// The default decision rule is `p > 0.5`; ties go to class 0.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the column count is wrong.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, ModelError> {
        Ok(self.predict_proba(x)?.mapv(|p| u8::from(p > 0.5)))
    }

    /// Global feature importances, if the model family defines them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}
