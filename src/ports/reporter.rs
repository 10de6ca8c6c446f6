//! Reporter port: Trait for training-run reports.
//!
//! The model selector hands every chart and table it produces to a
//! `Reporter`; rendering and file layout belong to the adapter.

use serde::{Deserialize, Serialize};

use crate::domain::{ClassificationScores, ConfusionMatrix, RocCurve};

/// Errors that can occur while writing reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One row of the model comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub model: String,
    pub scores: ClassificationScores,
}

/// Cross-validated accuracy as a function of training-set size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    /// Absolute number of training rows per point
    pub train_sizes: Vec<usize>,
    pub train_scores_mean: Vec<f64>,
    pub train_scores_std: Vec<f64>,
    pub test_scores_mean: Vec<f64>,
    pub test_scores_std: Vec<f64>,
}

/// Class balance of the binarized target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDistribution {
    pub healthy: usize,
    pub disease: usize,
}

/// Age histogram split by target class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeHistogram {
    /// `bins + 1` edges, ascending
    pub bin_edges: Vec<f64>,
    pub healthy: Vec<usize>,
    pub disease: Vec<usize>,
}

/// Exploratory statistics of the cleaned dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub n_rows: usize,

    /// Feature keys followed by `target`
    pub columns: Vec<String>,

    /// Pearson correlation, `columns.len()` square
    pub correlation: Vec<Vec<f64>>,

    pub target_distribution: TargetDistribution,
    pub age_histogram: AgeHistogram,

    /// Correlation of each feature with the target, ascending
    pub target_correlation: Vec<(String, f64)>,
}

/// Sink for training-run artifacts.
pub trait Reporter: Send + Sync {
    /// Record exploratory statistics of the cleaned dataset.
    ///
    /// # Errors
    /// Returns error if the report cannot be written.
    fn record_exploration(&self, report: &ExplorationReport) -> Result<(), ReportError>;

    /// Record a held-out confusion matrix for one candidate.
    ///
    /// # Errors
    /// Returns error if the report cannot be written.
    fn record_confusion_matrix(
        &self,
        model: &str,
        matrix: &ConfusionMatrix,
    ) -> Result<(), ReportError>;

    /// Record a held-out ROC curve for one candidate.
    ///
    /// # Errors
    /// Returns error if the report cannot be written.
    fn record_roc_curve(&self, model: &str, curve: &RocCurve) -> Result<(), ReportError>;

    /// Record the comparison table over all scored candidates.
    ///
    /// # Errors
    /// Returns error if the report cannot be written.
    fn record_comparison(&self, rows: &[CandidateScore]) -> Result<(), ReportError>;

    /// Record a learning curve.
    ///
    /// # Errors
    /// Returns error if the report cannot be written.
    fn record_learning_curve(&self, title: &str, curve: &LearningCurve)
        -> Result<(), ReportError>;
}
