//! In-process estimators behind the `Classifier` port.
//!
//! Five families are available, each with the default hyper-parameters of
//! the training pipeline:
//! - `logistic`: L2 logistic regression
//! - `forest`: bagged Gini trees
//! - `svm`: RBF support vector classifier with Platt probabilities
//! - `knn`: k-nearest-neighbours vote
//! - `boosting`: gradient-boosted regression trees on log-loss

pub mod boosting;
pub mod forest;
pub mod knn;
pub mod logistic;
pub mod scaler;
pub mod svm;
pub mod tree;

use chrono::{DateTime, Utc};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::ports::{Classifier, ModelError};

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use knn::{KnnParams, NearestNeighbors};
pub use logistic::{LogisticParams, LogisticRegression};
pub use scaler::StandardScaler;
pub use svm::{SupportVectorClassifier, SvmParams};

/// Current on-disk layout of `ModelArtifact`.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Estimator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    LogisticRegression,
    RandomForest,
    Svm,
    Knn,
    GradientBoosting,
}

/// How the selector treats a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyPolicy {
    /// Fit a `StandardScaler` in front of the estimator
    pub requires_scaling: bool,
    /// The family can be served on raw feature vectors after a refit
    pub refit_for_serving: bool,
}

/// Policy per family, in roster order.
pub const FAMILY_POLICIES: [(ModelFamily, FamilyPolicy); 5] = [
    (
        ModelFamily::LogisticRegression,
        FamilyPolicy {
            requires_scaling: true,
            refit_for_serving: false,
        },
    ),
    (
        ModelFamily::RandomForest,
        FamilyPolicy {
            requires_scaling: false,
            refit_for_serving: true,
        },
    ),
    (
        ModelFamily::Svm,
        FamilyPolicy {
            requires_scaling: true,
            refit_for_serving: false,
        },
    ),
    (
        ModelFamily::Knn,
        FamilyPolicy {
            requires_scaling: true,
            refit_for_serving: false,
        },
    ),
    (
        ModelFamily::GradientBoosting,
        FamilyPolicy {
            requires_scaling: false,
            refit_for_serving: true,
        },
    ),
];

impl ModelFamily {
    /// Candidate order; earlier families win accuracy ties.
    pub const ROSTER: [Self; 5] = [
        Self::LogisticRegression,
        Self::RandomForest,
        Self::Svm,
        Self::Knn,
        Self::GradientBoosting,
    ];

    /// Name used in reports and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LogisticRegression => "Logistic Regression",
            Self::RandomForest => "Random Forest",
            Self::Svm => "SVM",
            Self::Knn => "KNN",
            Self::GradientBoosting => "Gradient Boosting",
        }
    }

    #[must_use]
    pub fn policy(self) -> FamilyPolicy {
        FAMILY_POLICIES
            .iter()
            .find(|(family, _)| *family == self)
            .map_or(
                FamilyPolicy {
                    requires_scaling: false,
                    refit_for_serving: false,
                },
                |(_, policy)| *policy,
            )
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An untrained estimator: family plus hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EstimatorSpec {
    LogisticRegression(LogisticParams),
    RandomForest(ForestParams),
    Svm(SvmParams),
    Knn(KnnParams),
    GradientBoosting(BoostingParams),
}

impl EstimatorSpec {
    /// Default hyper-parameters for a family.
    #[must_use]
    pub fn default_for(family: ModelFamily) -> Self {
        match family {
            ModelFamily::LogisticRegression => Self::LogisticRegression(LogisticParams::default()),
            ModelFamily::RandomForest => Self::RandomForest(ForestParams::default()),
            ModelFamily::Svm => Self::Svm(SvmParams::default()),
            ModelFamily::Knn => Self::Knn(KnnParams::default()),
            ModelFamily::GradientBoosting => Self::GradientBoosting(BoostingParams::default()),
        }
    }

    #[must_use]
    pub fn family(&self) -> ModelFamily {
        match self {
            Self::LogisticRegression(_) => ModelFamily::LogisticRegression,
            Self::RandomForest(_) => ModelFamily::RandomForest,
            Self::Svm(_) => ModelFamily::Svm,
            Self::Knn(_) => ModelFamily::Knn,
            Self::GradientBoosting(_) => ModelFamily::GradientBoosting,
        }
    }

    /// Fit the bare estimator (no scaling).
    ///
    /// # Errors
    /// Returns error if the training set or hyper-parameters are invalid.
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<TrainedModel, ModelError> {
        Ok(match self {
            Self::LogisticRegression(p) => {
                TrainedModel::LogisticRegression(LogisticRegression::fit(p, x, y)?)
            }
            Self::RandomForest(p) => TrainedModel::RandomForest(RandomForest::fit(p, x, y)?),
            Self::Svm(p) => TrainedModel::Svm(SupportVectorClassifier::fit(p, x, y)?),
            Self::Knn(p) => TrainedModel::Knn(NearestNeighbors::fit(p, x, y)?),
            Self::GradientBoosting(p) => {
                TrainedModel::GradientBoosting(GradientBoosting::fit(p, x, y)?)
            }
        })
    }
}

/// A fitted estimator of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    Svm(SupportVectorClassifier),
    Knn(NearestNeighbors),
    GradientBoosting(GradientBoosting),
}

impl TrainedModel {
    #[must_use]
    pub fn family(&self) -> ModelFamily {
        match self {
            Self::LogisticRegression(_) => ModelFamily::LogisticRegression,
            Self::RandomForest(_) => ModelFamily::RandomForest,
            Self::Svm(_) => ModelFamily::Svm,
            Self::Knn(_) => ModelFamily::Knn,
            Self::GradientBoosting(_) => ModelFamily::GradientBoosting,
        }
    }

    /// Reject fitted trees whose node arena could index out of bounds or
    /// loop. Other families carry no arena.
    ///
    /// # Errors
    /// Returns a description of the first malformed node.
    pub fn check_structure(&self) -> Result<(), String> {
        match self {
            Self::RandomForest(m) => m.check_structure(),
            Self::GradientBoosting(m) => m.check_structure(),
            Self::LogisticRegression(_) | Self::Svm(_) | Self::Knn(_) => Ok(()),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::LogisticRegression(m) => m,
            Self::RandomForest(m) => m,
            Self::Svm(m) => m,
            Self::Knn(m) => m,
            Self::GradientBoosting(m) => m,
        }
    }
}

impl Classifier for TrainedModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        self.inner().predict_proba(x)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, ModelError> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.inner().feature_importances()
    }
}

/// Optional scaler followed by a fitted estimator.
///
/// Callers always pass raw feature vectors; the scaler, when present, was
/// fitted on the same rows as the estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    scaler: Option<StandardScaler>,
    model: TrainedModel,
}

impl FittedPipeline {
    /// Fit `spec` on raw features, scaling first if the family policy asks.
    ///
    /// # Errors
    /// Returns error if fitting fails.
    pub fn fit(spec: &EstimatorSpec, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<Self, ModelError> {
        if spec.family().policy().requires_scaling {
            let scaler = StandardScaler::fit(x)?;
            let scaled = scaler.transform(x)?;
            let model = spec.fit(scaled.view(), y)?;
            Ok(Self {
                scaler: Some(scaler),
                model,
            })
        } else {
            Ok(Self {
                scaler: None,
                model: spec.fit(x, y)?,
            })
        }
    }

    #[must_use]
    pub fn family(&self) -> ModelFamily {
        self.model.family()
    }

    #[must_use]
    pub fn is_scaled(&self) -> bool {
        self.scaler.is_some()
    }

    #[must_use]
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }
}

impl Classifier for FittedPipeline {
    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        match &self.scaler {
            Some(scaler) => self.model.predict_proba(scaler.transform(x)?.view()),
            None => self.model.predict_proba(x),
        }
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<u8>, ModelError> {
        match &self.scaler {
            Some(scaler) => self.model.predict(scaler.transform(x)?.view()),
            None => self.model.predict(x),
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.model.feature_importances()
    }
}

/// The serving artifact: a fitted pipeline plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_name: String,
    pub family: ModelFamily,
    /// Column order the pipeline expects
    pub feature_names: Vec<String>,
    /// Accuracy on the held-out split at training time
    pub held_out_accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    #[must_use]
    pub fn new(
        model_name: impl Into<String>,
        held_out_accuracy: f64,
        pipeline: FittedPipeline,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_name: model_name.into(),
            family: pipeline.family(),
            feature_names: crate::domain::feature_names(),
            held_out_accuracy,
            trained_at: Utc::now(),
            pipeline,
        }
    }
}

/// Reject empty, mislabelled or single-class training sets.
pub(crate) fn check_training_set(x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if y.len() != x.nrows() {
        return Err(ModelError::InvalidParameter(format!(
            "{} labels for {} rows",
            y.len(),
            x.nrows()
        )));
    }
    let positives = y.iter().filter(|&&l| l != 0).count();
    if positives == 0 || positives == y.len() {
        return Err(ModelError::SingleClass);
    }
    Ok(())
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use ndarray::Array2;

    /// Two well-separated clusters: columns 0 and 1 carry the label, column
    /// 2 is noise. Labels alternate 0, 1, 0, 1, ...
    pub(crate) fn separable(n: usize) -> (Array2<f64>, Vec<u8>) {
        let labels: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let label = f64::from(labels[i]);
            let t = i as f64;
            match j {
                0 => 4.0 * label + (t * 0.37).sin(),
                1 => -3.0 * label + 0.5 * (t * 0.11).cos(),
                _ => 2.0 * (t * 1.3).sin(),
            }
        });
        (x, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::separable;
    use super::*;

    #[test]
    fn test_policy_table_covers_roster() {
        for family in ModelFamily::ROSTER {
            assert!(FAMILY_POLICIES.iter().any(|(f, _)| *f == family));
        }
        assert!(ModelFamily::RandomForest.policy().refit_for_serving);
        assert!(ModelFamily::GradientBoosting.policy().refit_for_serving);
        assert!(!ModelFamily::Svm.policy().refit_for_serving);
        assert!(ModelFamily::Knn.policy().requires_scaling);
        assert!(!ModelFamily::RandomForest.policy().requires_scaling);
    }

    #[test]
    fn test_pipeline_scales_per_policy() {
        let (x, y) = separable(30);
        let knn = FittedPipeline::fit(&EstimatorSpec::default_for(ModelFamily::Knn), x.view(), &y)
            .expect("fit");
        assert!(knn.is_scaled());
        assert_eq!(knn.family(), ModelFamily::Knn);

        let spec = EstimatorSpec::RandomForest(ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        });
        let forest = FittedPipeline::fit(&spec, x.view(), &y).expect("fit");
        assert!(!forest.is_scaled());
        assert!(forest.feature_importances().is_some());
        assert!(knn.feature_importances().is_none());
    }

    #[test]
    fn test_every_family_fits_and_predicts() {
        let (x, y) = separable(30);
        for family in ModelFamily::ROSTER {
            let spec = EstimatorSpec::default_for(family);
            let pipeline = FittedPipeline::fit(&spec, x.view(), &y).expect("fit");
            let predicted = pipeline.predict(x.view()).expect("predict");
            let hits = predicted.iter().zip(&y).filter(|(p, l)| p == l).count();
            assert!(hits >= 27, "{family} got {hits}/30");
        }
    }

    #[test]
    fn test_single_class_rejected() {
        let (x, _) = separable(6);
        let err = EstimatorSpec::default_for(ModelFamily::Knn)
            .fit(x.view(), &[1; 6])
            .expect_err("single class");
        assert_eq!(err, ModelError::SingleClass);
    }

    #[test]
    fn test_artifact_round_trips_through_json() {
        let (x, y) = separable(20);
        let spec = EstimatorSpec::RandomForest(ForestParams {
            n_estimators: 3,
            ..ForestParams::default()
        });
        let pipeline = FittedPipeline::fit(&spec, x.view(), &y).expect("fit");
        let artifact = ModelArtifact::new("Random Forest", 0.9, pipeline);
        let json = serde_json::to_string(&artifact).expect("serialize");
        let back: ModelArtifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.family, ModelFamily::RandomForest);
        assert_eq!(back.feature_names.len(), crate::domain::FEATURE_COUNT);
        let before = artifact.pipeline.predict_proba(x.view()).expect("proba");
        let after = back.pipeline.predict_proba(x.view()).expect("proba");
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }
}
