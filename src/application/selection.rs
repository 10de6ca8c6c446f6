//! Model selection: the offline training run.
//!
//! One run loads and cleans the dataset, scores the fixed candidate roster
//! on a seeded 80/20 split, tunes a random forest by grid search, reconciles
//! the tuned forest against the best base candidate and persists a model
//! the serving process can use on raw feature vectors.
//!
//! Which fitted model is served is decided by the family policy table
//! (`ModelFamily::policy`): only families marked `refit_for_serving` are
//! served as chosen; any other winner is replaced by the tuned forest.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::exploration::explore;
use super::tuning::{grid_search, learning_curve, ForestGrid, GridSearchResult, CV_FOLDS};
use crate::adapters::ml::{
    BoostingParams, EstimatorSpec, FittedPipeline, ForestParams, ModelArtifact, ModelFamily,
};
use crate::adapters::{read_dataset, ArtifactError};
use crate::domain::metrics::{accuracy, roc_curve};
use crate::domain::{ClassificationScores, ConfusionMatrix, Dataset, LabeledRecord};
use crate::ports::{CandidateScore, Classifier, ModelError, ModelStore, ReportError, Reporter};
use crate::CardiolensError;

/// Display name of the grid-searched forest.
pub const TUNED_FOREST_NAME: &str = "Tuned Random Forest";

/// Held-out share of the cleaned dataset.
pub const TEST_FRACTION: f64 = 0.2;

/// Seed of the split, the forests and the boosting stages.
pub const DEFAULT_SEED: u64 = 42;

/// Knobs of one training run.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub grid: ForestGrid,
    /// Candidates in tie-break order
    pub roster: Vec<EstimatorSpec>,
    /// Compute and report exploratory statistics
    pub explore: bool,
}

impl SelectorConfig {
    /// Default roster and grid, seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            test_fraction: TEST_FRACTION,
            cv_folds: CV_FOLDS,
            grid: ForestGrid::default(),
            roster: ModelFamily::ROSTER
                .iter()
                .map(|&family| seeded_spec(family, seed))
                .collect(),
            explore: true,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

fn seeded_spec(family: ModelFamily, seed: u64) -> EstimatorSpec {
    match family {
        ModelFamily::RandomForest => EstimatorSpec::RandomForest(ForestParams {
            seed,
            ..ForestParams::default()
        }),
        ModelFamily::GradientBoosting => EstimatorSpec::GradientBoosting(BoostingParams {
            seed,
            ..BoostingParams::default()
        }),
        other => EstimatorSpec::default_for(other),
    }
}

/// Held-out evaluation of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub family: ModelFamily,
    pub name: String,
    pub scores: ClassificationScores,
    pub confusion: ConfusionMatrix,
    pub auc: f64,
}

/// A candidate that could not be fitted or evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub name: String,
    pub reason: String,
}

/// Which model won reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalChoice {
    /// The best base candidate
    Base,
    /// The grid-searched random forest
    TunedForest,
}

/// Prefer the tuned forest if it is strictly more accurate, or as accurate
/// when the base winner is itself a random forest.
#[must_use]
pub fn reconcile(base_family: ModelFamily, base_accuracy: f64, tuned_accuracy: f64) -> FinalChoice {
    let base_is_forest = base_family == ModelFamily::RandomForest;
    if tuned_accuracy > base_accuracy || (base_is_forest && tuned_accuracy >= base_accuracy) {
        FinalChoice::TunedForest
    } else {
        FinalChoice::Base
    }
}

/// What gets fitted for serving.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingPlan {
    pub name: String,
    pub spec: EstimatorSpec,
    /// The chosen family is not served; the tuned forest stands in
    pub substituted: bool,
}

/// Resolve the final choice against the family policy table.
#[must_use]
pub fn serving_plan(
    choice: FinalChoice,
    base_spec: &EstimatorSpec,
    tuned: ForestParams,
) -> ServingPlan {
    let tuned_plan = |substituted| ServingPlan {
        name: TUNED_FOREST_NAME.to_string(),
        spec: EstimatorSpec::RandomForest(tuned),
        substituted,
    };
    match choice {
        FinalChoice::TunedForest => tuned_plan(false),
        FinalChoice::Base if base_spec.family().policy().refit_for_serving => ServingPlan {
            name: base_spec.family().name().to_string(),
            spec: *base_spec,
            substituted: false,
        },
        FinalChoice::Base => tuned_plan(true),
    }
}

/// Everything a training run decided.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub n_train: usize,
    pub n_test: usize,
    /// Scored candidates in roster order
    pub candidates: Vec<CandidateReport>,
    pub failures: Vec<CandidateFailure>,
    pub base_best: CandidateReport,
    pub tuning: GridSearchResult,
    /// Held-out accuracy of the tuned forest
    pub tuned_accuracy: f64,
    pub final_choice: FinalChoice,
    pub final_name: String,
    /// Name recorded in the persisted artifact
    pub served_name: String,
    pub served_family: ModelFamily,
    pub served_accuracy: f64,
}

/// Runs the offline selection pipeline against a reporter and a model store.
pub struct ModelSelector<R, S>
where
    R: Reporter,
    S: ModelStore,
{
    config: SelectorConfig,
    reporter: Arc<R>,
    store: Arc<S>,
}

impl<R, S> ModelSelector<R, S>
where
    R: Reporter,
    S: ModelStore,
    S::Error: Into<ArtifactError>,
{
    /// Create a new selector.
    pub fn new(config: SelectorConfig, reporter: Arc<R>, store: Arc<S>) -> Self {
        Self {
            config,
            reporter,
            store,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Train from the dataset file at `path`.
    ///
    /// # Errors
    /// Returns `CardiolensError::TrainingDataMissing` if the file does not
    /// exist, otherwise as `run_records`.
    pub fn run(&self, path: &Path) -> Result<SelectionOutcome, CardiolensError> {
        let loaded = read_dataset(path)?;
        self.run_records(&loaded.records)
    }

    /// Train from already cleaned records.
    ///
    /// # Errors
    /// Returns error if no candidate can be trained, the forest grid search
    /// fails, or the serving artifact cannot be fitted or saved. Reporter
    /// failures are logged and ignored.
    pub fn run_records(
        &self,
        records: &[LabeledRecord],
    ) -> Result<SelectionOutcome, CardiolensError> {
        let data = Dataset::from_records(records);
        let (negatives, positives) = data.class_counts();
        tracing::info!(
            "Dataset: {} rows, {} without disease, {} with disease",
            data.len(),
            negatives,
            positives
        );

        if self.config.explore {
            let report = explore(&data);
            self.report("exploration", self.reporter.record_exploration(&report));
        }

        let (train, test) = data.train_test_split(self.config.test_fraction, self.config.seed);
        tracing::info!("Split: {} train rows, {} test rows", train.len(), test.len());

        let mut candidates = Vec::new();
        let mut specs = Vec::new();
        let mut failures = Vec::new();
        for spec in &self.config.roster {
            let name = spec.family().name();
            match self.evaluate_candidate(spec, &train, &test) {
                Ok(report) => {
                    tracing::info!(
                        "{name}: accuracy {:.4}, precision {:.4}, recall {:.4}, f1 {:.4}, \
                         auc {:.4}",
                        report.scores.accuracy,
                        report.scores.precision,
                        report.scores.recall,
                        report.scores.f1,
                        report.auc
                    );
                    candidates.push(report);
                    specs.push(*spec);
                }
                Err(e) => {
                    tracing::warn!("Candidate {name} failed: {e}");
                    failures.push(CandidateFailure {
                        name: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let rows: Vec<CandidateScore> = candidates
            .iter()
            .map(|c| CandidateScore {
                model: c.name.clone(),
                scores: c.scores,
            })
            .collect();
        self.report("model comparison", self.reporter.record_comparison(&rows));

        let best_index = best_candidate(&candidates).ok_or(CardiolensError::NoViableCandidate)?;
        let base_best = candidates[best_index].clone();
        let base_spec = specs[best_index];
        tracing::info!(
            "Best base model: {} (accuracy {:.4})",
            base_best.name,
            base_best.scores.accuracy
        );
        self.record_learning_curve(&base_best.name, &base_spec, &data);

        let tuning = grid_search(
            &self.config.grid,
            &train,
            self.config.cv_folds,
            self.config.seed,
        )?;
        let tuned_predictions = tuning.model.predict(test.features())?.to_vec();
        let tuned_accuracy = accuracy(test.labels(), &tuned_predictions);
        tracing::info!("{TUNED_FOREST_NAME}: held-out accuracy {tuned_accuracy:.4}");

        let final_choice = reconcile(base_best.family, base_best.scores.accuracy, tuned_accuracy);
        let (final_name, final_spec) = match final_choice {
            FinalChoice::TunedForest => (
                TUNED_FOREST_NAME.to_string(),
                EstimatorSpec::RandomForest(tuning.best.params),
            ),
            FinalChoice::Base => (base_best.name.clone(), base_spec),
        };
        tracing::info!("Final model: {final_name}");

        let plan = serving_plan(final_choice, &base_spec, tuning.best.params);
        if plan.substituted {
            tracing::warn!(
                "{final_name} is not served on raw features; persisting {} instead",
                plan.name
            );
        }
        let pipeline = FittedPipeline::fit(&plan.spec, train.features(), train.labels())?;
        let served_predictions = pipeline.predict(test.features())?.to_vec();
        let served_accuracy = accuracy(test.labels(), &served_predictions);
        let served_family = pipeline.family();

        let artifact = ModelArtifact::new(plan.name.clone(), served_accuracy, pipeline);
        self.store
            .save(&artifact)
            .map_err(|e| CardiolensError::Artifact(e.into()))?;
        tracing::info!(
            "Persisted {} (held-out accuracy {served_accuracy:.4})",
            plan.name
        );

        self.record_learning_curve(&final_name, &final_spec, &data);

        Ok(SelectionOutcome {
            n_train: train.len(),
            n_test: test.len(),
            candidates,
            failures,
            base_best,
            tuning,
            tuned_accuracy,
            final_choice,
            final_name,
            served_name: plan.name,
            served_family,
            served_accuracy,
        })
    }

    fn evaluate_candidate(
        &self,
        spec: &EstimatorSpec,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<CandidateReport, ModelError> {
        let family = spec.family();
        let pipeline = FittedPipeline::fit(spec, train.features(), train.labels())?;
        let predicted = pipeline.predict(test.features())?.to_vec();
        let probabilities = pipeline.predict_proba(test.features())?.to_vec();

        let confusion = ConfusionMatrix::from_labels(test.labels(), &predicted);
        let roc = roc_curve(&probabilities, test.labels());
        self.report(
            "confusion matrix",
            self.reporter.record_confusion_matrix(family.name(), &confusion),
        );
        self.report("ROC curve", self.reporter.record_roc_curve(family.name(), &roc));

        Ok(CandidateReport {
            family,
            name: family.name().to_string(),
            scores: confusion.scores(),
            confusion,
            auc: roc.auc,
        })
    }

    fn record_learning_curve(&self, name: &str, spec: &EstimatorSpec, data: &Dataset) {
        let title = format!("Learning Curve ({name})");
        match learning_curve(spec, data, self.config.cv_folds) {
            Ok(curve) => self.report(
                "learning curve",
                self.reporter.record_learning_curve(&title, &curve),
            ),
            Err(e) => tracing::warn!("Skipping {title}: {e}"),
        }
    }

    fn report(&self, what: &str, result: Result<(), ReportError>) {
        if let Err(e) = result {
            tracing::warn!("Failed to write {what} report: {e}");
        }
    }
}

/// Highest held-out accuracy, earliest in roster order on ties.
fn best_candidate(candidates: &[CandidateReport]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if best.map_or(true, |b| candidate.scores.accuracy > candidates[b].scores.accuracy) {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::adapters::ml::{KnnParams, LogisticParams, SvmParams};
    use crate::domain::{ClinicalFeatures, FeatureId, RocCurve, FEATURE_COUNT};
    use crate::ports::{ExplorationReport, LearningCurve};

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<String> {
            self.events.lock().expect("lock").clone()
        }

        fn push(&self, event: String) -> Result<(), ReportError> {
            self.events.lock().expect("lock").push(event);
            Ok(())
        }
    }

    impl Reporter for RecordingReporter {
        fn record_exploration(&self, _: &ExplorationReport) -> Result<(), ReportError> {
            self.push("exploration".into())
        }

        fn record_confusion_matrix(
            &self,
            model: &str,
            _: &ConfusionMatrix,
        ) -> Result<(), ReportError> {
            self.push(format!("confusion:{model}"))
        }

        fn record_roc_curve(&self, model: &str, _: &RocCurve) -> Result<(), ReportError> {
            self.push(format!("roc:{model}"))
        }

        fn record_comparison(&self, rows: &[CandidateScore]) -> Result<(), ReportError> {
            self.push(format!("comparison:{}", rows.len()))
        }

        fn record_learning_curve(&self, title: &str, _: &LearningCurve) -> Result<(), ReportError> {
            self.push(format!("learning:{title}"))
        }
    }

    struct FailingReporter;

    fn broken() -> Result<(), ReportError> {
        Err(ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    impl Reporter for FailingReporter {
        fn record_exploration(&self, _: &ExplorationReport) -> Result<(), ReportError> {
            broken()
        }
        fn record_confusion_matrix(&self, _: &str, _: &ConfusionMatrix) -> Result<(), ReportError> {
            broken()
        }
        fn record_roc_curve(&self, _: &str, _: &RocCurve) -> Result<(), ReportError> {
            broken()
        }
        fn record_comparison(&self, _: &[CandidateScore]) -> Result<(), ReportError> {
            broken()
        }
        fn record_learning_curve(&self, _: &str, _: &LearningCurve) -> Result<(), ReportError> {
            broken()
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        artifact: Mutex<Option<ModelArtifact>>,
    }

    impl ModelStore for MemoryStore {
        type Error = ArtifactError;

        fn save(&self, artifact: &ModelArtifact) -> Result<(), ArtifactError> {
            *self.artifact.lock().expect("lock") = Some(artifact.clone());
            Ok(())
        }

        fn load(&self) -> Result<ModelArtifact, ArtifactError> {
            self.artifact
                .lock()
                .expect("lock")
                .clone()
                .ok_or_else(|| ArtifactError::NotFound(PathBuf::from("memory")))
        }

        fn exists(&self) -> bool {
            self.artifact.lock().expect("lock").is_some()
        }
    }

    /// Synthetic cohort where disease shifts most measurements.
    fn records(n: usize) -> Vec<LabeledRecord> {
        (0..n)
            .map(|i| {
                let sick = i % 2 == 1;
                let s = f64::from(u8::from(sick));
                let jitter = (i % 7) as f64;
                let mut v = [0.0; FEATURE_COUNT];
                v[FeatureId::Age.index()] = 45.0 + 12.0 * s + jitter;
                v[FeatureId::Sex.index()] = f64::from(u8::from(i % 3 == 0));
                v[FeatureId::ChestPain.index()] = 1.0 + 3.0 * s;
                v[FeatureId::RestingBloodPressure.index()] = 120.0 + 15.0 * s + jitter;
                v[FeatureId::Cholesterol.index()] = 210.0 + 40.0 * s - jitter;
                v[FeatureId::FastingBloodSugar.index()] = 0.0;
                v[FeatureId::RestingEcg.index()] = (i % 3) as f64;
                v[FeatureId::MaxHeartRate.index()] = 170.0 - 30.0 * s + jitter;
                v[FeatureId::ExerciseAngina.index()] = s;
                v[FeatureId::StDepression.index()] = 2.0 * s + 0.1 * (i % 4) as f64;
                v[FeatureId::Slope.index()] = 1.0 + s;
                v[FeatureId::MajorVessels.index()] = s * (1.0 + (i % 2) as f64);
                v[FeatureId::Thalassemia.index()] = 3.0 + 4.0 * s;
                LabeledRecord {
                    features: ClinicalFeatures::from_array(v),
                    severity: if sick { 1.0 + (i % 4) as f64 } else { 0.0 },
                }
            })
            .collect()
    }

    fn fast_config() -> SelectorConfig {
        let mut config = SelectorConfig::new(42);
        config.roster = vec![
            EstimatorSpec::LogisticRegression(LogisticParams::default()),
            EstimatorSpec::RandomForest(ForestParams {
                n_estimators: 10,
                ..ForestParams::default()
            }),
            EstimatorSpec::Svm(SvmParams::default()),
            EstimatorSpec::Knn(KnnParams::default()),
            EstimatorSpec::GradientBoosting(BoostingParams {
                n_estimators: 10,
                ..BoostingParams::default()
            }),
        ];
        config.grid = ForestGrid {
            n_estimators: vec![5, 10],
            max_depth: vec![None],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
        };
        config
    }

    fn candidate(family: ModelFamily, acc: f64) -> CandidateReport {
        CandidateReport {
            family,
            name: family.name().to_string(),
            scores: ClassificationScores {
                accuracy: acc,
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
            },
            confusion: ConfusionMatrix::default(),
            auc: 0.0,
        }
    }

    #[test]
    fn test_default_roster_order() {
        let config = SelectorConfig::default();
        let families: Vec<_> = config.roster.iter().map(EstimatorSpec::family).collect();
        assert_eq!(families, ModelFamily::ROSTER.to_vec());
        assert_eq!(config.grid.len(), 108);
    }

    #[test]
    fn test_best_candidate_first_wins_ties() {
        let list = vec![
            candidate(ModelFamily::LogisticRegression, 0.8),
            candidate(ModelFamily::RandomForest, 0.9),
            candidate(ModelFamily::Svm, 0.9),
        ];
        assert_eq!(best_candidate(&list), Some(1));
        assert_eq!(best_candidate(&[]), None);
    }

    #[test]
    fn test_reconcile_rules() {
        assert_eq!(reconcile(ModelFamily::Svm, 0.85, 0.86), FinalChoice::TunedForest);
        assert_eq!(reconcile(ModelFamily::Svm, 0.85, 0.85), FinalChoice::Base);
        assert_eq!(reconcile(ModelFamily::RandomForest, 0.85, 0.85), FinalChoice::TunedForest);
        assert_eq!(reconcile(ModelFamily::RandomForest, 0.85, 0.80), FinalChoice::Base);
        assert_eq!(reconcile(ModelFamily::GradientBoosting, 0.9, 0.9), FinalChoice::Base);
    }

    #[test]
    fn test_serving_plan_follows_policy() {
        let tuned = ForestParams {
            n_estimators: 200,
            ..ForestParams::default()
        };

        let plan = serving_plan(
            FinalChoice::Base,
            &EstimatorSpec::default_for(ModelFamily::GradientBoosting),
            tuned,
        );
        assert_eq!(plan.name, "Gradient Boosting");
        assert!(!plan.substituted);

        let plan = serving_plan(
            FinalChoice::Base,
            &EstimatorSpec::default_for(ModelFamily::Svm),
            tuned,
        );
        assert_eq!(plan.name, TUNED_FOREST_NAME);
        assert_eq!(plan.spec, EstimatorSpec::RandomForest(tuned));
        assert!(plan.substituted);

        let plan = serving_plan(
            FinalChoice::TunedForest,
            &EstimatorSpec::default_for(ModelFamily::LogisticRegression),
            tuned,
        );
        assert_eq!(plan.name, TUNED_FOREST_NAME);
        assert!(!plan.substituted);
    }

    #[test]
    fn test_run_persists_servable_model() {
        let reporter = Arc::new(RecordingReporter::default());
        let store = Arc::new(MemoryStore::default());
        let selector = ModelSelector::new(fast_config(), reporter.clone(), store.clone());

        let outcome = selector.run_records(&records(60)).expect("run");
        assert_eq!(outcome.n_test, 12);
        assert_eq!(outcome.n_train, 48);
        assert_eq!(outcome.candidates.len(), 5);
        assert!(outcome.failures.is_empty());
        assert!(outcome.base_best.scores.accuracy >= 0.9);
        assert!(outcome.served_family.policy().refit_for_serving);

        let artifact = store.load().expect("artifact saved");
        assert_eq!(artifact.model_name, outcome.served_name);
        assert!(!artifact.pipeline.is_scaled());
        assert_eq!(artifact.pipeline.n_features(), FEATURE_COUNT);

        let events = reporter.events();
        assert_eq!(events[0], "exploration");
        for family in ModelFamily::ROSTER {
            assert!(events.contains(&format!("confusion:{}", family.name())));
            assert!(events.contains(&format!("roc:{}", family.name())));
        }
        assert!(events.contains(&"comparison:5".to_string()));
        assert!(events.contains(&format!("learning:Learning Curve ({})", outcome.base_best.name)));
        assert!(events.contains(&format!("learning:Learning Curve ({})", outcome.final_name)));
    }

    #[test]
    fn test_failed_candidate_is_isolated() {
        let mut config = fast_config();
        config.roster[3] = EstimatorSpec::Knn(KnnParams { k: 0 });
        config.explore = false;
        let reporter = Arc::new(RecordingReporter::default());
        let store = Arc::new(MemoryStore::default());
        let selector = ModelSelector::new(config, reporter.clone(), store.clone());

        let outcome = selector.run_records(&records(60)).expect("run");
        assert_eq!(outcome.candidates.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "KNN");
        assert!(store.exists());
        assert!(!reporter.events().contains(&"exploration".to_string()));
        assert!(reporter.events().contains(&"comparison:4".to_string()));
    }

    #[test]
    fn test_no_viable_candidate() {
        let mut config = fast_config();
        config.roster = vec![EstimatorSpec::Knn(KnnParams { k: 0 })];
        let store = Arc::new(MemoryStore::default());
        let reporter = Arc::new(RecordingReporter::default());
        let selector = ModelSelector::new(config, reporter, store.clone());

        assert!(matches!(
            selector.run_records(&records(40)),
            Err(CardiolensError::NoViableCandidate)
        ));
        assert!(!store.exists());
    }

    #[test]
    fn test_reporter_failures_do_not_abort() {
        let store = Arc::new(MemoryStore::default());
        let selector = ModelSelector::new(fast_config(), Arc::new(FailingReporter), store.clone());
        selector.run_records(&records(40)).expect("run");
        assert!(store.exists());
    }

    #[test]
    fn test_missing_dataset_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::default());
        let reporter = Arc::new(RecordingReporter::default());
        let selector = ModelSelector::new(fast_config(), reporter, store.clone());

        let result = selector.run(&dir.path().join("processed.cleveland.data"));
        assert!(matches!(result, Err(CardiolensError::TrainingDataMissing(_))));
        assert!(!store.exists());
    }

    #[test]
    fn test_run_reads_and_cleans_dataset_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("processed.cleveland.data");
        let mut lines: Vec<String> = records(40)
            .iter()
            .map(|r| {
                let mut fields: Vec<String> =
                    r.features.to_vec().iter().map(f64::to_string).collect();
                fields.push(r.severity.to_string());
                fields.join(",")
            })
            .collect();
        lines.push("63.0,1.0,1.0,145.0,233.0,1.0,2.0,150.0,0.0,2.3,3.0,?,6.0,0".into());
        std::fs::write(&path, lines.join("\n")).expect("write dataset");

        let store = Arc::new(MemoryStore::default());
        let reporter = Arc::new(RecordingReporter::default());
        let selector = ModelSelector::new(fast_config(), reporter, store.clone());

        let outcome = selector.run(&path).expect("run");
        assert_eq!(outcome.n_train + outcome.n_test, 40);
        assert!(store.exists());
    }
}
