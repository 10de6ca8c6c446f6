//! Cross-validation, random-forest grid search and learning curves.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::adapters::ml::{EstimatorSpec, FittedPipeline, ForestParams};
use crate::domain::metrics::accuracy;
use crate::domain::{Dataset, Fold};
use crate::ports::{Classifier, LearningCurve, ModelError};

/// Folds used by grid search and learning curves.
pub const CV_FOLDS: usize = 5;

/// Relative training sizes of a learning curve, `linspace(0.1, 1.0, 5)`.
pub const LEARNING_CURVE_FRACTIONS: [f64; 5] = [0.1, 0.325, 0.55, 0.775, 1.0];

/// Hyper-parameter grid for the random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ForestGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            max_depth: vec![None, Some(10), Some(20), Some(30)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
        }
    }
}

impl ForestGrid {
    /// Every combination, keys in alphabetical order with the last key
    /// (`n_estimators`) varying fastest.
    #[must_use]
    pub fn candidates(&self, seed: u64) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &max_depth in &self.max_depth {
            for &min_samples_leaf in &self.min_samples_leaf {
                for &min_samples_split in &self.min_samples_split {
                    for &n_estimators in &self.n_estimators {
                        out.push(ForestParams {
                            n_estimators,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                            seed,
                        });
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validated score of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub params: ForestParams,
    pub mean_accuracy: f64,
    pub std_accuracy: f64,
}

/// Outcome of a grid search.
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best: GridPoint,
    /// Scored points in enumeration order
    pub evaluated: Vec<GridPoint>,
    /// Points whose fit failed on some fold
    pub failed: usize,
    /// Best parameters refitted on the whole search set
    pub model: FittedPipeline,
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn fit_and_score(
    spec: &EstimatorSpec,
    train: &Dataset,
    test: &Dataset,
) -> Result<(f64, f64), ModelError> {
    let pipeline = FittedPipeline::fit(spec, train.features(), train.labels())?;
    let on_train = pipeline.predict(train.features())?.to_vec();
    let on_test = pipeline.predict(test.features())?.to_vec();
    Ok((
        accuracy(train.labels(), &on_train),
        accuracy(test.labels(), &on_test),
    ))
}

/// Held-out accuracy on each fold.
///
/// # Errors
/// Returns the first fitting or prediction error.
pub fn cross_val_accuracy(
    spec: &EstimatorSpec,
    data: &Dataset,
    folds: &[Fold],
) -> Result<Vec<f64>, ModelError> {
    folds
        .iter()
        .map(|fold| {
            let train = data.subset(&fold.train);
            let test = data.subset(&fold.test);
            let pipeline = FittedPipeline::fit(spec, train.features(), train.labels())?;
            let predicted = pipeline.predict(test.features())?.to_vec();
            Ok(accuracy(test.labels(), &predicted))
        })
        .collect()
}

/// Exhaustive search over `grid` with stratified k-fold accuracy.
///
/// Grid points are evaluated in parallel; the best is the highest mean
/// accuracy, earliest in enumeration order on ties.
///
/// # Errors
/// Returns error if folds cannot be built, the grid is empty, every point
/// fails, or the final refit fails.
pub fn grid_search(
    grid: &ForestGrid,
    data: &Dataset,
    folds: usize,
    seed: u64,
) -> Result<GridSearchResult, ModelError> {
    let folds = data
        .stratified_folds(folds)
        .map_err(ModelError::InvalidParameter)?;
    let candidates = grid.candidates(seed);
    if candidates.is_empty() {
        return Err(ModelError::InvalidParameter("Empty parameter grid".into()));
    }

    tracing::info!(
        "Grid search: {} candidates x {} folds",
        candidates.len(),
        folds.len()
    );

    let results: Vec<Result<GridPoint, ModelError>> = candidates
        .par_iter()
        .map(|params| {
            let scores = cross_val_accuracy(&EstimatorSpec::RandomForest(*params), data, &folds)?;
            let (mean_accuracy, std_accuracy) = mean_std(&scores);
            Ok(GridPoint {
                params: *params,
                mean_accuracy,
                std_accuracy,
            })
        })
        .collect();

    let mut evaluated = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (params, result) in candidates.iter().zip(results) {
        match result {
            Ok(point) => evaluated.push(point),
            Err(e) => {
                failed += 1;
                tracing::warn!("Grid point {params:?} failed: {e}");
            }
        }
    }

    let mut best: Option<&GridPoint> = None;
    for point in &evaluated {
        if best.map_or(true, |b| point.mean_accuracy > b.mean_accuracy) {
            best = Some(point);
        }
    }
    let best = best
        .cloned()
        .ok_or_else(|| ModelError::InvalidParameter("Every grid point failed".into()))?;

    tracing::info!(
        "Best parameters: {:?} (cv accuracy {:.4} +/- {:.4})",
        best.params,
        best.mean_accuracy,
        best.std_accuracy
    );

    let model = FittedPipeline::fit(
        &EstimatorSpec::RandomForest(best.params),
        data.features(),
        data.labels(),
    )?;

    Ok(GridSearchResult {
        best,
        evaluated,
        failed,
        model,
    })
}

/// Training and validation accuracy as the training set grows.
///
/// Sizes are fractions of the first fold's training set; each fold trains
/// on the leading rows of its training indices. Sizes where every fold
/// fails (for example a single-class prefix) are left out.
///
/// # Errors
/// Returns error if folds cannot be built.
pub fn learning_curve(
    spec: &EstimatorSpec,
    data: &Dataset,
    folds: usize,
) -> Result<LearningCurve, ModelError> {
    let folds = data
        .stratified_folds(folds)
        .map_err(ModelError::InvalidParameter)?;
    let max_train = folds.first().map_or(0, |f| f.train.len());

    let mut sizes: Vec<usize> = LEARNING_CURVE_FRACTIONS
        .iter()
        .map(|f| ((f * max_train as f64) as usize).max(1))
        .collect();
    sizes.dedup();

    let mut curve = LearningCurve::default();
    for size in sizes {
        let mut train_scores = Vec::new();
        let mut test_scores = Vec::new();
        for fold in &folds {
            let prefix = &fold.train[..size.min(fold.train.len())];
            let train = data.subset(prefix);
            let test = data.subset(&fold.test);
            match fit_and_score(spec, &train, &test) {
                Ok((on_train, on_test)) => {
                    train_scores.push(on_train);
                    test_scores.push(on_test);
                }
                Err(e) => tracing::debug!("Learning curve point n={size} skipped a fold: {e}"),
            }
        }
        if train_scores.is_empty() {
            continue;
        }

        let (train_mean, train_std) = mean_std(&train_scores);
        let (test_mean, test_std) = mean_std(&test_scores);
        curve.train_sizes.push(size);
        curve.train_scores_mean.push(train_mean);
        curve.train_scores_std.push(train_std);
        curve.test_scores_mean.push(test_mean);
        curve.test_scores_std.push(test_std);
    }
    Ok(curve)
}
