//! Labeled training data.
//!
//! The Cleveland target is a severity score 0-4; the model predicts presence,
//! so every severity above zero becomes class 1.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::features::{ClinicalFeatures, FEATURE_COUNT};

/// One cleaned dataset row before binarization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledRecord {
    pub features: ClinicalFeatures,
    /// Original diagnosis severity (0 = none, 1-4 = increasing severity)
    pub severity: f64,
}

/// Collapse a severity score to presence/absence.
#[must_use]
pub fn binarize(severity: f64) -> u8 {
    if severity > 0.0 {
        1
    } else {
        0
    }
}

/// Index sets of one cross-validation fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Feature matrix with binary labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Vec<u8>,
}

impl Dataset {
    /// Build from cleaned records, binarizing the target.
    #[must_use]
    pub fn from_records(records: &[LabeledRecord]) -> Self {
        let mut features = Array2::zeros((records.len(), FEATURE_COUNT));
        for (mut row, record) in features.outer_iter_mut().zip(records) {
            for (cell, value) in row.iter_mut().zip(record.features.to_vec()) {
                *cell = value;
            }
        }
        let labels = records.iter().map(|r| binarize(r.severity)).collect();
        Self { features, labels }
    }

    /// Build from an existing matrix and labels.
    ///
    /// # Errors
    /// Returns error if row and label counts differ.
    pub fn from_parts(features: Array2<f64>, labels: Vec<u8>) -> Result<Self, String> {
        if features.nrows() != labels.len() {
            return Err(format!(
                "Feature rows ({}) and labels ({}) differ",
                features.nrows(),
                labels.len()
            ));
        }
        Ok(Self { features, labels })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    #[must_use]
    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.features.column(index)
    }

    /// `(negatives, positives)`
    #[must_use]
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l != 0).count();
        (self.len() - positives, positives)
    }

    /// Rows at `indices`, in the given order.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Seeded shuffle split; the test part holds `ceil(test_fraction * n)` rows.
    #[must_use]
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> (Self, Self) {
        let n = self.len();
        let n_test = ((test_fraction * n as f64).ceil() as usize).min(n);

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let (test, train) = order.split_at(n_test);
        (self.subset(train), self.subset(test))
    }

    /// Stratified k-fold split without shuffling.
    ///
    /// Each class is cut into `k` contiguous runs (sizes differ by at most
    /// one), so every fold keeps roughly the overall class balance.
    ///
    /// # Errors
    /// Returns error if `k < 2` or `k` exceeds the number of rows.
    pub fn stratified_folds(&self, k: usize) -> Result<Vec<Fold>, String> {
        if k < 2 || k > self.len() {
            return Err(format!(
                "Cannot make {k} folds from {} samples",
                self.len()
            ));
        }

        let mut fold_of = vec![0usize; self.len()];
        for class in [0u8, 1u8] {
            let members: Vec<usize> = (0..self.len())
                .filter(|&i| (self.labels[i] != 0) == (class != 0))
                .collect();
            let base = members.len() / k;
            let extra = members.len() % k;

            let mut cursor = 0;
            for fold in 0..k {
                let size = base + usize::from(fold < extra);
                for &i in &members[cursor..cursor + size] {
                    fold_of[i] = fold;
                }
                cursor += size;
            }
        }

        Ok((0..k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..self.len()).partition(|&i| fold_of[i] == fold);
                Fold { train, test }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(age: f64, severity: f64) -> LabeledRecord {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = age;
        LabeledRecord {
            features: ClinicalFeatures::from_array(values),
            severity,
        }
    }

    fn toy(n: usize) -> Dataset {
        let records: Vec<_> = (0..n).map(|i| record(i as f64, (i % 5) as f64)).collect();
        Dataset::from_records(&records)
    }

    #[test]
    fn test_binarize_severity() {
        assert_eq!(binarize(0.0), 0);
        for s in [1.0, 2.0, 3.0, 4.0] {
            assert_eq!(binarize(s), 1);
        }
    }

    #[test]
    fn test_from_records_binarizes_labels() {
        let data = toy(10);
        assert_eq!(data.labels(), &[0, 1, 1, 1, 1, 0, 1, 1, 1, 1]);
        assert_eq!(data.class_counts(), (2, 8));
        assert_eq!(data.features()[[7, 0]], 7.0);
    }

    #[test]
    fn test_split_is_seeded_and_disjoint() {
        let data = toy(50);
        let (train_a, test_a) = data.train_test_split(0.2, 42);
        let (train_b, test_b) = data.train_test_split(0.2, 42);
        assert_eq!(test_a.len(), 10);
        assert_eq!(train_a.len(), 40);
        assert_eq!(test_a.column(0), test_b.column(0));
        assert_eq!(train_a.column(0), train_b.column(0));

        let mut ages: Vec<f64> = train_a
            .column(0)
            .iter()
            .chain(test_a.column(0).iter())
            .copied()
            .collect();
        ages.sort_by(f64::total_cmp);
        assert_eq!(ages, (0..50).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_test_size_rounds_up() {
        let (train, test) = toy(11).train_test_split(0.2, 7);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_stratified_folds_partition_rows() {
        let data = toy(23);
        let folds = data.stratified_folds(5).expect("folds");
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 23);
            assert!(fold.test.iter().any(|&i| data.labels()[i] == 1));
        }
    }

    #[test]
    fn test_invalid_fold_count() {
        assert!(toy(4).stratified_folds(1).is_err());
        assert!(toy(4).stratified_folds(5).is_err());
    }
}
