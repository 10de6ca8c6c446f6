//! Classification metrics for held-out evaluation.
//!
//! Provides confusion matrix, accuracy, precision, recall, F1, ROC curve and
//! AUC, plus Pearson correlation used by exploratory analysis.

use serde::{Deserialize, Serialize};

/// Binary confusion matrix, laid out as `[[tn, fp], [fn, tp]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Tally predictions against ground truth. Any non-zero label is class 1.
    #[must_use]
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&a, &p) in actual.iter().zip(predicted.iter()) {
            match (a != 0, p != 0) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        cm
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    #[must_use]
    pub fn rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// Zero when nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// Zero when there are no actual positives.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    #[must_use]
    pub fn scores(&self) -> ClassificationScores {
        ClassificationScores {
            accuracy: self.accuracy(),
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Headline scores for one model on one split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScores {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Fraction of matching labels.
#[must_use]
pub fn accuracy(actual: &[u8], predicted: &[u8]) -> f64 {
    let hits = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a == p)
        .count();
    ratio(hits, actual.len().min(predicted.len()))
}

/// Receiver operating characteristic curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub false_positive_rate: Vec<f64>,
    pub true_positive_rate: Vec<f64>,
    /// Decreasing; the first entry is `max(score) + 1` so the curve starts at (0, 0).
    pub thresholds: Vec<f64>,
    pub auc: f64,
}

/// Compute the ROC curve for class-1 scores, one point per distinct score.
#[must_use]
pub fn roc_curve(scores: &[f64], labels: &[u8]) -> RocCurve {
    let mut pairs: Vec<(f64, bool)> = scores
        .iter()
        .zip(labels.iter())
        .map(|(&s, &l)| (s, l != 0))
        .collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let n_pos = pairs.iter().filter(|(_, l)| *l).count();
    let n_neg = pairs.len() - n_pos;

    let start = pairs.first().map_or(1.0, |(s, _)| s + 1.0);
    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![start];

    let (mut tp, mut fp) = (0usize, 0usize);
    for (i, &(score, positive)) in pairs.iter().enumerate() {
        if positive {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_run = pairs.get(i + 1).map_or(true, |next| next.0 != score);
        if last_of_run {
            fpr.push(ratio(fp, n_neg));
            tpr.push(ratio(tp, n_pos));
            thresholds.push(score);
        }
    }

    let auc = trapezoid_auc(&fpr, &tpr);
    RocCurve {
        false_positive_rate: fpr,
        true_positive_rate: tpr,
        thresholds,
        auc,
    }
}

/// Area under a piecewise-linear curve with non-decreasing `x`.
#[must_use]
pub fn trapezoid_auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Pearson correlation coefficient; 0.0 if either series is constant.
#[must_use]
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        0.0
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}
