//! Exploratory statistics over the cleaned, binarized dataset.

use crate::domain::metrics::pearson;
use crate::domain::{Dataset, FeatureId};
use crate::ports::{AgeHistogram, ExplorationReport, TargetDistribution};

/// Bins of the age histogram.
pub const AGE_BINS: usize = 20;

const TARGET_COLUMN: &str = "target";

/// Summarize `data` for the exploration charts.
#[must_use]
pub fn explore(data: &Dataset) -> ExplorationReport {
    let labels: Vec<f64> = data.labels().iter().map(|&l| f64::from(l)).collect();

    let mut columns: Vec<String> = FeatureId::ALL.iter().map(|f| f.key().to_string()).collect();
    columns.push(TARGET_COLUMN.to_string());

    let mut series: Vec<Vec<f64>> = FeatureId::ALL
        .iter()
        .map(|f| data.column(f.index()).to_vec())
        .collect();
    series.push(labels.clone());

    let correlation: Vec<Vec<f64>> = series
        .iter()
        .enumerate()
        .map(|(i, a)| {
            series
                .iter()
                .enumerate()
                .map(|(j, b)| if i == j { 1.0 } else { pearson(a, b) })
                .collect()
        })
        .collect();

    let mut target_correlation: Vec<(String, f64)> = FeatureId::ALL
        .iter()
        .map(|f| (f.key().to_string(), correlation[f.index()][FeatureId::ALL.len()]))
        .collect();
    target_correlation.sort_by(|a, b| a.1.total_cmp(&b.1));

    let (healthy, disease) = data.class_counts();
    let ages = data.column(FeatureId::Age.index()).to_vec();

    ExplorationReport {
        n_rows: data.len(),
        columns,
        correlation,
        target_distribution: TargetDistribution { healthy, disease },
        age_histogram: age_histogram(&ages, data.labels(), AGE_BINS),
        target_correlation,
    }
}

/// Equal-width histogram of `values`, counted separately per class.
/// The last bin is closed on the right.
#[must_use]
pub fn age_histogram(values: &[f64], labels: &[u8], bins: usize) -> AgeHistogram {
    if values.is_empty() || bins == 0 {
        return AgeHistogram::default();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let bin_edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut healthy = vec![0; bins];
    let mut disease = vec![0; bins];
    for (&v, &label) in values.iter().zip(labels) {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        if label == 0 {
            healthy[bin] += 1;
        } else {
            disease[bin] += 1;
        }
    }

    AgeHistogram {
        bin_edges,
        healthy,
        disease,
    }
}
