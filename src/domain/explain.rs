//! Local explanation of positive predictions.
//!
//! A feature is reported as a contributor when it is both flagged abnormal by
//! the risk heuristic table and weighted by the model's global importances.
//! Importances are used as given; they are not assumed to sum to 1.

use serde::{Deserialize, Serialize};

use super::diagnosis::Label;
use super::features::{ClinicalFeatures, FeatureId, FEATURE_COUNT};
use super::risk::RISK_TABLE;

/// Upper bound on reported contributors.
pub const MAX_CONTRIBUTORS: usize = 3;

/// Global feature-importance weights, one per feature in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportances {
    weights: [f64; FEATURE_COUNT],
}

impl FeatureImportances {
    /// Wrap raw weights from a model.
    ///
    /// Returns `None` if the length is wrong or any weight is negative or NaN,
    /// in which case callers degrade to an empty explanation.
    #[must_use]
    pub fn from_weights(weights: &[f64]) -> Option<Self> {
        let weights: [f64; FEATURE_COUNT] = weights.try_into().ok()?;
        if weights.iter().any(|w| w.is_nan() || *w < 0.0) {
            return None;
        }
        Some(Self { weights })
    }

    #[must_use]
    pub fn weight(&self, feature: FeatureId) -> f64 {
        self.weights[feature.index()]
    }
}

/// Ordered contributing features, most important first, at most three.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorList {
    features: Vec<FeatureId>,
}

impl ContributorList {
    #[must_use]
    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Names as shown to end users.
    #[must_use]
    pub fn display_names(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|f| f.display_name().to_string())
            .collect()
    }
}

/// Explain a prediction.
///
/// Negative predictions and models without importances yield an empty list.
/// Equal weights keep canonical feature order (stable sort).
#[must_use]
pub fn explain(
    features: &ClinicalFeatures,
    label: Label,
    importances: Option<&FeatureImportances>,
) -> ContributorList {
    if label == Label::Negative {
        return ContributorList::default();
    }

    let Some(importances) = importances else {
        tracing::debug!("Model exposes no feature importances, contributors left empty");
        return ContributorList::default();
    };

    let mut candidates: Vec<(FeatureId, f64)> = RISK_TABLE
        .iter()
        .filter(|rule| rule.is_flagged(features))
        .map(|rule| (rule.feature, importances.weight(rule.feature)))
        .collect();

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates.truncate(MAX_CONTRIBUTORS);

    ContributorList {
        features: candidates.into_iter().map(|(f, _)| f).collect(),
    }
}
