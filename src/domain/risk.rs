//! Risk heuristic table.
//!
//! One fixed predicate per feature, evaluated on the internal (post-codec)
//! encoding, flagging values a clinician would call abnormal. These are
//! domain heuristics, not learned thresholds.

use super::features::{ClinicalFeatures, FeatureId, FEATURE_COUNT};

/// Comparison applied to a single feature value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Above(f64),
    AtLeast(f64),
    Below(f64),
    Equals(f64),
    NotEquals(f64),
}

impl Threshold {
    #[must_use]
    pub fn holds(self, value: f64) -> bool {
        match self {
            Self::Above(t) => value > t,
            Self::AtLeast(t) => value >= t,
            Self::Below(t) => value < t,
            Self::Equals(t) => value == t,
            Self::NotEquals(t) => value != t,
        }
    }
}

/// A `(feature, predicate)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskRule {
    pub feature: FeatureId,
    pub threshold: Threshold,
}

impl RiskRule {
    /// Whether this record's value for the rule's feature is abnormal.
    #[must_use]
    pub fn is_flagged(&self, features: &ClinicalFeatures) -> bool {
        self.threshold.holds(features.get(self.feature))
    }
}

/// The heuristic table, in canonical feature order.
///
/// NOTE: the sex rule flags every male patient, so "Sex" is close to a
/// constant contributor for men. Pending clinical review; keep as is.
#[rustfmt::skip]
pub static RISK_TABLE: [RiskRule; FEATURE_COUNT] = [
    RiskRule { feature: FeatureId::Age, threshold: Threshold::Above(55.0) },
    RiskRule { feature: FeatureId::Sex, threshold: Threshold::Equals(1.0) },
    // 4 = asymptomatic; 1-3 are pain types
    RiskRule { feature: FeatureId::ChestPain, threshold: Threshold::NotEquals(4.0) },
    RiskRule { feature: FeatureId::RestingBloodPressure, threshold: Threshold::Above(135.0) },
    RiskRule { feature: FeatureId::Cholesterol, threshold: Threshold::Above(240.0) },
    RiskRule { feature: FeatureId::FastingBloodSugar, threshold: Threshold::Equals(1.0) },
    RiskRule { feature: FeatureId::RestingEcg, threshold: Threshold::Above(0.0) },
    RiskRule { feature: FeatureId::MaxHeartRate, threshold: Threshold::Below(120.0) },
    RiskRule { feature: FeatureId::ExerciseAngina, threshold: Threshold::Equals(1.0) },
    RiskRule { feature: FeatureId::StDepression, threshold: Threshold::Above(1.0) },
    // 2 = flat, 3 = downsloping
    RiskRule { feature: FeatureId::Slope, threshold: Threshold::NotEquals(1.0) },
    RiskRule { feature: FeatureId::MajorVessels, threshold: Threshold::Above(0.0) },
    // 6 = fixed defect, 7 = reversible defect
    RiskRule { feature: FeatureId::Thalassemia, threshold: Threshold::AtLeast(6.0) },
];

/// Features flagged abnormal for this record, in canonical order.
#[must_use]
pub fn flagged_features(features: &ClinicalFeatures) -> Vec<FeatureId> {
    RISK_TABLE
        .iter()
        .filter(|rule| rule.is_flagged(features))
        .map(|rule| rule.feature)
        .collect()
}
