//! Inference service: Orchestrates the prediction path.
//!
//! This service coordinates:
//! - Request parsing and feature encoding
//! - Classification by the loaded model
//! - Explanation of positive predictions
//!
//! It holds no mutable state and is shared across requests behind an `Arc`.

use std::sync::Arc;

use ndarray::Array2;

use crate::domain::{
    explain, ClinicalFeatures, Diagnosis, ExternalRecord, FeatureCodec, FeatureImportances, Label,
    Prediction, FEATURE_COUNT,
};
use crate::ports::{Classifier, ModelStore};
use crate::CardiolensError;

/// The loaded model, or the reason there is none.
#[derive(Clone)]
pub enum Predictor {
    Ready {
        model: Arc<dyn Classifier>,
        /// `None` when the model exposes no usable importances
        importances: Option<FeatureImportances>,
    },
    Unavailable {
        reason: String,
    },
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready { importances, .. } => f
                .debug_struct("Ready")
                .field("has_importances", &importances.is_some())
                .finish(),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

impl Predictor {
    /// Wrap a fitted model, extracting its importances once.
    #[must_use]
    pub fn ready(model: Arc<dyn Classifier>) -> Self {
        let importances = match model.feature_importances() {
            Some(weights) => {
                let parsed = FeatureImportances::from_weights(&weights);
                if parsed.is_none() {
                    tracing::warn!(
                        "Model importances are unusable ({} values); contributors will be empty",
                        weights.len()
                    );
                }
                parsed
            }
            None => {
                tracing::info!("Model exposes no feature importances; contributors will be empty");
                None
            }
        };
        Self::Ready { model, importances }
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Load from a store; any failure yields the unavailable state.
    pub fn from_store<S: ModelStore>(store: &S) -> Self {
        match store.load() {
            Ok(artifact) => {
                tracing::info!("Serving model: {}", artifact.model_name);
                Self::ready(Arc::new(artifact.pipeline))
            }
            Err(e) => {
                tracing::error!("Failed to load model: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    #[must_use]
    pub fn importances(&self) -> Option<&FeatureImportances> {
        match self {
            Self::Ready { importances, .. } => importances.as_ref(),
            Self::Unavailable { .. } => None,
        }
    }

    /// Classify one encoded record.
    ///
    /// # Errors
    /// Returns `CardiolensError::ModelUnavailable` if no model is loaded, or
    /// `CardiolensError::Model` if the classifier fails.
    pub fn predict(&self, features: &ClinicalFeatures) -> Result<Prediction, CardiolensError> {
        let Self::Ready { model, .. } = self else {
            return Err(CardiolensError::ModelUnavailable);
        };

        let values = features.to_vec();
        let x = Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| values[j]);
        let probability = model.predict_proba(x.view())?[0];
        let class = model.predict(x.view())?[0];

        Ok(Prediction {
            label: Label::from_class(class),
            probability,
        })
    }
}

/// Service for answering prediction requests.
#[derive(Debug, Clone)]
pub struct InferenceService {
    predictor: Predictor,
    codec: FeatureCodec,
}

impl InferenceService {
    #[must_use]
    pub fn new(predictor: Predictor, codec: FeatureCodec) -> Self {
        Self { predictor, codec }
    }

    #[must_use]
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    fn ensure_ready(&self) -> Result<(), CardiolensError> {
        if self.predictor.is_ready() {
            Ok(())
        } else {
            Err(CardiolensError::ModelUnavailable)
        }
    }

    /// Encode, classify and explain one record.
    ///
    /// # Errors
    /// Returns error if the model is unavailable, a categorical value is
    /// rejected by the codec, or classification fails.
    pub fn predict_record(&self, record: &ExternalRecord) -> Result<Diagnosis, CardiolensError> {
        self.ensure_ready()?;

        let features = self.codec.encode(record)?;
        tracing::debug!("Encoded features: {:?}", features.to_vec());

        let prediction = self.predictor.predict(&features)?;
        let contributors = explain(&features, prediction.label, self.predictor.importances());

        tracing::info!(
            "Prediction: label={}, probability={:.4}, contributors={}",
            prediction.label,
            prediction.probability,
            contributors.len()
        );
        Ok(Diagnosis::new(prediction, &contributors))
    }

    /// Handle a parsed JSON body.
    ///
    /// Availability is checked before the body is inspected.
    ///
    /// # Errors
    /// As `predict_record`, plus validation errors for the body.
    pub fn predict_json(&self, body: &serde_json::Value) -> Result<Diagnosis, CardiolensError> {
        self.ensure_ready()?;
        let record = ExternalRecord::from_json(body)?;
        self.predict_record(&record)
    }

    /// Handle a raw request body.
    ///
    /// # Errors
    /// As `predict_json`, plus `ValidationError::MalformedJson`.
    pub fn predict_bytes(&self, body: &[u8]) -> Result<Diagnosis, CardiolensError> {
        self.ensure_ready()?;
        let record = ExternalRecord::from_json_bytes(body)?;
        self.predict_record(&record)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixedClassifier;
    use super::*;
    use crate::domain::CategoryPolicy;
    use serde_json::json;

    const IMPORTANCES: [f64; FEATURE_COUNT] = [
        0.08, 0.03, 0.12, 0.07, 0.07, 0.01, 0.02, 0.11, 0.06, 0.12, 0.05, 0.14, 0.12,
    ];

    fn scenario_a() -> serde_json::Value {
        json!({
            "age": 63, "sex": 1, "cp": 0, "trestbps": 145, "chol": 233, "fbs": 1,
            "restecg": 2, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 2,
            "ca": 0, "thal": 1
        })
    }

    fn service(model: Arc<FixedClassifier>) -> InferenceService {
        InferenceService::new(Predictor::ready(model), FeatureCodec::default())
    }

    #[test]
    fn test_positive_prediction_is_explained() {
        let model = Arc::new(FixedClassifier::new(0.8, Some(IMPORTANCES.to_vec())));
        let diagnosis = service(model.clone()).predict_json(&scenario_a()).expect("predict");

        assert_eq!(diagnosis.prediction, 1);
        assert!((diagnosis.probability - 0.8).abs() < 1e-12);
        // Flagged on the internal scale: age, sex, cp=1, bp, fbs, ecg, oldpeak,
        // slope=3, thal=6. Top weights: cp, oldpeak, thal (tie, canonical order).
        assert_eq!(
            diagnosis.contributors,
            vec!["Chest Pain", "ST Depression", "Thalassemia"]
        );
        assert_eq!(model.call_count(), 1);
    }

    #[test]
    fn test_negative_prediction_has_no_contributors() {
        let model = Arc::new(FixedClassifier::new(0.2, Some(IMPORTANCES.to_vec())));
        let diagnosis = service(model).predict_json(&scenario_a()).expect("predict");
        assert_eq!(diagnosis.prediction, 0);
        assert!(diagnosis.contributors.is_empty());
    }

    #[test]
    fn test_model_without_importances_degrades() {
        let model = Arc::new(FixedClassifier::new(0.9, None));
        let svc = service(model);
        assert!(svc.predictor().importances().is_none());
        let diagnosis = svc.predict_json(&scenario_a()).expect("predict");
        assert_eq!(diagnosis.prediction, 1);
        assert!(diagnosis.contributors.is_empty());
    }

    #[test]
    fn test_malformed_importances_degrade() {
        let model = Arc::new(FixedClassifier::new(0.9, Some(vec![0.5; 4])));
        let diagnosis = service(model).predict_json(&scenario_a()).expect("predict");
        assert!(diagnosis.contributors.is_empty());
    }

    #[test]
    fn test_unavailable_model() {
        let svc = InferenceService::new(
            Predictor::unavailable("no artifact"),
            FeatureCodec::default(),
        );
        assert!(matches!(
            svc.predict_json(&scenario_a()),
            Err(CardiolensError::ModelUnavailable)
        ));
        // Unavailable wins over malformed input.
        assert!(matches!(
            svc.predict_bytes(b"not json"),
            Err(CardiolensError::ModelUnavailable)
        ));
    }

    #[test]
    fn test_non_numeric_age_never_reaches_model() {
        let model = Arc::new(FixedClassifier::new(0.8, None));
        let svc = service(model.clone());
        let mut body = scenario_a();
        body["age"] = json!("sixty-three");

        assert!(matches!(
            svc.predict_json(&body),
            Err(CardiolensError::Validation(_))
        ));
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_strict_policy_rejects_out_of_domain_thal() {
        let model = Arc::new(FixedClassifier::new(0.8, None));
        let svc = InferenceService::new(
            Predictor::ready(model.clone()),
            FeatureCodec::new(CategoryPolicy::Strict),
        );
        let mut body = scenario_a();
        body["thal"] = json!(5);
        assert!(matches!(
            svc.predict_json(&body),
            Err(CardiolensError::Validation(_))
        ));
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let model = Arc::new(FixedClassifier::new(0.7, Some(IMPORTANCES.to_vec())));
        let svc = service(model);
        let first = svc.predict_json(&scenario_a()).expect("predict");
        let second = svc.predict_json(&scenario_a()).expect("predict");
        assert_eq!(first, second);
    }
}
