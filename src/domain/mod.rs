//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Feature encoding, the
//! risk heuristics and the explainer live here so they can be tested without
//! a model or a running service.

pub mod codec;
pub mod dataset;
mod diagnosis;
pub mod explain;
mod features;
pub mod metrics;
pub mod risk;

pub use codec::{CategoryPolicy, ExternalRecord, FeatureCodec, ValidationError};
pub use dataset::{binarize, Dataset, Fold, LabeledRecord};
pub use diagnosis::{Diagnosis, Label, Prediction};
pub use explain::{explain, ContributorList, FeatureImportances, MAX_CONTRIBUTORS};
pub use features::{feature_names, ClinicalFeatures, FeatureId, FEATURE_COUNT};
pub use metrics::{ClassificationScores, ConfusionMatrix, RocCurve};
