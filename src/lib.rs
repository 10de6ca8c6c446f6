//! # Cardiolens
//!
//! Heart-disease prediction from 13 clinical measurements.
//!
//! This crate provides:
//! - An HTTP prediction service returning a label, a probability and up to
//!   three contributing risk factors
//! - An offline pipeline that compares five classifier families, tunes a
//!   random forest and persists the serving artifact
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and rules (feature codec, risk table, explainer)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (estimators, artifact files,
//!   dataset reader, reports, HTTP)
//! - `application`: Use cases orchestrating domain and ports

use std::path::PathBuf;

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

pub use domain::{ClinicalFeatures, Diagnosis, Label};

/// Result type for Cardiolens operations
pub type Result<T> = std::result::Result<T, CardiolensError>;

/// Main error type for Cardiolens
#[derive(Debug, thiserror::Error)]
pub enum CardiolensError {
    #[error("Model not loaded. Service unavailable.")]
    ModelUnavailable,

    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Training data not found at {0}")]
    TrainingDataMissing(PathBuf),

    #[error("Dataset error: {0}")]
    Dataset(adapters::DatasetError),

    #[error("No candidate model could be trained")]
    NoViableCandidate,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<adapters::DatasetError> for CardiolensError {
    fn from(err: adapters::DatasetError) -> Self {
        match err {
            adapters::DatasetError::NotFound(path) => Self::TrainingDataMissing(path),
            other => Self::Dataset(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dataset_maps_to_training_data_missing() {
        let err: CardiolensError =
            adapters::DatasetError::NotFound(PathBuf::from("processed.cleveland.data")).into();
        assert!(matches!(err, CardiolensError::TrainingDataMissing(_)));

        let err: CardiolensError = adapters::DatasetError::Empty.into();
        assert!(matches!(err, CardiolensError::Dataset(_)));
    }

    #[test]
    fn test_unavailable_message() {
        assert_eq!(
            CardiolensError::ModelUnavailable.to_string(),
            "Model not loaded. Service unavailable."
        );
    }
}
