//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application:
//! - `inference`: the serving-side predictor and request handling
//! - `selection`: the offline training run
//! - `tuning` and `exploration`: cross-validation and dataset statistics
//!   used by the training run

pub mod exploration;
pub mod inference;
pub mod selection;
pub mod tuning;

pub use exploration::explore;
pub use inference::{InferenceService, Predictor};
pub use selection::{
    CandidateFailure, CandidateReport, FinalChoice, ModelSelector, SelectionOutcome,
    SelectorConfig, TUNED_FOREST_NAME,
};
pub use tuning::{ForestGrid, GridPoint, GridSearchResult};
