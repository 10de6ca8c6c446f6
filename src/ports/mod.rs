//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (ML library, artifact
//! storage, report sink).

mod classifier;
mod model_store;
mod reporter;

pub use classifier::{ensure_columns, Classifier, ModelError};
pub use model_store::ModelStore;
pub use reporter::{
    AgeHistogram, CandidateScore, ExplorationReport, LearningCurve, ReportError, Reporter,
    TargetDistribution,
};
