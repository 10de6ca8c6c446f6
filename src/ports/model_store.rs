//! Model store port: Trait for persisting the serving artifact.
//!
//! This trait abstracts the artifact format and location from the training
//! pipeline and the serving process.

use crate::adapters::ml::ModelArtifact;

/// Trait for serving-artifact persistence.
///
/// A store holds at most one artifact; `save` replaces the previous one.
pub trait ModelStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist an artifact.
    ///
    /// Implementations must never leave a partially written artifact behind.
    ///
    /// # Errors
    /// Returns error if serialization or the write fails.
    fn save(&self, artifact: &ModelArtifact) -> Result<(), Self::Error>;

    /// Load and validate the stored artifact.
    ///
    /// # Errors
    /// Returns error if the artifact is missing, corrupted or incompatible.
    fn load(&self) -> Result<ModelArtifact, Self::Error>;

    /// Check if an artifact is present.
    fn exists(&self) -> bool;
}
