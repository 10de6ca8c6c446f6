//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `ml`: ndarray estimators behind the `Classifier` port
//! - `artifact`: JSON model artifacts with a SHA-256 manifest
//! - `dataset`: the Cleveland data file reader
//! - `report`: JSON and CSV training reports
//! - `http`: axum routes for the prediction service

pub mod artifact;
pub mod dataset;
pub mod http;
pub mod ml;
pub mod report;

pub use artifact::{ArtifactError, FileModelStore};
pub use dataset::{read_dataset, DatasetError};
pub use http::router;
pub use report::FileReporter;
