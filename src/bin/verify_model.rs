//! Smoke check for a persisted serving artifact.
//!
//! Loads the artifact the way the server does (manifest hash included) and
//! predicts the first record of the Cleveland dataset.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin verify_model -- [model_dir]
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array2;

use cardiolens::adapters::FileModelStore;
use cardiolens::config::{DEFAULT_MODEL_DIR, MODEL_DIR_ENV};
use cardiolens::domain::FEATURE_COUNT;
use cardiolens::ports::{Classifier, ModelStore};

/// First row of processed.cleveland.data (severity 0).
const SAMPLE: [f64; FEATURE_COUNT] = [
    63.0, 1.0, 1.0, 145.0, 233.0, 1.0, 2.0, 150.0, 0.0, 2.3, 3.0, 0.0, 6.0,
];

fn main() -> Result<()> {
    let _guard = cardiolens::telemetry::init(Path::new("logs/verify_model.log"))?;

    let model_dir = env::args()
        .nth(1)
        .or_else(|| env::var(MODEL_DIR_ENV).ok())
        .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from);

    let store = FileModelStore::new(&model_dir);
    let artifact = store
        .load()
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))?;

    println!("Model:               {}", artifact.model_name);
    println!("Family:              {}", artifact.family);
    println!("Trained at:          {}", artifact.trained_at);
    println!("Held-out accuracy:   {:.4}", artifact.held_out_accuracy);

    let x = Array2::from_shape_vec((1, FEATURE_COUNT), SAMPLE.to_vec())?;
    let label = artifact.pipeline.predict(x.view())?[0];
    let positive = artifact.pipeline.predict_proba(x.view())?[0];

    println!("Prediction:          {label}");
    println!(
        "Probabilities:       [no disease {:.4}, disease {:.4}]",
        1.0 - positive,
        positive
    );
    if let Some(importances) = artifact.pipeline.feature_importances() {
        println!("Feature importances: {importances:.3?}");
    }
    Ok(())
}
