//! Cardiolens: heart-disease prediction service.
//!
//! Main entry point for the HTTP server. The serving artifact is loaded once
//! at startup; if it is missing or fails verification the server still
//! starts and answers predictions with 503.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use cardiolens::adapters::{router, FileModelStore};
use cardiolens::application::{InferenceService, Predictor};
use cardiolens::config::ServeConfig;
use cardiolens::domain::FeatureCodec;

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = cardiolens::telemetry::init(Path::new("logs/cardiolens.log"))?;

    let config = ServeConfig::from_env()?;
    tracing::info!("Starting Cardiolens...");

    let store = FileModelStore::new(&config.model_dir);
    let predictor = Predictor::from_store(&store);
    if predictor.is_ready() {
        tracing::info!("Model loaded from {:?}", config.model_dir);
    } else {
        tracing::warn!("Serving without a model; /predict will return 503");
    }

    let service = Arc::new(InferenceService::new(
        predictor,
        FeatureCodec::new(config.category_policy),
    ));
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Cardiolens shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
