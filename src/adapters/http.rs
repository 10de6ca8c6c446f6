//! HTTP boundary.
//!
//! Routes:
//! - `GET /`: health probe, static text
//! - `POST /predict`: JSON record in, `Diagnosis` JSON out
//!
//! Error bodies are `{"error": "<message>"}`: 503 when no model is loaded,
//! 400 for everything else.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::InferenceService;
use crate::CardiolensError;

pub const HEALTH_MESSAGE: &str = "Heart Disease Prediction API is running!";

/// Build the application router around a shared service.
pub fn router(service: Arc<InferenceService>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

async fn predict(State(service): State<Arc<InferenceService>>, body: Bytes) -> Response {
    match service.predict_bytes(&body) {
        Ok(diagnosis) => (StatusCode::OK, Json(diagnosis)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &CardiolensError) -> Response {
    let status = match err {
        CardiolensError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        CardiolensError::Validation(_) => {
            tracing::debug!("Rejected request: {err}");
            StatusCode::BAD_REQUEST
        }
        _ => {
            tracing::warn!("Prediction failed: {err}");
            StatusCode::BAD_REQUEST
        }
    };
    let message = match err {
        CardiolensError::Validation(inner) => inner.to_string(),
        other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inference::testing::FixedClassifier;
    use crate::application::Predictor;
    use crate::domain::FeatureCodec;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    const BODY: &str = r#"{"age":63,"sex":1,"cp":0,"trestbps":145,"chol":233,"fbs":1,
        "restecg":2,"thalach":150,"exang":0,"oldpeak":2.3,"slope":2,"ca":0,"thal":1}"#;

    fn app(predictor: Predictor) -> Router {
        router(Arc::new(InferenceService::new(predictor, FeatureCodec::default())))
    }

    fn ready() -> Predictor {
        Predictor::ready(Arc::new(FixedClassifier::new(
            0.75,
            Some(vec![1.0 / 13.0; 13]),
        )))
    }

    async fn post_predict(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(ready())
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], HEALTH_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_predict_success_shape() {
        let (status, json) = post_predict(app(ready()), BODY).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["prediction"], 1);
        assert_eq!(json["probability"], 0.75);
        let contributors = json["contributors"].as_array().expect("array");
        assert_eq!(contributors.len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_model_is_503() {
        let (status, json) = post_predict(app(Predictor::unavailable("missing")), BODY).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Model not loaded. Service unavailable.");
    }

    #[tokio::test]
    async fn test_bad_input_is_400() {
        let (status, json) = post_predict(app(ready()), r#"{"age":"abc"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().expect("message").contains("age"));

        let (status, _) = post_predict(app(ready()), "[1, 2, 3]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_predict(app(ready()), "{").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
