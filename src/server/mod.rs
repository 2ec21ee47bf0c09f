//! HTTP layer: router assembly, shared state, and the error-to-response
//! mapping.
//!
//! Endpoints:
//!
//! - `GET /` - service metadata and the served model keys
//! - `GET /health` - per-model load status
//! - `POST /predict` - score a single review
//! - `POST /predict-batch` - score a list of reviews with statistics

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::error::ServeError;
use crate::registry::ModelRegistry;

mod handlers;
pub mod types;

use types::ErrorResponse;

/// Shared state handed to every request handler: the immutable model
/// registry, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub(crate) registry: Arc<ModelRegistry>,
}

impl AppState {
    /// Wraps a registry for sharing across handlers.
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Builds the service router with permissive CORS.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/predict-batch", post(handlers::predict_batch))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl ServeError {
    fn status(&self) -> StatusCode {
        match self {
            ServeError::EmptyText | ServeError::EmptyBatch | ServeError::UnknownModel(_) => {
                StatusCode::BAD_REQUEST
            }
            ServeError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        assert_eq!(ServeError::EmptyText.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServeError::UnknownModel("gpt".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServeError::EmptyBatch.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unavailable_and_internal_errors_map_apart() {
        let unavailable = ServeError::ModelUnavailable {
            model: "bert",
            reason: "weights missing".into(),
        };
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ServeError::Inference("shape mismatch".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
