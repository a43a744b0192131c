//! Scribe HTTP REST API
//!
//! Axum-based HTTP server exposing transcript classification.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum dispatch
//! machinery.
//!
//! Endpoints:
//! - POST /api/entity-classification/analyze               classify and store a transcript
//! - GET  /api/entity-classification/results/:analysis_id  fetch a stored classification
//! - GET  /api/entity-classification/results/              empty id, always "Analysis not found"
//! - GET  /health                                          liveness check, plain `OK`
//!
//! Error responses are plain text with a short message and never carry
//! internal error detail; the detail is logged instead.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use scribe_core::{
    AnalyzeResponse, ClassificationRecord, ClassificationService, ScribeConfig, ScribeError,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

pub const ANALYZE_PATH: &str = "/api/entity-classification/analyze";
pub const RESULTS_PATH: &str = "/api/entity-classification/results/:analysis_id";
pub const RESULTS_ROOT_PATH: &str = "/api/entity-classification/results/";
pub const HEALTH_PATH: &str = "/health";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub service: ClassificationService,
    /// Mirrors `[http] cors`.
    pub cors: bool,
}

impl HttpState {
    /// Build a fresh store and the configured classifier.
    pub fn from_config(config: &ScribeConfig) -> std::result::Result<Self, ScribeError> {
        Ok(Self {
            service: ClassificationService::from_config(config)?,
            cors: config.http.cors,
        })
    }
}

/// Build the Axum router with all endpoints and request logging, plus a
/// permissive CORS layer when `state.cors` is set.
pub fn build_router(state: Arc<HttpState>) -> Router {
    let mut router = Router::new()
        .route(ANALYZE_PATH, post(analyze_handler))
        .route(RESULTS_PATH, get(get_result_handler))
        .route(RESULTS_ROOT_PATH, get(missing_id_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(middleware::from_fn(log_request));
    if state.cors {
        router = router.layer(CorsLayer::permissive());
    }
    router.with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: ScribeConfig,
    state: HttpState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = config.bind_addr();
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Scribe HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Client-visible failure. The `Display` text is the exact response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid request body")]
    BadRequest,

    #[error("Analysis not found")]
    NotFound,

    #[error("Classification failed")]
    ClassificationFailed,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::ClassificationFailed | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ScribeError> for ApiError {
    fn from(err: ScribeError) -> Self {
        match err {
            ScribeError::BadRequest(e) => {
                tracing::debug!(error = %e, "Rejected malformed analyze body");
                ApiError::BadRequest
            }
            ScribeError::NotFound(_) => ApiError::NotFound,
            ScribeError::ClassificationFailed(e) => {
                tracing::error!(error = %e, "Analyze request failed in classifier");
                ApiError::ClassificationFailed
            }
            ScribeError::Config(e) => {
                tracing::error!(error = %e, "Configuration error while serving request");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner analyze: parses the raw body, classifies and stores.
pub async fn analyze_inner(
    service: &ClassificationService,
    body: &[u8],
) -> std::result::Result<AnalyzeResponse, ApiError> {
    Ok(service.analyze_body(body).await?)
}

/// Inner get: looks up a stored classification by id.
pub fn get_result_inner(
    service: &ClassificationService,
    analysis_id: &str,
) -> std::result::Result<ClassificationRecord, ApiError> {
    let record = service.get_result(analysis_id)?;
    Ok(ClassificationRecord::clone(&record))
}

/// Inner health: pure, no IO.
pub fn health_inner() -> &'static str {
    "OK"
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn analyze_handler(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> std::result::Result<Json<AnalyzeResponse>, ApiError> {
    analyze_inner(&state.service, &body).await.map(Json)
}

pub async fn get_result_handler(
    State(state): State<Arc<HttpState>>,
    Path(analysis_id): Path<String>,
) -> std::result::Result<Json<ClassificationRecord>, ApiError> {
    get_result_inner(&state.service, &analysis_id).map(Json)
}

/// `results/` with nothing after the slash never names a stored analysis.
pub async fn missing_id_handler(
    State(state): State<Arc<HttpState>>,
) -> std::result::Result<Json<ClassificationRecord>, ApiError> {
    get_result_inner(&state.service, "").map(Json)
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, health_inner())
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        took_ms = start.elapsed().as_millis() as u64,
        "HTTP request"
    );
    response
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::{ClassificationStore, ClassifierError, StubClassifier};
    use std::time::Duration;

    fn make_service() -> ClassificationService {
        ClassificationService::new(
            Arc::new(ClassificationStore::new()),
            Arc::new(StubClassifier),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_health_inner_pure() {
        assert_eq!(health_inner(), "OK");
    }

    #[test]
    fn test_api_error_status_and_body() {
        assert_eq!(ApiError::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotFound.to_string(), "Analysis not found");
        assert_eq!(
            ApiError::ClassificationFailed.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_scribe_error_mapping() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ApiError::from(ScribeError::BadRequest(bad)), ApiError::BadRequest);
        assert_eq!(
            ApiError::from(ScribeError::NotFound("x".to_string())),
            ApiError::NotFound
        );
        assert_eq!(
            ApiError::from(ScribeError::ClassificationFailed(ClassifierError::Timeout {
                timeout_ms: 5
            })),
            ApiError::ClassificationFailed
        );
        let mut config = ScribeConfig::default();
        config.classifier.backend = "nope".to_string();
        let startup = HttpState::from_config(&config).err().unwrap();
        assert_eq!(ApiError::from(startup), ApiError::Internal);
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Internal.to_string(), "Internal server error");
    }

    #[tokio::test]
    async fn test_analyze_inner_then_get_result_inner() {
        let service = make_service();
        let body = br#"{"transcript_id":"t1","transcript_text":"hello","creator_id":"c1"}"#;

        let resp = analyze_inner(&service, body).await.unwrap();
        assert_eq!(resp.status, "success");

        let record = get_result_inner(&service, &resp.analysis_id).unwrap();
        assert_eq!(record.transcript_id, "t1");
        assert_eq!(record.creator_id, "c1");
        assert_eq!(record.entities, resp.entities);
    }

    #[tokio::test]
    async fn test_analyze_inner_malformed_body() {
        let service = make_service();
        let err = analyze_inner(&service, b"{\"transcript_id\":").await.unwrap_err();
        assert_eq!(err, ApiError::BadRequest);
        assert!(service.store().is_empty());
    }

    #[test]
    fn test_get_result_inner_missing() {
        let service = make_service();
        assert_eq!(
            get_result_inner(&service, "nonexistent-id").unwrap_err(),
            ApiError::NotFound
        );
    }

    #[test]
    fn test_state_from_default_config_uses_stub() {
        let state = HttpState::from_config(&ScribeConfig::default()).unwrap();
        assert_eq!(state.service.classifier_name(), "stub");
        assert!(state.service.store().is_empty());
        assert!(state.cors);

        let mut config = ScribeConfig::default();
        config.http.cors = false;
        assert!(!HttpState::from_config(&config).unwrap().cors);
    }

    #[test]
    fn test_state_from_config_rejects_unknown_backend() {
        let mut config = ScribeConfig::default();
        config.classifier.backend = "nope".to_string();
        match HttpState::from_config(&config) {
            Err(err @ ScribeError::Config(_)) => {
                let msg = err.to_string();
                assert!(msg.contains("Unknown classifier backend: nope"), "got: {}", msg);
                assert!(!msg.contains("Classification failed"), "got: {}", msg);
            }
            Err(e) => panic!("expected config error, got: {}", e),
            Ok(_) => panic!("unknown backend must be rejected"),
        }
    }
}
