//! HTTP routes
//!
//! - POST /mcp/request - synchronous MCP call
//! - GET /mcp/ws - WebSocket upgrade (see [`super::websocket`])
//! - GET /health - liveness
//! - GET /metrics - Prometheus exposition
//!
//! `/mcp/request` always answers 200 with an envelope, including for domain
//! errors and bodies that are not a valid envelope.

use super::websocket::ws_handler;
use crate::dispatcher::ProtocolDispatcher;
use crate::metrics::PrometheusMetrics;
use crate::protocol::{McpRequest, McpResponse};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

/// Header carrying the per-request correlation ID
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// State shared by all routes
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: ProtocolDispatcher,
    pub metrics: Option<Arc<PrometheusMetrics>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(dispatcher: ProtocolDispatcher) -> Self {
        Self {
            dispatcher,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    /// Expose `metrics` on `/metrics`. The dispatcher should report into the same instance.
    pub fn with_metrics(mut self, metrics: Arc<PrometheusMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/mcp/request", post(mcp_request))
        .route("/mcp/ws", get(ws_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        // envelopes carry whole source files; no size cap on the body
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Propagate or assign `X-Request-ID`
async fn request_id(mut request: Request, next: Next) -> Response {
    let id = match request.headers().get(&REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => {
            let generated = uuid::Uuid::new_v4().to_string();
            match HeaderValue::from_str(&generated) {
                Ok(value) => {
                    request
                        .headers_mut()
                        .insert(REQUEST_ID_HEADER.clone(), value.clone());
                    value
                }
                Err(_) => return next.run(request).await,
            }
        }
    };

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER.clone(), id);
    response
}

/// POST /mcp/request
pub async fn mcp_request(State(state): State<AppState>, body: Bytes) -> Json<McpResponse> {
    let request: McpRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejecting undecodable envelope");
            return Json(McpResponse::invalid_request());
        }
    };

    Json(state.dispatcher.dispatch(request).await)
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "rule-mcp-server".to_string(),
        version: crate::VERSION.to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    let Some(metrics) = state.metrics else {
        return (StatusCode::NOT_FOUND, "metrics disabled").into_response();
    };

    match metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
