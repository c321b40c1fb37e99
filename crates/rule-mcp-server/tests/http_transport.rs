//! HTTP routes driven in-process through the router

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rule_mcp_core::{MemoryStore, Repositories, SeedData};
use rule_mcp_server::app::Engine;
use rule_mcp_server::{create_router, AppState, PrometheusMetrics, ServerConfig};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn router(with_metrics: bool) -> Router {
    let repos = Repositories::from_store(Arc::new(MemoryStore::from_seed(SeedData::fixtures())));
    let engine = Engine::new(repos, &ServerConfig::default());

    if with_metrics {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let state = AppState::new(engine.dispatcher(metrics.clone())).with_metrics(metrics);
        create_router(state)
    } else {
        let dispatcher = engine.dispatcher(Arc::new(rule_mcp_server::NoopMetrics));
        create_router(AppState::new(dispatcher))
    }
}

fn post(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp/request")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_malformed_body_gets_invalid_request_envelope() {
    let response = router(false).oneshot(post("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["id"], "");
    assert_eq!(body["error"]["code"], 4000);
    assert_eq!(body["error"]["message"], "Invalid request format");
}

#[tokio::test]
async fn test_domain_error_still_200() {
    let response = router(false)
        .oneshot(post(
            r#"{"id":"7","method":"getRules","params":{"project_id":"nonexistent"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["id"], "7");
    assert_eq!(body["error"]["code"], 4040);
}

#[tokio::test]
async fn test_large_body_still_gets_envelope() {
    let code = "let x = 1;\n".repeat(300_000);
    let body = serde_json::json!({
        "id": "big",
        "method": "validateCode",
        "params": {"project_id": "web-app", "code": code},
    })
    .to_string();
    assert!(body.len() > 3 * 1024 * 1024);

    let request = Request::builder()
        .method("POST")
        .uri("/mcp/request")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = router(false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["id"], "big");
    assert_eq!(body["result"]["is_valid"], true);
}

#[tokio::test]
async fn test_successful_call() {
    let response = router(false)
        .oneshot(post(r#"{"id":"1","method":"tools/list"}"#))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert!(body.get("error").is_none());
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_health() {
    let response = router(false)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], rule_mcp_server::VERSION);
}

#[tokio::test]
async fn test_metrics_exposes_dispatched_calls() {
    let app = router(true);

    app.clone()
        .oneshot(post(r#"{"id":"1","method":"tools/list"}"#))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("rule_mcp_requests_total"));
    assert!(text.contains("method=\"tools/list\""));
}

#[tokio::test]
async fn test_metrics_disabled() {
    let response = router(false)
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_propagated_or_assigned() {
    let mut request = post(r#"{"method":"tools/list"}"#);
    request
        .headers_mut()
        .insert("x-request-id", "abc-123".parse().unwrap());
    let response = router(false).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = router(false)
        .oneshot(post(r#"{"method":"tools/list"}"#))
        .await
        .unwrap();
    let assigned = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(assigned.len(), 36);
}
