//! HTTP API tests over a running server.

use std::time::Duration;

use serde_json::json;

use sentinel_core::GenerationError;

use crate::helpers::{test_gateway, test_gateway_with, TestServer};
use crate::mock_backend::MockBackend;

#[tokio::test]
async fn generate_returns_full_response_shape() {
    let backend = MockBackend::replying("Once upon a time");
    let gateway = test_gateway(backend.clone());
    let server = TestServer::new(gateway.router).await;

    let response = server
        .post_json(
            "/generate",
            &json!({"prompt": "Tell me a short story", "model": "gemini-1.5-flash"}),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = TestServer::json_body(response).await;
    assert!(body["request_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("req-")));
    assert_eq!(body["text"], "Once upon a time");
    assert_eq!(body["model"], "gemini-1.5-flash");
    assert_eq!(body["input_tokens"], 12);
    assert_eq!(body["output_tokens"], 34);
    assert!(body["cost_estimate"]["total_cost"].as_f64().is_some());
    assert!(body.get("cost").is_none());
    assert_eq!(body["prompt_injection_detected"], false);
    assert_eq!(body["pii_detected"], false);
    assert_eq!(
        body["security_analysis"]["prompt_analysis"]["injection_detected"],
        false
    );
    assert_eq!(
        body["security_analysis"]["response_analysis"]["pii_detected"],
        false
    );
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn empty_prompt_is_rejected_before_the_backend() {
    let backend = MockBackend::replying("unused");
    let gateway = test_gateway(backend.clone());
    let server = TestServer::new(gateway.router).await;

    let response = server.post_json("/generate", &json!({"prompt": ""})).await;
    assert_eq!(response.status(), 400);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["error"]["type"], "validation");
    assert_eq!(body["error"]["code"], "empty_prompt");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn quota_errors_map_to_429() {
    let backend = MockBackend::failing(GenerationError::quota("resource exhausted"));
    let gateway = test_gateway(backend);
    let server = TestServer::new(gateway.router).await;

    let response = server
        .post_json("/generate", &json!({"prompt": "hello"}))
        .await;
    assert_eq!(response.status(), 429);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["error"]["type"], "quota");
}

#[tokio::test]
async fn slow_backend_maps_to_504() {
    let backend = MockBackend::hanging();
    let gateway = test_gateway_with(backend, Duration::from_millis(50));
    let server = TestServer::new(gateway.router).await;

    let response = server
        .post_json("/generate", &json!({"prompt": "hello"}))
        .await;
    assert_eq!(response.status(), 504);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["error"]["type"], "timeout");
}

#[tokio::test]
async fn health_reports_degraded_telemetry_but_stays_200() {
    let gateway = test_gateway(MockBackend::replying("ok"));
    let server = TestServer::new(gateway.router).await;

    let response = server.get("/health").await;
    assert_eq!(response.status(), 200);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["telemetry"], "degraded");
    assert_eq!(body["backend_reachable"], true);
}

#[tokio::test]
async fn config_redacts_the_api_key() {
    let gateway = test_gateway(MockBackend::replying("ok"));
    let server = TestServer::new(gateway.router).await;

    let response = server.get("/config").await;
    assert_eq!(response.status(), 200);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["gemini_api_key"], "[REDACTED]");
    assert_eq!(body["telemetry_export_enabled"], false);
    assert_eq!(body["model"], "gemini-1.5-pro");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let gateway = test_gateway(MockBackend::replying("ok"));
    let server = TestServer::new(gateway.router).await;

    let generate = server
        .post_json("/generate", &json!({"prompt": "hello"}))
        .await;
    assert_eq!(generate.status(), 200);

    let response = server.get("/metrics").await;
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let text = response.text().await.expect("metrics body");
    assert!(text.contains("llm_requests_total"));
    assert!(text.contains("llm_request_latency_ms"));
}
