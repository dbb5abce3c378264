//! HTTP request handlers.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::{debug, instrument};

use sentinel_core::GenerateRequest;
use sentinel_security::SecurityVerdict;
use sentinel_telemetry::{CostEstimate, TelemetryMode};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of a successful `POST /generate`.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Request identifier, also on the telemetry record.
    pub request_id: String,
    /// Generated text.
    pub text: String,
    /// Model that produced the text.
    pub model: String,
    /// End-to-end latency in milliseconds.
    pub latency_ms: f64,
    /// Input token count.
    pub input_tokens: u32,
    /// Output token count.
    pub output_tokens: u32,
    /// Cost attribution, when estimation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<CostEstimate>,
    /// Whether the prompt verdict crossed the configured alert threshold.
    pub prompt_injection_detected: bool,
    /// Whether either verdict found PII.
    pub pii_detected: bool,
    /// Security screening of prompt and response. Observe-only: verdicts
    /// are reported, never enforced.
    pub security_analysis: SecurityAnalysis,
    /// Trace identifier for correlation, when a span was started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Both screening verdicts for one request.
#[derive(Debug, Serialize)]
pub struct SecurityAnalysis {
    /// Verdict on the prompt.
    pub prompt_analysis: SecurityVerdict,
    /// Verdict on the generated response.
    pub response_analysis: SecurityVerdict,
}

/// `POST /generate`: run one request through the pipeline.
#[instrument(skip(state, request), fields(prompt_chars = request.prompt.chars().count()))]
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    debug!(model = ?request.model, "processing generate request");
    let outcome = state.pipeline.execute(&request).await?;
    Ok(Json(GenerateResponse {
        request_id: outcome.context.request_id.as_str().to_string(),
        text: outcome.text,
        model: outcome.context.model.clone(),
        latency_ms: outcome.latency_ms,
        input_tokens: outcome.input_tokens,
        output_tokens: outcome.output_tokens,
        cost_estimate: outcome.cost,
        prompt_injection_detected: outcome.injection_alert,
        pii_detected: outcome.prompt_verdict.pii_detected || outcome.response_verdict.pii_detected,
        security_analysis: SecurityAnalysis {
            prompt_analysis: outcome.prompt_verdict,
            response_analysis: outcome.response_verdict,
        },
        trace_id: outcome.context.trace_id,
    }))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`. Degraded still serves traffic.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Telemetry export state (`ready` or `degraded`).
    pub telemetry: String,
    /// Whether the generation backend answered its probe.
    pub backend_reachable: bool,
    /// Deployment environment.
    pub environment: String,
}

/// `GET /health`: liveness plus subsystem states. Always 200; a degraded
/// gateway keeps serving.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend_reachable = state.backend.health().await;
    let telemetry_mode = state.telemetry.mode();
    let status = if backend_reachable && telemetry_mode == TelemetryMode::Ready {
        "healthy"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        telemetry: telemetry_mode.as_str().to_string(),
        backend_reachable,
        environment: state.settings.environment.clone(),
    })
}

/// Redacted view of the running configuration.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Service name.
    pub service_name: String,
    /// Deployment environment.
    pub environment: String,
    /// Default model.
    pub model: String,
    /// Default output token budget.
    pub max_tokens: u32,
    /// Default temperature.
    pub temperature: f32,
    /// Whether security screening is enabled.
    pub security_checks_enabled: bool,
    /// Whether PII detection is enabled.
    pub pii_detection_enabled: bool,
    /// Injection alert threshold.
    pub prompt_injection_threshold: f64,
    /// Generation deadline in seconds.
    pub request_timeout_secs: u64,
    /// Admission limit for concurrent generate requests.
    pub max_concurrent_requests: usize,
    /// Whether telemetry export is configured.
    pub telemetry_export_enabled: bool,
    /// Always `"[REDACTED]"`.
    pub gemini_api_key: String,
}

/// `GET /config`: the running configuration with secrets redacted.
pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let settings = &state.settings;
    Json(ConfigResponse {
        service_name: settings.service_name.clone(),
        environment: settings.environment.clone(),
        model: settings.gemini_model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        security_checks_enabled: settings.enable_security_checks,
        pii_detection_enabled: settings.pii_detection_enabled,
        prompt_injection_threshold: settings.prompt_injection_threshold,
        request_timeout_secs: settings.request_timeout_secs,
        max_concurrent_requests: settings.max_concurrent_requests,
        telemetry_export_enabled: settings.effective_otlp_endpoint().is_some(),
        gemini_api_key: "[REDACTED]".to_string(),
    })
}

/// `GET /metrics`: Prometheus text exposition of the local mirror.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.telemetry.metrics_text(),
    )
}
