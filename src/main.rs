//! # LLM Sentinel Gateway
//!
//! Security and observability gateway for LLM text generation.
//!
//! Every request is screened for prompt injection and PII, generated
//! under a deadline, screened again on the way out, and recorded with
//! cost attribution. Telemetry export failures degrade the gateway, they
//! never stop it serving.
//!
//! ## Usage
//!
//! ```bash
//! # Start with built-in defaults (development mode, export disabled)
//! llm-sentinel-gateway
//!
//! # Start with a config file
//! SENTINEL_CONFIG=/etc/sentinel/gateway.toml llm-sentinel-gateway
//!
//! # Environment overrides
//! GEMINI_API_KEY=... OTEL_EXPORTER_OTLP_ENDPOINT=http://collector:4317 llm-sentinel-gateway
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing::{error, info, warn};

use sentinel_config::Settings;
use sentinel_pipeline::{PipelineConfig, RequestPipeline};
use sentinel_providers::{normalize_region, GeminiBackend, GeminiConfig};
use sentinel_security::{SecurityAnalyzer, SecurityConfig};
use sentinel_server::{create_router, shutdown_signal, AppState};
use sentinel_telemetry::{TelemetryConfig, TelemetryProvider};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "gateway failed");
        eprintln!("gateway failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = std::env::var("SENTINEL_CONFIG").ok().map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).context("loading configuration")?;

    // Telemetry first: the provider also installs the tracing subscriber,
    // so everything after this line logs structurally.
    let mut telemetry_config = TelemetryConfig::new()
        .with_service_name(&settings.service_name)
        .with_environment(&settings.environment)
        .with_sampling_rate(settings.sampling_rate)
        .with_log_level(&settings.log_level);
    if let Some(endpoint) = settings.effective_otlp_endpoint() {
        telemetry_config = telemetry_config.with_otlp_endpoint(endpoint);
    }
    let telemetry = Arc::new(TelemetryProvider::initialize(&telemetry_config));
    telemetry.install_subscriber(&settings.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %settings.environment,
        telemetry = telemetry.mode().as_str(),
        "starting LLM Sentinel Gateway"
    );

    for warning in settings.placeholder_warnings() {
        warn!("{warning}");
    }

    let region = normalize_region(&settings.vertex_location).to_string();
    let backend = Arc::new(
        GeminiBackend::new(
            GeminiConfig::new(settings.gemini_api_key.expose_secret().clone(), region.clone())
                .with_timeout(Duration::from_secs(settings.request_timeout_secs)),
        )
        .context("building the Gemini backend")?,
    );

    let analyzer = SecurityAnalyzer::new(SecurityConfig {
        security_checks_enabled: settings.enable_security_checks,
        pii_detection_enabled: settings.pii_detection_enabled,
        injection_threshold: settings.prompt_injection_threshold,
    });

    let pipeline = Arc::new(RequestPipeline::new(
        analyzer,
        Arc::clone(&telemetry),
        backend.clone(),
        PipelineConfig {
            default_model: settings.gemini_model.clone(),
            default_max_tokens: settings.max_tokens,
            default_temperature: settings.temperature,
            region,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        },
    ));

    let listen_addr = settings.listen_addr.clone();
    let state = AppState::builder()
        .pipeline(pipeline)
        .telemetry(Arc::clone(&telemetry))
        .backend(backend)
        .settings(Arc::new(settings))
        .build()
        .map_err(|e| anyhow::anyhow!(e))?;

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!(addr = %listen_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("draining complete; flushing telemetry");
    telemetry.shutdown();

    Ok(())
}
