//! Test helper utilities for integration tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sentinel_config::Settings;
use sentinel_core::GenerationBackend;
use sentinel_pipeline::{PipelineConfig, RequestPipeline};
use sentinel_security::{SecurityAnalyzer, SecurityConfig};
use sentinel_server::{create_router, AppState};
use sentinel_telemetry::{TelemetryConfig, TelemetryProvider};

/// Base port for test servers (incremented for each test)
static PORT_COUNTER: AtomicU16 = AtomicU16::new(18080);

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Get a unique port for a test server
pub fn get_test_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A gateway wired over a test backend, with its telemetry handle kept
/// so tests can assert against the metric mirror.
pub struct TestGateway {
    /// Router ready to serve or `oneshot`.
    pub router: Router,
    /// The telemetry provider behind the router.
    pub telemetry: Arc<TelemetryProvider>,
}

/// Builds a gateway around the given backend with test settings.
/// Telemetry always comes up degraded (no OTLP endpoint), which is the
/// configuration under test for most suites.
pub fn test_gateway(backend: Arc<dyn GenerationBackend>) -> TestGateway {
    test_gateway_with(backend, Duration::from_secs(5))
}

/// Same as [`test_gateway`], with a custom generation deadline.
pub fn test_gateway_with(
    backend: Arc<dyn GenerationBackend>,
    request_timeout: Duration,
) -> TestGateway {
    init_tracing();
    let telemetry = Arc::new(TelemetryProvider::initialize(
        &TelemetryConfig::new()
            .with_service_name("sentinel-test")
            .with_environment("test"),
    ));
    let pipeline = Arc::new(RequestPipeline::new(
        SecurityAnalyzer::new(SecurityConfig::default()),
        Arc::clone(&telemetry),
        Arc::clone(&backend),
        PipelineConfig {
            request_timeout,
            ..PipelineConfig::default()
        },
    ));
    let state = AppState::builder()
        .pipeline(pipeline)
        .telemetry(Arc::clone(&telemetry))
        .backend(backend)
        .settings(Arc::new(Settings::default()))
        .build()
        .expect("complete test state");
    TestGateway {
        router: create_router(state),
        telemetry,
    }
}

/// Test server wrapper for integration tests
pub struct TestServer {
    /// The server address
    pub addr: SocketAddr,
    /// HTTP client for making requests
    pub client: Client,
    /// Base URL for the server
    pub base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Create a new test server with the given router
    pub async fn new(router: Router) -> Self {
        let port = get_test_port();
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr).await.expect("Failed to bind");
        let actual_addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        // Wait for server to be ready
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create client");

        Self {
            addr: actual_addr,
            client,
            base_url: format!("http://{actual_addr}"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Parse response body as JSON
    pub async fn json_body(response: Response) -> Value {
        response.json().await.expect("Failed to parse JSON")
    }

    /// Shutdown the test server
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sums every sample of a Prometheus counter whose series contains all
/// of the given label fragments (e.g. `status="success"`).
pub fn counter_value(metrics_text: &str, name: &str, label_fragments: &[&str]) -> u64 {
    metrics_text
        .lines()
        .filter(|line| line.starts_with(name) && !line.starts_with('#'))
        .filter(|line| label_fragments.iter().all(|fragment| line.contains(fragment)))
        .filter_map(|line| line.rsplit(' ').next())
        .filter_map(|value| value.parse::<f64>().ok())
        .map(|value| value as u64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_value_sums_matching_series() {
        let text = "\
# HELP llm_requests_total Total LLM requests processed
# TYPE llm_requests_total counter
llm_requests_total{model=\"a\",status=\"success\"} 3
llm_requests_total{model=\"b\",status=\"success\"} 2
llm_requests_total{model=\"a\",status=\"error\"} 1
";
        assert_eq!(counter_value(text, "llm_requests_total", &[]), 6);
        assert_eq!(
            counter_value(text, "llm_requests_total", &["status=\"success\""]),
            5
        );
        assert_eq!(
            counter_value(text, "llm_requests_total", &["model=\"a\"", "status=\"error\""]),
            1
        );
    }
}
