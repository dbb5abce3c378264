//! Telemetry configuration.

use std::time::Duration;

/// Configuration for the telemetry provider.
///
/// An absent `otlp_endpoint` disables export entirely; the provider still
/// builds real SDK instruments so recording calls behave identically.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint (gRPC), e.g. `http://localhost:4317`.
    /// `None` means no export is attempted.
    pub otlp_endpoint: Option<String>,
    /// Logical service name stamped on every span, metric, and log line.
    pub service_name: String,
    /// Deployment environment (`development`, `staging`, `production`).
    pub environment: String,
    /// Head sampling ratio for traces, clamped to `0.0..=1.0`.
    pub sampling_rate: f64,
    /// How often the periodic metric reader exports.
    pub export_interval: Duration,
    /// Log level filter applied when installing the subscriber.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "llm-sentinel-gateway".to_string(),
            environment: "development".to_string(),
            sampling_rate: 1.0,
            export_interval: Duration::from_secs(5),
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Creates a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OTLP endpoint.
    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Sets the deployment environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the trace sampling rate.
    #[must_use]
    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.sampling_rate = rate;
        self
    }

    /// Sets the metric export interval.
    #[must_use]
    pub fn with_export_interval(mut self, interval: Duration) -> Self {
        self.export_interval = interval;
        self
    }

    /// Sets the log level filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Sampling rate clamped into the valid ratio range.
    #[must_use]
    pub fn effective_sampling_rate(&self) -> f64 {
        self.sampling_rate.clamp(0.0, 1.0)
    }
}
