//! Gateway settings.

use std::net::SocketAddr;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use sentinel_core::GatewayError;

/// Sentinel value for `otlp_endpoint` that turns export off.
pub const DISABLED_ENDPOINT: &str = "disabled";

/// Placeholder credential shipped with development defaults.
const DEV_API_KEY: &str = "dev-api-key";

/// All gateway settings, resolved from defaults, file, and environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Logical service name for telemetry.
    pub service_name: String,
    /// Deployment environment (`development`, `staging`, `production`).
    pub environment: String,
    /// OTLP collector endpoint, or `"disabled"` to turn export off.
    pub otlp_endpoint: String,
    /// Trace sampling ratio.
    pub sampling_rate: f64,
    /// Google Cloud project the gateway reports against.
    pub gcp_project_id: Option<String>,
    /// Region the Gemini backend is pinned to.
    pub vertex_location: String,
    /// Default model when a request does not name one.
    pub gemini_model: String,
    /// Gemini API key. Redacted in debug output.
    pub gemini_api_key: SecretString,
    /// Default maximum output tokens.
    pub max_tokens: u32,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Master switch for security screening.
    pub enable_security_checks: bool,
    /// Risk score at or above which an injection alert fires.
    pub prompt_injection_threshold: f64,
    /// Whether PII patterns are scanned at all.
    pub pii_detection_enabled: bool,
    /// Deadline for one generation call, in seconds.
    pub request_timeout_secs: u64,
    /// Concurrent in-flight generate requests the server admits.
    pub max_concurrent_requests: usize,
    /// Socket address the HTTP server binds.
    pub listen_addr: String,
    /// Log level filter.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_name: "llm-sentinel-gateway".to_string(),
            environment: "development".to_string(),
            otlp_endpoint: DISABLED_ENDPOINT.to_string(),
            sampling_rate: 1.0,
            gcp_project_id: None,
            vertex_location: "us-central1".to_string(),
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_api_key: SecretString::new(DEV_API_KEY.to_string()),
            max_tokens: 8192,
            temperature: 0.7,
            enable_security_checks: true,
            prompt_injection_threshold: 0.5,
            pii_detection_enabled: true,
            request_timeout_secs: 30,
            max_concurrent_requests: 10,
            listen_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings: defaults, then the TOML file at `path` when it
    /// exists, then environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    GatewayError::configuration(format!(
                        "failed to read config file {}: {e}",
                        path.display()
                    ))
                })?;
                Self::from_toml_str(&contents)?
            }
            Some(path) => {
                warn!(path = %path.display(), "config file not found; using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from TOML, with defaults for absent keys.
    pub fn from_toml_str(contents: &str) -> Result<Self, GatewayError> {
        toml::from_str(contents)
            .map_err(|e| GatewayError::configuration(format!("invalid config file: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        fn take(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }
        fn parse<T: std::str::FromStr>(name: &str) -> Option<T> {
            take(name).and_then(|v| match v.parse() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    warn!(var = name, value = %v, "ignoring unparseable environment override");
                    None
                }
            })
        }

        if let Some(v) = take("SENTINEL_SERVICE_NAME") {
            self.service_name = v;
        }
        if let Some(v) = take("SENTINEL_ENVIRONMENT") {
            self.environment = v;
        }
        if let Some(v) = take("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.otlp_endpoint = v;
        }
        if let Some(v) = parse("SENTINEL_SAMPLING_RATE") {
            self.sampling_rate = v;
        }
        if let Some(v) = take("GCP_PROJECT_ID") {
            self.gcp_project_id = Some(v);
        }
        if let Some(v) = take("VERTEX_LOCATION") {
            self.vertex_location = v;
        }
        if let Some(v) = take("GEMINI_MODEL") {
            self.gemini_model = v;
        }
        if let Some(v) = take("GEMINI_API_KEY") {
            self.gemini_api_key = SecretString::new(v);
        }
        if let Some(v) = parse("SENTINEL_MAX_TOKENS") {
            self.max_tokens = v;
        }
        if let Some(v) = parse("SENTINEL_TEMPERATURE") {
            self.temperature = v;
        }
        if let Some(v) = parse("SENTINEL_SECURITY_CHECKS") {
            self.enable_security_checks = v;
        }
        if let Some(v) = parse("SENTINEL_INJECTION_THRESHOLD") {
            self.prompt_injection_threshold = v;
        }
        if let Some(v) = parse("SENTINEL_PII_DETECTION") {
            self.pii_detection_enabled = v;
        }
        if let Some(v) = parse("SENTINEL_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = parse("SENTINEL_MAX_CONCURRENT_REQUESTS") {
            self.max_concurrent_requests = v;
        }
        if let Some(v) = take("SENTINEL_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = take("SENTINEL_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// Rejects settings that cannot produce a working gateway.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            return Err(GatewayError::configuration(format!(
                "sampling_rate must be within 0.0..=1.0, got {}",
                self.sampling_rate
            )));
        }
        if self.max_tokens == 0 || self.max_tokens > 8192 {
            return Err(GatewayError::configuration(format!(
                "max_tokens must be within 1..=8192, got {}",
                self.max_tokens
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GatewayError::configuration(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.prompt_injection_threshold) {
            return Err(GatewayError::configuration(format!(
                "prompt_injection_threshold must be within 0.0..=1.0, got {}",
                self.prompt_injection_threshold
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(GatewayError::configuration(
                "request_timeout_secs must be greater than 0",
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(GatewayError::configuration(
                "max_concurrent_requests must be greater than 0",
            ));
        }
        self.listen_addr.parse::<SocketAddr>().map_err(|e| {
            GatewayError::configuration(format!(
                "listen_addr {:?} is not a socket address: {e}",
                self.listen_addr
            ))
        })?;
        Ok(())
    }

    /// The OTLP endpoint, unless export is disabled.
    #[must_use]
    pub fn effective_otlp_endpoint(&self) -> Option<&str> {
        let endpoint = self.otlp_endpoint.trim();
        if endpoint.is_empty() || endpoint.eq_ignore_ascii_case(DISABLED_ENDPOINT) {
            None
        } else {
            Some(endpoint)
        }
    }

    /// Whether this deployment expects real credentials.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Placeholder or missing values a production deployment should not
    /// run with. Warnings only; startup proceeds either way.
    #[must_use]
    pub fn placeholder_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let key = self.gemini_api_key.expose_secret();
        if key.is_empty() || key == DEV_API_KEY {
            warnings.push("gemini_api_key is a development placeholder".to_string());
        }
        if self.gcp_project_id.is_none() {
            warnings.push("gcp_project_id is not set".to_string());
        }
        if self.effective_otlp_endpoint().is_none() && self.is_production() {
            warnings.push("telemetry export is disabled in production".to_string());
        }
        warnings
    }
}
