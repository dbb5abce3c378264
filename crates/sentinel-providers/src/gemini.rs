//! Gemini generation backend.
//!
//! Talks to the Google AI Studio `generateContent` endpoint:
//! `https://generativelanguage.googleapis.com/v1beta/models/{MODEL}:generateContent`.
//! The base URL is overridable so tests can point it at a mock server.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use sentinel_core::{GenerationBackend, GenerationError, GenerationRequest, GenerationResult};

use crate::region::normalize_region;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini backend configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for Google AI Studio.
    pub api_key: SecretString,
    /// Deployment region, normalized against the supported set.
    pub region: String,
    /// Request timeout for one backend call.
    pub timeout: Duration,
    /// API base URL; overridden in tests.
    pub base_url: String,
}

impl GeminiConfig {
    /// Creates a config with production defaults.
    #[must_use]
    pub fn new(api_key: impl Into<String>, region: impl Into<String>) -> Self {
        let region = normalize_region(&region.into()).to_string();
        Self {
            api_key: SecretString::new(api_key.into()),
            region,
            timeout: Duration::from_secs(30),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points the backend at a different base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Generation backend over the Gemini REST API.
pub struct GeminiBackend {
    config: GeminiConfig,
    client: Client,
}

impl GeminiBackend {
    /// Builds the backend and its HTTP client.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| GenerationError::backend(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url,
            model,
            self.config.api_key.expose_secret()
        )
    }

    fn map_http_error(status: u16, body: &str) -> GenerationError {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetail,
        }
        #[derive(Deserialize)]
        struct ErrorDetail {
            message: String,
        }

        let message = serde_json::from_str::<ErrorResponse>(body)
            .map_or_else(|_| format!("HTTP {status}"), |e| e.error.message);

        match status {
            401 | 403 => GenerationError::authentication(message),
            429 => GenerationError::quota(message),
            _ => GenerationError::backend(format!("HTTP {status}: {message}")),
        }
    }

    // Rough token estimate for backends that omit usage metadata.
    fn fallback_tokens(text: &str) -> u32 {
        ((text.len() / 4) as u32).max(1)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let url = self.endpoint_url(&request.model);
        let body = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        debug!(
            model = %request.model,
            region = %self.config.region,
            max_tokens = request.max_tokens,
            "sending generation request"
        );

        let started = Instant::now();
        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                }
            } else {
                error!(error = %e, "generation request failed");
                GenerationError::backend(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::backend(format!("failed to read response: {e}")))?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !status.is_success() {
            return Err(Self::map_http_error(status.as_u16(), &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::backend(format!("invalid response JSON: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::backend("no candidates in response"))?;
        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let (input_tokens, output_tokens) = match parsed.usage_metadata {
            Some(usage) => (
                usage.prompt_token_count as u32,
                usage.candidates_token_count.unwrap_or(0) as u32,
            ),
            None => {
                warn!(model = %request.model, "backend omitted usage metadata; estimating tokens");
                (
                    Self::fallback_tokens(&request.prompt),
                    Self::fallback_tokens(&text),
                )
            }
        };

        Ok(GenerationResult {
            text,
            input_tokens,
            output_tokens,
            latency_ms,
            model: request.model.clone(),
        })
    }

    async fn health(&self) -> bool {
        let url = format!(
            "{}/models?key={}",
            self.config.base_url,
            self.config.api_key.expose_secret()
        );
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: i64,
    #[serde(default)]
    candidates_token_count: Option<i64>,
}
