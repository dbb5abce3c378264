//! The validated generation request accepted at the HTTP boundary.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::types::{MaxTokens, Temperature};

/// Longest prompt accepted at the boundary, in characters.
pub const MAX_PROMPT_CHARS: usize = 10_000;

/// Inbound generation request, as posted by a client.
///
/// `model`, `max_tokens`, and `temperature` are optional; unset fields are
/// resolved against the configured defaults by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The prompt text (1..=10_000 characters)
    pub prompt: String,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Target model (e.g. "gemini-1.5-pro")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerateRequest {
    /// Create a request carrying only a prompt
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            model: None,
        }
    }

    /// Get validated temperature
    ///
    /// # Errors
    /// Returns error if temperature is out of range
    pub fn validated_temperature(&self) -> Result<Option<Temperature>, GatewayError> {
        self.temperature.map(Temperature::new).transpose()
    }

    /// Get validated max_tokens
    ///
    /// # Errors
    /// Returns error if max_tokens is out of range
    pub fn validated_max_tokens(&self) -> Result<Option<MaxTokens>, GatewayError> {
        self.max_tokens.map(MaxTokens::new).transpose()
    }

    /// Validate the entire request
    ///
    /// # Errors
    /// Returns error if any field is invalid
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.prompt.is_empty() {
            return Err(GatewayError::validation(
                "prompt cannot be empty",
                Some("prompt".to_string()),
                "empty_prompt",
            ));
        }

        let chars = self.prompt.chars().count();
        if chars > MAX_PROMPT_CHARS {
            return Err(GatewayError::validation(
                format!("prompt exceeds {MAX_PROMPT_CHARS} characters ({chars})"),
                Some("prompt".to_string()),
                "prompt_too_long",
            ));
        }

        self.validated_temperature()?;
        self.validated_max_tokens()?;

        if let Some(model) = &self.model {
            if model.is_empty() {
                return Err(GatewayError::validation(
                    "model cannot be empty when provided",
                    Some("model".to_string()),
                    "empty_model",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_request_is_valid() {
        let request = GenerateRequest::new("Hello");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let request = GenerateRequest::new("");
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_oversized_prompt_rejected() {
        let request = GenerateRequest::new("x".repeat(MAX_PROMPT_CHARS + 1));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_prompt_at_limit_accepted() {
        let request = GenerateRequest::new("x".repeat(MAX_PROMPT_CHARS));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let request = GenerateRequest {
            temperature: Some(3.0),
            ..GenerateRequest::new("Hello")
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_deserializes_from_minimal_json() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt": "Hello"}"#).expect("deserialize");
        assert_eq!(request.prompt, "Hello");
        assert!(request.model.is_none());
    }
}
