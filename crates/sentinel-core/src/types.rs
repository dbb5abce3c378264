//! Validated domain types (newtypes).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GatewayError;

/// Opaque per-request identifier, generated once at ingress.
///
/// The wire format is `req-` followed by eight hex characters, which is
/// short enough for log lines while keeping collisions negligible at
/// per-process request volumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new unique request ID
    #[must_use]
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("req-{}", &uuid[..8]))
    }

    /// Get the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sampling temperature, validated to 0.0..=2.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f32);

impl Temperature {
    /// Create a validated temperature
    ///
    /// # Errors
    /// Returns error if the value is outside 0.0..=2.0
    pub fn new(value: f32) -> Result<Self, GatewayError> {
        if !(0.0..=2.0).contains(&value) {
            return Err(GatewayError::validation(
                format!("temperature must be between 0.0 and 2.0, got {value}"),
                Some("temperature".to_string()),
                "invalid_temperature",
            ));
        }
        Ok(Self(value))
    }

    /// Get the inner value
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

/// Maximum output tokens, validated to 1..=8192
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaxTokens(u32);

impl MaxTokens {
    /// Create a validated max-tokens value
    ///
    /// # Errors
    /// Returns error if the value is outside 1..=8192
    pub fn new(value: u32) -> Result<Self, GatewayError> {
        if value == 0 || value > 8192 {
            return Err(GatewayError::validation(
                format!("max_tokens must be between 1 and 8192, got {value}"),
                Some("max_tokens".to_string()),
                "invalid_max_tokens",
            ));
        }
        Ok(Self(value))
    }

    /// Get the inner value
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}
