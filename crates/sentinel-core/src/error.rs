//! Error types for the gateway.
//!
//! The taxonomy is deliberately narrow: only generation-backend faults are
//! ever surfaced to a caller. Security-analysis, cost-estimation, and
//! telemetry faults are contained where they occur and never appear here.

use thiserror::Error;

/// Result type alias using [`GatewayError`]
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Top-level gateway error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation failure
        message: String,
        /// The field that failed validation
        field: Option<String>,
        /// Stable machine-readable error code
        code: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Generation backend fault
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl GatewayError {
    /// Create a validation error
    pub fn validation(
        message: impl Into<String>,
        field: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field,
            code: code.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Typed failure from the generation backend.
///
/// This is the only error category that propagates to the caller; every
/// variant carries a stable `error_type` tag used on telemetry records.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The backend did not respond within the request timeout
    #[error("Generation timed out after {elapsed_ms}ms")]
    Timeout {
        /// Time spent waiting before the deadline elapsed
        elapsed_ms: u64,
    },

    /// The backend rejected our credentials
    #[error("Generation backend authentication failed: {message}")]
    Authentication {
        /// Error message from the backend
        message: String,
    },

    /// The configured region is not valid for the backend
    #[error("Invalid region: {region}")]
    InvalidRegion {
        /// The rejected region string
        region: String,
    },

    /// The backend reported quota or rate-limit exhaustion
    #[error("Generation quota exhausted: {message}")]
    Quota {
        /// Error message from the backend
        message: String,
    },

    /// Any other backend/transport fault
    #[error("Generation backend error: {message}")]
    Backend {
        /// Error message describing the fault
        message: String,
    },
}

impl GenerationError {
    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a quota error
    pub fn quota(message: impl Into<String>) -> Self {
        Self::Quota {
            message: message.into(),
        }
    }

    /// Stable error tag used on telemetry records and metric labels
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Authentication { .. } => "authentication",
            Self::InvalidRegion { .. } => "invalid_region",
            Self::Quota { .. } => "quota",
            Self::Backend { .. } => "backend",
        }
    }
}
