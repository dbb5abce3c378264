//! The generation-backend abstraction.
//!
//! The pipeline treats text generation as an opaque call: a fully resolved
//! request goes in, a [`GenerationResult`] or a typed [`GenerationError`]
//! comes out. Backend implementations live in `sentinel-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Fully resolved request handed to a generation backend.
///
/// Unlike [`crate::GenerateRequest`], every field here is concrete: the
/// pipeline has already applied configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Successful generation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Input token count (backend-reported or estimated)
    pub input_tokens: u32,
    /// Output token count (backend-reported or estimated)
    pub output_tokens: u32,
    /// Wall-clock latency of the backend call in milliseconds
    pub latency_ms: f64,
    /// Model that produced the text
    pub model: String,
}

/// A remote text-generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for the given request.
    ///
    /// # Errors
    /// Returns a typed [`GenerationError`] on any backend fault.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError>;

    /// Best-effort reachability probe, used by the health endpoint.
    async fn health(&self) -> bool;
}
