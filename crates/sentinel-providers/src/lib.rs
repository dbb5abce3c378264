//! Generation backends for the LLM Sentinel Gateway.
//!
//! The gateway talks to exactly one backend at a time through the
//! [`sentinel_core::GenerationBackend`] trait; this crate provides the
//! Gemini implementation and region validation.

pub mod gemini;
pub mod region;

pub use gemini::{GeminiBackend, GeminiConfig};
pub use region::{normalize_region, DEFAULT_REGION, SUPPORTED_REGIONS};
