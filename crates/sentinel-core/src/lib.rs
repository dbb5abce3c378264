//! # Sentinel Core
//!
//! Core types, traits, and error handling for the LLM Sentinel Gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - The validated generation request accepted at the HTTP boundary
//! - The per-request context owned by the pipeline
//! - The `GenerationBackend` trait the pipeline calls through
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod context;
pub mod error;
pub mod request;
pub mod types;

// Re-export commonly used types
pub use backend::{GenerationBackend, GenerationRequest, GenerationResult};
pub use context::RequestContext;
pub use error::{GatewayError, GatewayResult, GenerationError};
pub use request::GenerateRequest;
pub use types::{MaxTokens, RequestId, Temperature};
