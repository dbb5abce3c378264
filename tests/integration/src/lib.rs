//! Integration tests for the LLM Sentinel Gateway
//!
//! Covers:
//! - API endpoint behavior and error mapping
//! - Pipeline telemetry guarantees (one record per request, degraded mode)
//! - End-to-end flows against a mocked Gemini API

pub mod helpers;
pub mod mock_backend;

pub use helpers::*;
pub use mock_backend::*;

#[cfg(test)]
mod api_tests;
#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod pipeline_tests;
