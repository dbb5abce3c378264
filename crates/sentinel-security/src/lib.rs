//! # Sentinel Security
//!
//! Stateless pattern-matching engine producing a risk verdict for prompt
//! and response text. Detection is rule-based: a fixed, versioned table of
//! injection patterns plus a table of PII patterns, both compiled once at
//! startup and read lock-free from any number of concurrent requests.
//!
//! Screening is observe-only. The analyzer reports what it found; whether
//! a high-risk prompt is blocked is a policy decision made by the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod patterns;
pub mod verdict;

pub use analyzer::{SecurityAnalyzer, SecurityConfig};
pub use patterns::PATTERN_TABLE_VERSION;
pub use verdict::{FindingCategory, SecurityFinding, SecurityVerdict};
