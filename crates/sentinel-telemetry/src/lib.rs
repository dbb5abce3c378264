//! Telemetry for the LLM Sentinel Gateway.
//!
//! Owns the OpenTelemetry tracer and meter providers, the fixed set of
//! gateway instruments, structured logging, and cost estimation. The
//! cardinal rule of this crate is that instrumentation never breaks the
//! request path: initialization is infallible (falling back to a degraded
//! local mode when the OTLP exporter cannot be built), every recording
//! call swallows its own faults, and span lifetimes are enforced by a
//! drop guard so a panicking caller still ends its span.

pub mod config;
pub mod cost;
pub mod metrics;
pub mod provider;
pub mod record;
pub mod span;

pub use config::TelemetryConfig;
pub use cost::{estimate_cost, estimate_tokens, validate_token_limits, CostEstimate, ModelPricing};
pub use provider::{LogLevel, TelemetryMode, TelemetryProvider};
pub use record::{RequestStatus, TelemetryRecord};
pub use span::ScopedSpan;
