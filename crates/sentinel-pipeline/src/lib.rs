//! Request orchestration for the LLM Sentinel Gateway.
//!
//! The pipeline runs every request through the same stages: validate,
//! screen the prompt, generate under a deadline, screen the response,
//! record telemetry. Screening and cost estimation are instrumentation:
//! their faults are contained and never fail a request. Generation is
//! the only stage whose errors propagate to the caller.

pub mod pipeline;

pub use pipeline::{PipelineConfig, PipelineOutcome, PipelineStage, RequestPipeline};
