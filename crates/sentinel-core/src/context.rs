//! Per-request context.

use serde::Serialize;

use crate::types::RequestId;

/// Everything the pipeline knows about one request, fixed at ingress.
///
/// Owned exclusively by the pipeline for the lifetime of one request and
/// discarded when the response is sent. The trace correlation identifiers
/// are the only fields set after construction, exactly once, when the
/// request span is started.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    /// Unique request identifier
    pub request_id: RequestId,
    /// Trace ID once the request span has been started
    pub trace_id: Option<String>,
    /// Span ID once the request span has been started
    pub span_id: Option<String>,
    /// The prompt text
    pub prompt: String,
    /// Resolved model name
    pub model: String,
    /// Resolved maximum output tokens
    pub max_tokens: u32,
    /// Resolved sampling temperature
    pub temperature: f32,
}

impl RequestContext {
    /// Create a context with a freshly generated request ID
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            request_id: RequestId::generate(),
            trace_id: None,
            span_id: None,
            prompt: prompt.into(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Attach trace correlation identifiers from the request span
    #[must_use]
    pub fn with_trace(mut self, trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = Some(span_id.into());
        self
    }
}
