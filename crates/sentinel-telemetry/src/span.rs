//! Span lifetime management.

use opentelemetry::trace::{Span as _, SpanContext, Status};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace as sdktrace;

/// A span that ends itself when dropped.
///
/// The SDK span is held in an `Option` so the guard can end it exactly
/// once; dropping the guard after an explicit end is a no-op. Because
/// ending happens in `Drop`, a span is closed even when the code that
/// opened it panics or returns early.
pub struct ScopedSpan {
    span: Option<sdktrace::Span>,
}

impl ScopedSpan {
    pub(crate) fn new(span: sdktrace::Span) -> Self {
        Self { span: Some(span) }
    }

    /// Trace ID of this span, as a 32-character lowercase hex string.
    #[must_use]
    pub fn trace_id(&self) -> String {
        self.span
            .as_ref()
            .map(|s| s.span_context().trace_id().to_string())
            .unwrap_or_default()
    }

    /// Span ID of this span, as a 16-character lowercase hex string.
    #[must_use]
    pub fn span_id(&self) -> String {
        self.span
            .as_ref()
            .map(|s| s.span_context().span_id().to_string())
            .unwrap_or_default()
    }

    pub(crate) fn span_context(&self) -> Option<SpanContext> {
        self.span.as_ref().map(|s| s.span_context().clone())
    }

    /// Sets an attribute on the live span.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(attribute);
        }
    }

    /// Marks the span outcome; failures also set an error status.
    pub fn set_success(&mut self, success: bool) {
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(KeyValue::new("success", success));
            if success {
                span.set_status(Status::Ok);
            }
        }
    }

    /// Records a failure on the span without ending it.
    pub fn record_failure(&mut self, message: &str) {
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(KeyValue::new("success", false));
            span.set_status(Status::error(message.to_string()));
        }
    }

    /// Ends the span now instead of at drop.
    pub fn end(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }
}
