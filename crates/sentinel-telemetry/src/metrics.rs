//! Prometheus mirror of the OTLP instruments.
//!
//! The OTLP meter has no local scrape surface, so the same five
//! instruments are mirrored into a per-provider Prometheus registry.
//! `GET /metrics` and the integration tests read this mirror; the OTLP
//! pipeline remains the system of record.

use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

const REQUEST_LABELS: &[&str] = &["service", "environment", "model", "status"];

// Millisecond buckets sized for LLM generation latencies.
const LATENCY_BUCKETS_MS: &[f64] = &[
    5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 30_000.0,
];

pub(crate) struct MirrorMetrics {
    registry: Registry,
    pub(crate) requests: IntCounterVec,
    pub(crate) latency: HistogramVec,
    pub(crate) errors: IntCounterVec,
    pub(crate) generation_failures: IntCounterVec,
    pub(crate) injection_detected: IntCounterVec,
}

impl MirrorMetrics {
    pub(crate) fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("llm_requests_total", "Total LLM requests processed"),
            REQUEST_LABELS,
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "llm_request_latency_ms",
                "End-to-end request latency in milliseconds",
            )
            .buckets(LATENCY_BUCKETS_MS.to_vec()),
            REQUEST_LABELS,
        )?;
        let errors = IntCounterVec::new(
            Opts::new("llm_errors_total", "Requests that ended in a failure status"),
            REQUEST_LABELS,
        )?;
        let generation_failures = IntCounterVec::new(
            Opts::new(
                "llm_generation_failures_total",
                "Generation attempts that failed, by error type",
            ),
            &["service", "environment", "model", "error_type"],
        )?;
        let injection_detected = IntCounterVec::new(
            Opts::new(
                "llm_prompt_injection_detected_total",
                "Prompts whose injection risk crossed the alert threshold",
            ),
            &["service", "environment", "model"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(generation_failures.clone()))?;
        registry.register(Box::new(injection_detected.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency,
            errors,
            generation_failures,
            injection_detected,
        })
    }

    /// Renders the registry in Prometheus text exposition format.
    pub(crate) fn render(&self) -> String {
        let families = self.registry.gather();
        match TextEncoder::new().encode_to_string(&families) {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "failed to encode metrics; returning empty exposition");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_instruments() {
        let mirror = MirrorMetrics::new().unwrap();
        mirror
            .requests
            .with_label_values(&["svc", "test", "gemini-1.5-pro", "success"])
            .inc();
        mirror
            .latency
            .with_label_values(&["svc", "test", "gemini-1.5-pro", "success"])
            .observe(42.0);
        let text = mirror.render();
        assert!(text.contains("llm_requests_total"));
        assert!(text.contains("llm_request_latency_ms"));
        assert!(text.contains("status=\"success\""));
    }

    #[test]
    fn distinct_registries_do_not_collide() {
        let first = MirrorMetrics::new().unwrap();
        let second = MirrorMetrics::new().unwrap();
        first
            .requests
            .with_label_values(&["svc", "test", "m", "success"])
            .inc();
        assert!(!second.render().contains("llm_requests_total{"));
    }
}
