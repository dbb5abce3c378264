//! Per-request telemetry records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sentinel_core::RequestContext;
use sentinel_security::SecurityVerdict;

use crate::cost::CostEstimate;

/// Terminal outcome of a request, as seen by telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Generation completed and a response was returned.
    Success,
    /// Generation failed with a backend or validation fault.
    Error,
    /// The client disconnected before the request finished.
    Cancelled,
    /// Generation exceeded the configured deadline.
    Timeout,
}

impl RequestStatus {
    /// Low-cardinality label value for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }

    /// Whether this status counts against the error instruments.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Everything telemetry knows about one finished request.
///
/// Exactly one record is emitted per request, regardless of outcome;
/// the pipeline guarantees this with a drop guard.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    /// Identity and parameters the request ran with.
    pub context: RequestContext,
    /// Terminal outcome.
    pub status: RequestStatus,
    /// Stable error classifier (`timeout`, `quota`, ...) when status is
    /// not success and the failure came from generation.
    pub error_type: Option<String>,
    /// Wall-clock latency of the whole pipeline in milliseconds.
    pub latency_ms: f64,
    /// Input token count, when known.
    pub input_tokens: Option<u32>,
    /// Output token count, when known.
    pub output_tokens: Option<u32>,
    /// Cost attribution, when token counts were available.
    pub cost: Option<CostEstimate>,
    /// Security screening of the prompt, when the analyzer ran.
    pub prompt_verdict: Option<SecurityVerdict>,
    /// Security screening of the response, when one was produced.
    pub response_verdict: Option<SecurityVerdict>,
    /// Whether the prompt verdict crossed the injection alert threshold.
    pub injection_alert: bool,
    /// When the record was finalized.
    pub recorded_at: DateTime<Utc>,
}

impl TelemetryRecord {
    /// Starts a record for a request; callers fill in outcome fields
    /// with the `with_*` builders.
    #[must_use]
    pub fn new(context: RequestContext, status: RequestStatus, latency_ms: f64) -> Self {
        Self {
            context,
            status,
            error_type: None,
            latency_ms,
            input_tokens: None,
            output_tokens: None,
            cost: None,
            prompt_verdict: None,
            response_verdict: None,
            injection_alert: false,
            recorded_at: Utc::now(),
        }
    }

    /// Attaches the generation error classifier.
    #[must_use]
    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Attaches token counts.
    #[must_use]
    pub fn with_tokens(mut self, input: u32, output: u32) -> Self {
        self.input_tokens = Some(input);
        self.output_tokens = Some(output);
        self
    }

    /// Attaches the cost estimate.
    #[must_use]
    pub fn with_cost(mut self, cost: CostEstimate) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Attaches the prompt verdict and whether it crossed the alert
    /// threshold.
    #[must_use]
    pub fn with_prompt_verdict(mut self, verdict: SecurityVerdict, alert: bool) -> Self {
        self.prompt_verdict = Some(verdict);
        self.injection_alert = alert;
        self
    }

    /// Attaches the response verdict.
    #[must_use]
    pub fn with_response_verdict(mut self, verdict: SecurityVerdict) -> Self {
        self.response_verdict = Some(verdict);
        self
    }

    /// Whether either verdict flagged PII.
    #[must_use]
    pub fn pii_detected(&self) -> bool {
        self.prompt_verdict
            .as_ref()
            .is_some_and(|v| v.pii_detected)
            || self
                .response_verdict
                .as_ref()
                .is_some_and(|v| v.pii_detected)
    }
}
