//! The request pipeline.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::warn;

use sentinel_core::{
    GatewayError, GenerateRequest, GenerationBackend, GenerationError, GenerationRequest,
    RequestContext,
};
use sentinel_security::{SecurityAnalyzer, SecurityVerdict};
use sentinel_telemetry::cost;
use sentinel_telemetry::{
    CostEstimate, LogLevel, RequestStatus, ScopedSpan, TelemetryProvider, TelemetryRecord,
};

/// Stage the pipeline is in, tracked for cancellation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Request admitted, nothing run yet.
    Received,
    /// Screening the prompt.
    Analyzing,
    /// Waiting on the generation backend.
    Generating,
    /// Screening the generated response.
    Screening,
    /// Assembling the telemetry record.
    Recording,
    /// A generation error is being surfaced.
    Failed,
}

impl PipelineStage {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Screening => "screening",
            Self::Recording => "recording",
            Self::Failed => "failed",
        }
    }
}

/// Defaults and limits the pipeline resolves requests against.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model used when the request does not name one.
    pub default_model: String,
    /// Output token budget used when the request does not set one.
    pub default_max_tokens: u32,
    /// Temperature used when the request does not set one.
    pub default_temperature: f32,
    /// Region label stamped on request spans.
    pub region: String,
    /// Deadline for one generation call.
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_model: "gemini-1.5-pro".to_string(),
            default_max_tokens: 8192,
            default_temperature: 0.7,
            region: "us-central1".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything a successful request produces.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The context the request ran with, trace identifiers included.
    pub context: RequestContext,
    /// Generated text.
    pub text: String,
    /// Prompt screening verdict.
    pub prompt_verdict: SecurityVerdict,
    /// Response screening verdict.
    pub response_verdict: SecurityVerdict,
    /// Whether the prompt verdict crossed the alert threshold.
    pub injection_alert: bool,
    /// Input token count.
    pub input_tokens: u32,
    /// Output token count.
    pub output_tokens: u32,
    /// Cost attribution, when estimation succeeded.
    pub cost: Option<CostEstimate>,
    /// End-to-end pipeline latency in milliseconds.
    pub latency_ms: f64,
}

/// Orchestrates one request end to end.
pub struct RequestPipeline {
    analyzer: SecurityAnalyzer,
    telemetry: Arc<TelemetryProvider>,
    backend: Arc<dyn GenerationBackend>,
    config: PipelineConfig,
}

impl RequestPipeline {
    /// Builds the pipeline over its collaborators.
    #[must_use]
    pub fn new(
        analyzer: SecurityAnalyzer,
        telemetry: Arc<TelemetryProvider>,
        backend: Arc<dyn GenerationBackend>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            analyzer,
            telemetry,
            backend,
            config,
        }
    }

    /// Runs one request through the pipeline.
    ///
    /// Validation rejections return before the request is admitted; every
    /// admitted request emits exactly one telemetry record, including when
    /// the returned future is dropped mid-flight.
    ///
    /// # Errors
    /// Returns validation errors from the boundary checks and typed
    /// generation errors from the backend. Nothing else propagates.
    pub async fn execute(&self, request: &GenerateRequest) -> Result<PipelineOutcome, GatewayError> {
        request.validate()?;

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let max_tokens = request.max_tokens.unwrap_or(self.config.default_max_tokens);
        let temperature = request
            .temperature
            .unwrap_or(self.config.default_temperature);

        // Pre-admission window check. A zero estimate means the estimator
        // faulted; skip the check rather than reject on bad data.
        let prompt_tokens = contained(0, || cost::estimate_tokens(&request.prompt));
        if prompt_tokens > 0 {
            cost::validate_token_limits(&model, prompt_tokens, max_tokens)?;
        }

        let mut span = self.telemetry.start_request_span(
            "llm.generate_content",
            vec![
                KeyValue::new("model_name", model.clone()),
                KeyValue::new("region", self.config.region.clone()),
                KeyValue::new("max_tokens", i64::from(max_tokens)),
                KeyValue::new("temperature", f64::from(temperature)),
                KeyValue::new("prompt_length", request.prompt.chars().count() as i64),
            ],
        );
        let context = RequestContext::new(&request.prompt, &model, max_tokens, temperature)
            .with_trace(span.trace_id(), span.span_id());

        let mut guard = EmitGuard::new(Arc::clone(&self.telemetry), context.clone());

        guard.stage = PipelineStage::Analyzing;
        let prompt_verdict = contained(SecurityVerdict::empty(), || {
            self.analyzer.analyze_prompt(&request.prompt)
        });
        let injection_alert = self.analyzer.exceeds_threshold(&prompt_verdict);
        if injection_alert {
            warn!(
                request_id = %context.request_id.as_str(),
                risk_score = prompt_verdict.risk_score,
                "prompt injection risk above threshold"
            );
        }
        guard.observe_prompt(prompt_verdict.clone(), injection_alert);
        span.set_attribute(KeyValue::new(
            "injection_detected",
            prompt_verdict.injection_detected,
        ));

        guard.stage = PipelineStage::Generating;
        let backend_request = GenerationRequest {
            model: model.clone(),
            prompt: request.prompt.clone(),
            max_tokens,
            temperature,
        };
        let mut backend_span = self.telemetry.start_child_span(
            &span,
            "llm.backend.call",
            vec![KeyValue::new("model_name", model.clone())],
        );
        let result = match tokio::time::timeout(
            self.config.request_timeout,
            self.backend.generate(&backend_request),
        )
        .await
        {
            Ok(Ok(result)) => {
                backend_span.set_success(true);
                result
            }
            Ok(Err(error)) => {
                backend_span.record_failure(&error.to_string());
                return self.fail(guard, span, error);
            }
            Err(_) => {
                let error = GenerationError::Timeout {
                    elapsed_ms: self.config.request_timeout.as_millis() as u64,
                };
                backend_span.record_failure(&error.to_string());
                return self.fail(guard, span, error);
            }
        };
        backend_span.end();

        guard.stage = PipelineStage::Screening;
        let response_verdict = contained(SecurityVerdict::empty(), || {
            self.analyzer.analyze_response(&result.text)
        });

        guard.stage = PipelineStage::Recording;
        let latency_ms = guard.started.elapsed().as_secs_f64() * 1000.0;
        let cost_estimate = contained(None, || {
            Some(cost::estimate_cost(
                &model,
                result.input_tokens,
                result.output_tokens,
            ))
        });

        let mut record = TelemetryRecord::new(context.clone(), RequestStatus::Success, latency_ms)
            .with_tokens(result.input_tokens, result.output_tokens)
            .with_prompt_verdict(prompt_verdict.clone(), injection_alert)
            .with_response_verdict(response_verdict.clone());
        if let Some(cost_estimate) = cost_estimate.clone() {
            record = record.with_cost(cost_estimate);
        }
        guard.disarm();
        self.telemetry.record_request(&record);
        span.set_success(true);

        self.telemetry.log_structured(
            LogLevel::Info,
            "generation complete",
            &serde_json::json!({
                "request_id": context.request_id.as_str(),
                "trace_id": context.trace_id,
                "span_id": context.span_id,
                "model": model,
                "latency_ms": latency_ms,
                "input_tokens": result.input_tokens,
                "output_tokens": result.output_tokens,
                "injection_detected": prompt_verdict.injection_detected,
                "pii_detected": record.pii_detected(),
            }),
        );

        Ok(PipelineOutcome {
            context,
            text: result.text,
            prompt_verdict,
            response_verdict,
            injection_alert,
            input_tokens: result.input_tokens,
            output_tokens: result.output_tokens,
            cost: cost_estimate,
            latency_ms,
        })
    }

    fn fail(
        &self,
        mut guard: EmitGuard,
        mut span: ScopedSpan,
        error: GenerationError,
    ) -> Result<PipelineOutcome, GatewayError> {
        guard.stage = PipelineStage::Failed;
        let status = match &error {
            GenerationError::Timeout { .. } => RequestStatus::Timeout,
            _ => RequestStatus::Error,
        };
        let latency_ms = guard.started.elapsed().as_secs_f64() * 1000.0;

        let mut record = TelemetryRecord::new(guard.context.clone(), status, latency_ms)
            .with_error_type(error.error_type());
        if let Some(verdict) = guard.prompt_verdict.clone() {
            record = record.with_prompt_verdict(verdict, guard.injection_alert);
        }
        guard.disarm();
        self.telemetry.record_request(&record);
        span.record_failure(&error.to_string());

        self.telemetry.log_structured(
            LogLevel::Error,
            "generation failed",
            &serde_json::json!({
                "request_id": guard.context.request_id.as_str(),
                "trace_id": guard.context.trace_id,
                "span_id": guard.context.span_id,
                "model": guard.context.model,
                "error_type": error.error_type(),
                "latency_ms": latency_ms,
            }),
        );

        Err(error.into())
    }
}

/// Runs an instrumentation stage, swallowing any panic it raises.
fn contained<T>(fallback: T, stage: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(stage)) {
        Ok(value) => value,
        Err(_) => {
            warn!("instrumentation stage panicked; continuing with fallback");
            fallback
        }
    }
}

/// Emits a cancellation record if the pipeline future is dropped before
/// it reaches a terminal stage.
struct EmitGuard {
    telemetry: Arc<TelemetryProvider>,
    context: RequestContext,
    prompt_verdict: Option<SecurityVerdict>,
    injection_alert: bool,
    started: Instant,
    stage: PipelineStage,
    armed: bool,
}

impl EmitGuard {
    fn new(telemetry: Arc<TelemetryProvider>, context: RequestContext) -> Self {
        Self {
            telemetry,
            context,
            prompt_verdict: None,
            injection_alert: false,
            started: Instant::now(),
            stage: PipelineStage::Received,
            armed: true,
        }
    }

    fn observe_prompt(&mut self, verdict: SecurityVerdict, alert: bool) {
        self.prompt_verdict = Some(verdict);
        self.injection_alert = alert;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for EmitGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let latency_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut record =
            TelemetryRecord::new(self.context.clone(), RequestStatus::Cancelled, latency_ms);
        if let Some(verdict) = self.prompt_verdict.take() {
            record = record.with_prompt_verdict(verdict, self.injection_alert);
        }
        self.telemetry.record_request(&record);
        warn!(
            request_id = %self.context.request_id.as_str(),
            stage = self.stage.as_str(),
            "request cancelled before completion"
        );
    }
}
