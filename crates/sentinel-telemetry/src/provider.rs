//! The telemetry provider.
//!
//! One provider is built at startup and shared behind an `Arc` for the
//! life of the process. Initialization never fails: when the OTLP
//! exporters cannot be constructed the provider comes up in degraded
//! mode with the same SDK instruments wired to nothing, so callers
//! record against an identical surface either way.

use std::borrow::Cow;

use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
use opentelemetry::trace::{TraceContextExt as _, Tracer as _, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::reader::{DefaultAggregationSelector, DefaultTemporalitySelector};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace as sdktrace;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;
use crate::metrics::MirrorMetrics;
use crate::record::TelemetryRecord;
use crate::span::ScopedSpan;

/// Whether the OTLP export pipeline is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryMode {
    /// Spans and metrics are exported to the configured collector.
    Ready,
    /// Export is unavailable; instruments record locally only.
    Degraded,
}

impl TelemetryMode {
    /// Stable label for logs and the health endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Degraded => "degraded",
        }
    }
}

/// Severity for [`TelemetryProvider::log_structured`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Degraded but serving.
    Warn,
    /// A request or subsystem failed.
    Error,
}

struct Instruments {
    requests: Counter<u64>,
    latency: Histogram<f64>,
    errors: Counter<u64>,
    generation_failures: Counter<u64>,
    injection_detected: Counter<u64>,
}

/// Owns the tracer and meter providers and the fixed gateway instruments.
pub struct TelemetryProvider {
    mode: TelemetryMode,
    service_name: String,
    environment: String,
    tracer: sdktrace::Tracer,
    tracer_provider: sdktrace::TracerProvider,
    meter_provider: SdkMeterProvider,
    instruments: Instruments,
    mirror: Option<MirrorMetrics>,
}

impl TelemetryProvider {
    /// Builds the provider. Infallible: any exporter construction error
    /// is logged and the provider comes up degraded instead.
    #[must_use]
    pub fn initialize(config: &TelemetryConfig) -> Self {
        match config.otlp_endpoint.as_deref() {
            None => {
                info!("no OTLP endpoint configured; telemetry running in degraded mode");
                Self::build(config, None)
            }
            Some(endpoint) => match Self::build_otlp(config, endpoint) {
                Ok(provider) => {
                    info!(endpoint, "telemetry initialized with OTLP export");
                    provider
                }
                Err(reason) => {
                    warn!(
                        endpoint,
                        reason, "OTLP exporter unavailable; continuing in degraded mode"
                    );
                    Self::build(config, None)
                }
            },
        }
    }

    fn resource(config: &TelemetryConfig) -> Resource {
        Resource::new(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("deployment.environment", config.environment.clone()),
        ])
    }

    fn build_otlp(config: &TelemetryConfig, endpoint: &str) -> Result<Self, String> {
        let span_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint.to_string())
            .build_span_exporter()
            .map_err(|e| format!("span exporter: {e}"))?;
        let metric_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint.to_string())
            .build_metrics_exporter(
                Box::new(DefaultAggregationSelector::new()),
                Box::new(DefaultTemporalitySelector::new()),
            )
            .map_err(|e| format!("metrics exporter: {e}"))?;
        Ok(Self::build(config, Some((span_exporter, metric_exporter))))
    }

    fn build(
        config: &TelemetryConfig,
        exporters: Option<(
            opentelemetry_otlp::SpanExporter,
            opentelemetry_otlp::MetricsExporter,
        )>,
    ) -> Self {
        let resource = Self::resource(config);
        let sampler = sdktrace::Sampler::ParentBased(Box::new(
            sdktrace::Sampler::TraceIdRatioBased(config.effective_sampling_rate()),
        ));
        let trace_config = sdktrace::Config::default()
            .with_sampler(sampler)
            .with_resource(resource.clone());

        let (mode, tracer_provider, meter_provider) = match exporters {
            Some((span_exporter, metric_exporter)) => {
                let tracer_provider = sdktrace::TracerProvider::builder()
                    .with_batch_exporter(span_exporter, runtime::Tokio)
                    .with_config(trace_config)
                    .build();
                let reader = PeriodicReader::builder(metric_exporter, runtime::Tokio)
                    .with_interval(config.export_interval)
                    .build();
                let meter_provider = SdkMeterProvider::builder()
                    .with_reader(reader)
                    .with_resource(resource)
                    .build();
                (TelemetryMode::Ready, tracer_provider, meter_provider)
            }
            None => {
                let tracer_provider = sdktrace::TracerProvider::builder()
                    .with_config(trace_config)
                    .build();
                let meter_provider = SdkMeterProvider::builder().with_resource(resource).build();
                (TelemetryMode::Degraded, tracer_provider, meter_provider)
            }
        };

        let tracer = tracer_provider.tracer("sentinel-telemetry");
        let meter = meter_provider.meter("sentinel-telemetry");
        let instruments = Instruments {
            requests: meter
                .u64_counter("llm.requests")
                .with_description("Total LLM requests processed")
                .with_unit("1")
                .init(),
            latency: meter
                .f64_histogram("llm.request.latency")
                .with_description("End-to-end request latency")
                .with_unit("ms")
                .init(),
            errors: meter
                .u64_counter("llm.errors")
                .with_description("Requests that ended in a failure status")
                .with_unit("1")
                .init(),
            generation_failures: meter
                .u64_counter("llm.generation.failures")
                .with_description("Generation attempts that failed, by error type")
                .with_unit("1")
                .init(),
            injection_detected: meter
                .u64_counter("llm.prompt.injection.detected")
                .with_description("Prompts whose injection risk crossed the alert threshold")
                .with_unit("1")
                .init(),
        };

        let mirror = match MirrorMetrics::new() {
            Ok(mirror) => Some(mirror),
            Err(e) => {
                error!(error = %e, "failed to build the metrics mirror; /metrics will be empty");
                None
            }
        };

        Self {
            mode,
            service_name: config.service_name.clone(),
            environment: config.environment.clone(),
            tracer,
            tracer_provider,
            meter_provider,
            instruments,
            mirror,
        }
    }

    /// Whether the OTLP pipeline is exporting.
    #[must_use]
    pub const fn mode(&self) -> TelemetryMode {
        self.mode
    }

    /// Starts a root span for a request.
    #[must_use]
    pub fn start_request_span(
        &self,
        name: impl Into<Cow<'static, str>>,
        attributes: Vec<KeyValue>,
    ) -> ScopedSpan {
        let span = self
            .tracer
            .span_builder(name)
            .with_attributes(attributes)
            .start(&self.tracer);
        ScopedSpan::new(span)
    }

    /// Starts a child span under an existing request span. Falls back to
    /// a fresh root if the parent has already ended.
    #[must_use]
    pub fn start_child_span(
        &self,
        parent: &ScopedSpan,
        name: impl Into<Cow<'static, str>>,
        attributes: Vec<KeyValue>,
    ) -> ScopedSpan {
        let builder = self.tracer.span_builder(name).with_attributes(attributes);
        let span = match parent.span_context() {
            Some(parent_context) => {
                let cx = opentelemetry::Context::new().with_remote_span_context(parent_context);
                builder.start_with_context(&self.tracer, &cx)
            }
            None => builder.start(&self.tracer),
        };
        ScopedSpan::new(span)
    }

    /// Records one finished request against every applicable instrument.
    ///
    /// This is the single choke point for request metrics; it must not
    /// fail, and the SDK recording calls cannot.
    pub fn record_request(&self, record: &TelemetryRecord) {
        let model = record.context.model.as_str();
        let status = record.status.as_str();
        let error_type = record.error_type.as_deref().unwrap_or("none");

        let attributes = [
            KeyValue::new("service", self.service_name.clone()),
            KeyValue::new("environment", self.environment.clone()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("status", status),
        ];

        self.instruments.requests.add(1, &attributes);
        self.instruments.latency.record(record.latency_ms, &attributes);
        if record.status.is_failure() {
            self.instruments.errors.add(1, &attributes);
        }
        if record.error_type.is_some() {
            let failure_attributes = [
                KeyValue::new("service", self.service_name.clone()),
                KeyValue::new("environment", self.environment.clone()),
                KeyValue::new("model", model.to_string()),
                KeyValue::new("error_type", error_type.to_string()),
            ];
            self.instruments
                .generation_failures
                .add(1, &failure_attributes);
        }
        if record.injection_alert {
            self.instruments.injection_detected.add(
                1,
                &[
                    KeyValue::new("service", self.service_name.clone()),
                    KeyValue::new("environment", self.environment.clone()),
                    KeyValue::new("model", model.to_string()),
                ],
            );
        }

        if let Some(mirror) = &self.mirror {
            let labels = [self.service_name.as_str(), &self.environment, model, status];
            mirror.requests.with_label_values(&labels).inc();
            mirror
                .latency
                .with_label_values(&labels)
                .observe(record.latency_ms);
            if record.status.is_failure() {
                mirror.errors.with_label_values(&labels).inc();
            }
            if record.error_type.is_some() {
                mirror
                    .generation_failures
                    .with_label_values(&[
                        self.service_name.as_str(),
                        &self.environment,
                        model,
                        error_type,
                    ])
                    .inc();
            }
            if record.injection_alert {
                mirror
                    .injection_detected
                    .with_label_values(&[self.service_name.as_str(), &self.environment, model])
                    .inc();
            }
        }
    }

    /// Emits a structured log line with the service identity attached.
    ///
    /// Serialization faults fall back to an empty field blob; this call
    /// never raises.
    pub fn log_structured(&self, level: LogLevel, message: &str, fields: &serde_json::Value) {
        let payload = serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string());
        match level {
            LogLevel::Debug => debug!(
                service = %self.service_name,
                environment = %self.environment,
                fields = %payload,
                "{message}"
            ),
            LogLevel::Info => info!(
                service = %self.service_name,
                environment = %self.environment,
                fields = %payload,
                "{message}"
            ),
            LogLevel::Warn => warn!(
                service = %self.service_name,
                environment = %self.environment,
                fields = %payload,
                "{message}"
            ),
            LogLevel::Error => error!(
                service = %self.service_name,
                environment = %self.environment,
                fields = %payload,
                "{message}"
            ),
        }
    }

    /// Prometheus text exposition of the local metric mirror.
    #[must_use]
    pub fn metrics_text(&self) -> String {
        self.mirror.as_ref().map(MirrorMetrics::render).unwrap_or_default()
    }

    /// Installs the global tracing subscriber: JSON logs plus span export
    /// through this provider's tracer. Safe to call once; a second call
    /// is ignored.
    pub fn install_subscriber(&self, log_level: &str) {
        let filter =
            EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
        let result = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .with(tracing_opentelemetry::layer().with_tracer(self.tracer.clone()))
            .try_init();
        if result.is_err() {
            // A subscriber is already installed (tests); keep it.
            debug!("tracing subscriber already installed");
        }
    }

    /// Flushes buffered spans and metrics without shutting down.
    pub fn flush(&self) {
        for result in self.tracer_provider.force_flush() {
            if let Err(e) = result {
                warn!(error = %e, "span flush failed");
            }
        }
        if let Err(e) = self.meter_provider.force_flush() {
            warn!(error = %e, "metric flush failed");
        }
    }

    /// Flushes and shuts the export pipelines down. Called once at
    /// process exit.
    pub fn shutdown(&self) {
        self.flush();
        if let Err(e) = self.meter_provider.shutdown() {
            warn!(error = %e, "meter provider shutdown failed");
        }
    }
}
