//! Shared server state.

use std::sync::Arc;

use sentinel_config::Settings;
use sentinel_core::GenerationBackend;
use sentinel_pipeline::RequestPipeline;
use sentinel_telemetry::TelemetryProvider;

/// Everything the handlers share. Cheap to clone; all fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// The request pipeline.
    pub pipeline: Arc<RequestPipeline>,
    /// Telemetry, for the metrics and health endpoints.
    pub telemetry: Arc<TelemetryProvider>,
    /// The generation backend, for health probes.
    pub backend: Arc<dyn GenerationBackend>,
    /// Resolved settings, for the config endpoint.
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Starts a state builder.
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

/// Builder for [`AppState`].
#[derive(Default)]
pub struct AppStateBuilder {
    pipeline: Option<Arc<RequestPipeline>>,
    telemetry: Option<Arc<TelemetryProvider>>,
    backend: Option<Arc<dyn GenerationBackend>>,
    settings: Option<Arc<Settings>>,
}

impl AppStateBuilder {
    /// Sets the pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Arc<RequestPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the telemetry provider.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<TelemetryProvider>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Sets the generation backend.
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the settings.
    #[must_use]
    pub fn settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the state.
    ///
    /// # Errors
    /// Returns a message naming the first missing component.
    pub fn build(self) -> Result<AppState, String> {
        Ok(AppState {
            pipeline: self.pipeline.ok_or_else(|| "pipeline is required".to_string())?,
            telemetry: self.telemetry.ok_or_else(|| "telemetry is required".to_string())?,
            backend: self.backend.ok_or_else(|| "backend is required".to_string())?,
            settings: self.settings.ok_or_else(|| "settings are required".to_string())?,
        })
    }
}
