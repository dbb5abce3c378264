//! A scriptable generation backend for gateway tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use sentinel_core::{GenerationBackend, GenerationError, GenerationRequest, GenerationResult};

/// What the mock does when `generate` is called.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return a canned reply with the given token counts.
    Reply {
        /// Text to return
        text: String,
        /// Reported input tokens
        input_tokens: u32,
        /// Reported output tokens
        output_tokens: u32,
    },
    /// Fail with the given error.
    Fail(GenerationError),
    /// Never resolve; forces the pipeline deadline.
    Hang,
}

/// Scriptable [`GenerationBackend`] with a call counter.
pub struct MockBackend {
    behavior: Behavior,
    healthy: bool,
    calls: AtomicUsize,
}

impl MockBackend {
    /// A backend that replies with a short canned completion.
    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Reply {
                text: text.into(),
                input_tokens: 12,
                output_tokens: 34,
            },
            healthy: true,
            calls: AtomicUsize::new(0),
        })
    }

    /// A backend that fails every call with the given error.
    pub fn failing(error: GenerationError) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Fail(error),
            healthy: true,
            calls: AtomicUsize::new(0),
        })
    }

    /// A backend that never answers.
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Hang,
            healthy: false,
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of `generate` calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply {
                text,
                input_tokens,
                output_tokens,
            } => Ok(GenerationResult {
                text: text.clone(),
                input_tokens: *input_tokens,
                output_tokens: *output_tokens,
                latency_ms: 5.0,
                model: request.model.clone(),
            }),
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::Hang => {
                futures::future::pending::<()>().await;
                Err(GenerationError::backend("unreachable"))
            }
        }
    }

    async fn health(&self) -> bool {
        self.healthy
    }
}
