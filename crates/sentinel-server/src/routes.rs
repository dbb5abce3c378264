//! Route definitions for the gateway API.

use axum::routing::{get, post};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the API router over the shared state.
///
/// The concurrency limit is global and shared across connections;
/// requests beyond it queue rather than fail.
pub fn create_router(state: AppState) -> Router {
    let max_concurrent = state.settings.max_concurrent_requests;
    Router::new()
        .route("/generate", post(handlers::generate))
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::config))
        .route("/metrics", get(handlers::metrics))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
