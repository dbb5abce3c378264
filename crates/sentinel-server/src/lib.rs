//! HTTP server for the LLM Sentinel Gateway.
//!
//! Axum routes over the request pipeline: `POST /generate` plus the
//! observability surface (`/health`, `/config`, `/metrics`). Error
//! responses carry the gateway error taxonomy mapped onto HTTP status
//! codes.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
