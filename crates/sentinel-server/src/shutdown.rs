//! Graceful shutdown handling.

use tokio::signal;
use tracing::info;

/// Resolves when the process receives SIGINT or SIGTERM.
///
/// Used with axum's `with_graceful_shutdown`: the listener stops
/// accepting, in-flight requests drain, and the caller flushes telemetry
/// before exiting.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            // Fall through; the other branch may still fire.
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C; shutting down"),
        () = terminate => info!("received SIGTERM; shutting down"),
    }
}
