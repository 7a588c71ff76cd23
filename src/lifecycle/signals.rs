//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl-C) or SIGTERM
//! - Translate the first one into a `Shutdown` trigger

use crate::lifecycle::shutdown::Shutdown;

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Resolve once a termination signal arrives.
pub async fn shutdown_signal() {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!(error = %e, "Ctrl-C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
        _ = terminate() => {}
    }
}

/// Wait for a termination signal and trigger `shutdown`.
pub async fn forward_signals(shutdown: &Shutdown) {
    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}
