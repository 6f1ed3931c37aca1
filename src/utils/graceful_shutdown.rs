use tokio::signal;

/// Why the server is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
}

/// Resolve once the process is asked to stop.
///
/// Intended for `axum::serve(..).with_graceful_shutdown(..)`: in-flight
/// exchanges finish, new connections are refused.
pub async fn shutdown_signal() -> ShutdownReason {
    let reason = tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
            ShutdownReason::Interrupt
        }
        _ = wait_for_sigterm() => ShutdownReason::Terminate,
    };

    tracing::info!("Received {:?}, shutting down gracefully", reason);
    reason
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix systems, we only have Ctrl+C
    std::future::pending::<()>().await;
}
