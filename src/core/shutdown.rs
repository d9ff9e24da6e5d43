use tokio::signal;

/// Resolves once the process receives SIGINT or SIGTERM, logging which
/// signal triggered the shutdown.
pub(crate) async fn shutdown_signal() {
    tokio::select! {
        _ = interrupt() => tracing::info!("SIGINT received, shutting down"),
        _ = terminate() => tracing::info!("SIGTERM received, shutting down"),
    }
}

async fn interrupt() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await
}
