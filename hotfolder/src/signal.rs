//! Shutdown signal handling

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `shutdown` on Ctrl+C or SIGTERM
pub async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, stopping...");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, stopping...");
        },
    }

    shutdown.cancel();
}
