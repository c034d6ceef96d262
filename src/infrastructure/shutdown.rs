use tokio::signal;
use tracing::{info, warn};

/// Process signal that asked the controller to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

/// Resolves on SIGINT or SIGTERM.
///
/// A handler that fails to install never resolves, so the keyboard remains
/// the only way out.
pub async fn interrupted() -> Signal {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                Signal::Terminate
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Signal>();

    let signal = tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    };
    info!("Received {:?} signal", signal);
    signal
}
