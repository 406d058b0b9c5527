// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;

use tokio::sync::watch;

use crate::logger;

/// Start the signal listener
///
/// Spawns a background task that flips `shutdown` to `true` on the first
/// SIGINT or SIGTERM.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<watch::Sender<bool>>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_error(&format!("Failed to register signal handlers: {e}"));
                    return;
                }
            };

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("[Signal] {name} received, initiating graceful shutdown"));
        shutdown.send_replace(true);
    });
}

/// Non-unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<watch::Sender<bool>>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            return;
        }
        logger::log_info("[Signal] Ctrl+C received, initiating graceful shutdown");
        shutdown.send_replace(true);
    });
}
