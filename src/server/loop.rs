// Server loop module
// Accepts connections until shutdown is signalled

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Accept connections on `listener` until `shutdown` flips to `true`.
///
/// Returning drops the listener, so no new connections are taken while
/// the open ones finish.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    if *shutdown.borrow_and_update() {
        return;
    }
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &shutdown);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    logger::log_shutdown_started(state.active_connections());
}
