// Server module entry point
// Listener setup, connection serving and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::time::Duration;

use tokio::time::Instant;

use crate::config::AppState;

// Re-export common types
pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::start_signal_handler;

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Wait for open connections to finish, at most `grace`.
///
/// Returns how many were still open when waiting stopped.
pub async fn drain_connections(state: &AppState, grace: Duration) -> usize {
    let deadline = Instant::now() + grace;
    loop {
        let active = state.active_connections();
        if active == 0 || Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
