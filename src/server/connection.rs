// Connection handling module
// Accepts a single TCP connection and serves HTTP/1 requests on it

use std::future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Keeps a connection counted as active until dropped
#[derive(Debug)]
pub struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    /// Count one more connection unless `limit` is already reached
    pub fn acquire(active: &Arc<AtomicUsize>, limit: Option<u64>) -> Option<Self> {
        // Increment first, then check limit
        let prev_count = active.fetch_add(1, Ordering::SeqCst);
        if let Some(max_conn) = limit {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                active.fetch_sub(1, Ordering::SeqCst);
                return None;
            }
        }
        Some(Self {
            active: Arc::clone(active),
        })
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Accept a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `shutdown` - Flips to `true` when the server stops
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    shutdown: &watch::Receiver<bool>,
) {
    let limit = state.config.performance.max_connections;
    let Some(guard) = ConnectionGuard::acquire(&state.active_connections, limit) else {
        logger::log_warning(&format!(
            "Max connections reached: {}/{}. Connection from {peer_addr} rejected.",
            state.active_connections(),
            limit.unwrap_or_default()
        ));
        drop(stream);
        return;
    };

    if state.cached_access_log {
        logger::log_connection_accepted(&peer_addr);
    }
    if let Err(e) = stream.set_nodelay(true) {
        logger::log_debug(&format!("[Connection] TCP_NODELAY failed for {peer_addr}: {e}"));
    }

    handle_connection(stream, peer_addr, Arc::clone(state), shutdown.clone(), guard);
}

/// Serve one connection in a spawned task.
///
/// Requests on a connection are handled one at a time, so responses leave in
/// request order. When shutdown is signalled or the connection outlives
/// `connection_timeout`, it finishes the request in flight and then closes.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
    guard: ConnectionGuard,
) {
    tokio::spawn(async move {
        let _guard = guard;
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(state.config.performance.keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(state.read_timeout());

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );
        tokio::pin!(conn);

        let deadline = state
            .config
            .performance
            .connection_timeout()
            .map(|limit| Instant::now() + limit);

        let mut draining = *shutdown.borrow_and_update();
        if draining {
            conn.as_mut().graceful_shutdown();
        }
        let mut expired = false;

        // Both shutdown and the lifetime cap stop reading new requests but
        // let the one in flight write its response
        let result = loop {
            tokio::select! {
                result = conn.as_mut() => break result,
                _ = shutdown.changed(), if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
                () = expire(deadline), if !expired => {
                    expired = true;
                    logger::log_warning(&format!(
                        "Connection from {peer_addr} reached its {} second limit, closing",
                        state.config.performance.connection_timeout
                    ));
                    conn.as_mut().graceful_shutdown();
                }
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_timeout() || err.is_incomplete_message() => {
                logger::log_debug(&format!("[Connection] {peer_addr} closed: {err}"));
            }
            Err(err) => logger::log_connection_error(&err),
        }
    });
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending::<()>().await,
    }
}
