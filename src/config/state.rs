// Application state module
// Holds the dispatcher and response settings shared by every connection

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use super::ConfigError;
use crate::dispatch::Dispatcher;
use crate::http::ResponseBuilder;

/// Application state
pub struct AppState {
    pub config: Config,
    pub dispatcher: Arc<Dispatcher>,
    pub responses: ResponseBuilder,

    // Cached config values for fast access
    pub cached_access_log: bool,

    /// Connections currently being served
    pub active_connections: Arc<AtomicUsize>,
}

impl AppState {
    /// Build the route table, verifier and dispatcher from `config`
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::with_dispatcher(config, config.build_dispatcher()?))
    }

    /// State around an already assembled dispatcher
    pub fn with_dispatcher(config: &Config, dispatcher: Dispatcher) -> Self {
        let responses = ResponseBuilder::new(config.performance.keep_alive)
            .with_server_name(config.http.server_name.as_deref());

        Self {
            config: config.clone(),
            dispatcher: Arc::new(dispatcher),
            responses,
            cached_access_log: config.logging.access_log,
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Time allowed for a request head to arrive, `None` when disabled
    pub const fn read_timeout(&self) -> Option<Duration> {
        match self.config.performance.read_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.config.performance.shutdown_grace)
    }
}
