// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

use crate::auth::BearerMatch;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Upper bound of the blocking pool that runs verification and handlers
    pub blocking_threads: Option<usize>,
    pub backlog: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed for a request head to arrive
    pub read_timeout: u64,
    /// Lifetime cap of one connection in seconds, 0 for none
    pub connection_timeout: u64,
    /// Bound on verification plus handler time in milliseconds, 0 for none
    pub handler_timeout_ms: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for open connections on shutdown
    pub shutdown_grace: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct HttpConfig {
    /// Value of the `Server` response header, omitted when unset
    #[serde(default)]
    pub server_name: Option<String>,
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub bearer_match: BearerMatch,
    /// No verifier means auth-required routes answer 401
    #[serde(default)]
    pub verifier: Option<VerifierConfig>,
}

/// Token verifier selection
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerifierConfig {
    Static {
        tokens: Vec<StaticToken>,
    },
    Jwt {
        secret: String,
        #[serde(default)]
        issuer: Option<String>,
        #[serde(default)]
        audience: Option<String>,
        #[serde(default = "default_jwt_leeway")]
        leeway: u64,
    },
}

impl VerifierConfig {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::Jwt { .. } => "jwt",
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_jwt_leeway() -> u64 {
    60
}

/// One accepted token of the static verifier
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StaticToken {
    pub token: String,
    pub subject: String,
}

/// One route of the route table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default)]
    pub auth_needed: bool,
    pub action: RouteAction,
}

/// Built-in handler a configured route runs
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// Fixed status and body
    Text {
        #[serde(default = "default_text_status")]
        status: u16,
        body: String,
    },
    /// Caller's verified claims as JSON
    Claims,
    /// `METHOD target` of the request
    Echo,
}

#[allow(clippy::missing_const_for_fn)]
fn default_text_status() -> u16 {
    200
}
