// Configuration module entry point
// Loads configuration and turns it into the dispatcher's collaborators

mod state;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

use crate::auth::{AuthGate, JwtVerifier, StaticTokenVerifier, TokenVerifier};
use crate::dispatch::Dispatcher;
use crate::routing::{ClaimsHandler, EchoHandler, Route, RouteError, RouteTable, TextHandler};

// Re-export public types
pub use state::AppState;
pub use types::{
    AuthConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, RouteAction, RouteConfig,
    ServerConfig, StaticToken, VerifierConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("route {path}: invalid status code {status}")]
    InvalidStatus { path: String, status: u16 },
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("{0} verifier: {1}")]
    Verifier(&'static str, String),
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Missing file is fine; defaults and `GATEHOUSE__*` variables still apply
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Self::builder_with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("GATEHOUSE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse configuration from TOML text on top of the defaults
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Self::builder_with_defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.connection_timeout", 0)?
            .set_default("performance.handler_timeout_ms", 10_000)?
            .set_default("performance.shutdown_grace", 10)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::InvalidAddress(format!("{}:{} ({e})", self.server.host, self.server.port)))
    }

    /// Build the route table from the configured routes
    pub fn build_route_table(&self) -> Result<RouteTable, ConfigError> {
        let mut table = RouteTable::new();
        for route in &self.routes {
            table.insert(build_route(route)?)?;
        }
        Ok(table)
    }

    /// Build the configured token verifier, if any
    pub fn build_verifier(&self) -> Result<Option<Arc<dyn TokenVerifier>>, ConfigError> {
        let Some(verifier) = &self.auth.verifier else {
            return Ok(None);
        };

        let built: Arc<dyn TokenVerifier> = match verifier {
            VerifierConfig::Static { tokens } => {
                if let Some(blank) = tokens.iter().find(|t| t.token.is_empty()) {
                    return Err(ConfigError::Verifier(
                        "static",
                        format!("empty token for subject {}", blank.subject),
                    ));
                }
                Arc::new(
                    tokens
                        .iter()
                        .map(|t| (t.token.clone(), t.subject.clone()))
                        .collect::<StaticTokenVerifier>(),
                )
            }
            VerifierConfig::Jwt {
                secret,
                issuer,
                audience,
                leeway,
            } => {
                if secret.is_empty() {
                    return Err(ConfigError::Verifier("jwt", "secret is empty".to_string()));
                }
                let mut jwt = JwtVerifier::new(secret).with_leeway(*leeway);
                if let Some(iss) = issuer {
                    jwt = jwt.with_issuer(iss);
                }
                if let Some(aud) = audience {
                    jwt = jwt.with_audience(aud);
                }
                Arc::new(jwt)
            }
        };
        Ok(Some(built))
    }

    /// Assemble the dispatcher: routes, auth gate and handler bound
    pub fn build_dispatcher(&self) -> Result<Dispatcher, ConfigError> {
        let routes = Arc::new(self.build_route_table()?);
        let gate = AuthGate::new(self.build_verifier()?).with_bearer_match(self.auth.bearer_match);
        Ok(Dispatcher::new(routes, gate).with_handler_timeout(self.performance.handler_timeout()))
    }
}

impl PerformanceConfig {
    pub const fn handler_timeout(&self) -> Option<Duration> {
        match self.handler_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub const fn connection_timeout(&self) -> Option<Duration> {
        match self.connection_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn build_route(route: &RouteConfig) -> Result<Route, ConfigError> {
    let path = route.path.clone();
    Ok(match &route.action {
        RouteAction::Text { status, body } => {
            let status = StatusCode::from_u16(*status).map_err(|_| ConfigError::InvalidStatus {
                path: route.path.clone(),
                status: *status,
            })?;
            Route::new(path, route.auth_needed, TextHandler::new(status, body.clone()))
        }
        RouteAction::Claims => Route::new(path, route.auth_needed, ClaimsHandler),
        RouteAction::Echo => Route::new(path, route.auth_needed, EchoHandler),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BearerMatch;
    use crate::routing::RouteLookup;

    const SAMPLE: &str = r#"
        [server]
        port = 9090
        workers = 2

        [auth]
        bearer_match = "prefix"

        [auth.verifier]
        type = "static"
        tokens = [{ token = "Secret-Token", subject = "alice" }]

        [[routes]]
        path = "/status"
        action = { type = "text", body = "up" }

        [[routes]]
        path = "/secure"
        auth_needed = true
        action = { type = "claims" }

        [[routes]]
        path = "/teapot"
        action = { type = "text", status = 418, body = "short and stout" }
    "#;

    #[test]
    fn test_defaults_apply() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.performance.handler_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.performance.connection_timeout(), None);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.auth.verifier.is_none());
        assert_eq!(cfg.auth.bearer_match, BearerMatch::Contains);
        assert!(cfg.routes.is_empty());
    }

    #[test]
    fn test_sample_config() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.auth.bearer_match, BearerMatch::Prefix);
        assert_eq!(
            cfg.auth.verifier,
            Some(VerifierConfig::Static {
                tokens: vec![StaticToken {
                    token: "Secret-Token".to_string(),
                    subject: "alice".to_string(),
                }],
            })
        );
        assert_eq!(cfg.routes.len(), 3);
        assert_eq!(
            cfg.routes[0].action,
            RouteAction::Text {
                status: 200,
                body: "up".to_string()
            }
        );
        assert!(cfg.routes[1].auth_needed);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9090);
    }

    #[test]
    fn test_build_route_table() {
        let table = Config::from_toml_str(SAMPLE).unwrap().build_route_table().unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.lookup("/secure").unwrap().auth_needed());
        assert!(!table.lookup("/status").unwrap().auth_needed());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let toml = r#"
            [[routes]]
            path = "/a"
            action = { type = "echo" }

            [[routes]]
            path = "/a"
            action = { type = "claims" }
        "#;
        let err = Config::from_toml_str(toml).unwrap().build_route_table().unwrap_err();
        assert!(matches!(err, ConfigError::Route(RouteError::Duplicate(p)) if p == "/a"));
    }

    #[test]
    fn test_invalid_status_rejected() {
        let toml = r#"
            [[routes]]
            path = "/bad"
            action = { type = "text", status = 1000, body = "x" }
        "#;
        let err = Config::from_toml_str(toml).unwrap().build_route_table().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStatus { status: 1000, .. }));
    }

    #[test]
    fn test_static_verifier_keeps_token_case() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        let verifier = cfg.build_verifier().unwrap().unwrap();
        assert_eq!(verifier.verify("Secret-Token").unwrap().subject(), "alice");
        assert!(verifier.verify("secret-token").is_err());
    }

    #[test]
    fn test_jwt_verifier_needs_secret() {
        let toml = r#"
            [auth.verifier]
            type = "jwt"
            secret = ""
        "#;
        let Err(err) = Config::from_toml_str(toml).unwrap().build_verifier() else {
            panic!("empty jwt secret accepted");
        };
        assert!(matches!(err, ConfigError::Verifier("jwt", _)));
    }

    #[test]
    fn test_build_dispatcher() {
        let dispatcher = Config::from_toml_str(SAMPLE).unwrap().build_dispatcher().unwrap();
        assert_eq!(dispatcher.route_count(), 3);
        assert!(dispatcher.gate().has_verifier());
    }
}
