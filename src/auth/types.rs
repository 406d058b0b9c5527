//! Auth data types

use hyper::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Claims produced by a successful token verification
///
/// One value per authenticated request; it is handed to the handler by
/// reference and dropped with the dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthInfo {
    subject: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    claims: Map<String, Value>,
}

impl AuthInfo {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            claims: Map::new(),
        }
    }

    pub fn with_claims(subject: impl Into<String>, claims: Map<String, Value>) -> Self {
        Self {
            subject: subject.into(),
            claims,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub const fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

/// Reason a request was stopped before its handler ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SecurityFailure {
    /// Route needs auth but no verifier is configured
    #[error("missing auth token parser configuration")]
    AuthConfigMissing,
    #[error("missing auth token")]
    TokenMissing,
    #[error("invalid auth token")]
    TokenInvalid,
}

impl SecurityFailure {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::AuthConfigMissing => StatusCode::UNAUTHORIZED,
            Self::TokenMissing | Self::TokenInvalid => StatusCode::FORBIDDEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_status_mapping() {
        assert_eq!(SecurityFailure::AuthConfigMissing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(SecurityFailure::TokenMissing.status(), StatusCode::FORBIDDEN);
        assert_eq!(SecurityFailure::TokenInvalid.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_info_serializes_without_empty_claims() {
        let info = AuthInfo::new("alice");
        assert_eq!(serde_json::to_value(&info).unwrap(), json!({"subject": "alice"}));

        let mut claims = Map::new();
        claims.insert("role".to_string(), json!("admin"));
        let info = AuthInfo::with_claims("bob", claims);
        assert_eq!(info.claim("role"), Some(&json!("admin")));
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"subject": "bob", "claims": {"role": "admin"}})
        );
    }
}
