//! Token verifier contract and the static token table

use std::collections::HashMap;

use thiserror::Error;

use super::AuthInfo;

/// Validates an opaque bearer token
///
/// Implementations must be shareable across connections; they hold no
/// per-request state.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthInfo, VerifyError>;
}

/// Verifier-internal failure detail. Logged, never sent to the client.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("empty token")]
    Empty,
    #[error("unknown token")]
    Unknown,
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Fixed table of accepted tokens, each bound to a subject
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, subject: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), subject.into());
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<T, S> FromIterator<(T, S)> for StaticTokenVerifier
where
    T: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (T, S)>>(iter: I) -> Self {
        Self {
            tokens: iter
                .into_iter()
                .map(|(t, s)| (t.into(), s.into()))
                .collect(),
        }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<AuthInfo, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::Empty);
        }
        self.tokens
            .get(token)
            .map(AuthInfo::new)
            .ok_or(VerifyError::Unknown)
    }
}
