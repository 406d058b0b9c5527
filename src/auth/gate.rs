//! Auth gate
//!
//! Runs before any handler on routes that need auth. Order matters:
//! verifier presence is checked first, then token extraction, then
//! verification, so a misconfigured server (401) is distinguishable from a
//! client that sent no token or a bad one (403).

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AuthInfo, SecurityFailure, TokenVerifier};
use crate::http::RequestHead;
use crate::logger;

const BEARER_SCHEME: &str = "Bearer";
const BEARER_PREFIX_LEN: usize = "Bearer ".len();

/// How the `Authorization` value is recognized as a bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BearerMatch {
    /// `Bearer` anywhere in the value; the first 7 characters are dropped.
    /// Any other value is passed to the verifier unchanged.
    #[default]
    Contains,
    /// Value must start with `Bearer ` (scheme compared case-insensitively)
    Prefix,
}

/// Token extraction and verification for one dispatcher
#[derive(Clone)]
pub struct AuthGate {
    verifier: Option<Arc<dyn TokenVerifier>>,
    bearer_match: BearerMatch,
}

impl AuthGate {
    pub fn new(verifier: Option<Arc<dyn TokenVerifier>>) -> Self {
        Self {
            verifier,
            bearer_match: BearerMatch::default(),
        }
    }

    #[must_use]
    pub fn with_bearer_match(mut self, bearer_match: BearerMatch) -> Self {
        self.bearer_match = bearer_match;
        self
    }

    pub const fn has_verifier(&self) -> bool {
        self.verifier.is_some()
    }

    /// Authorize a request against a route's auth requirement.
    ///
    /// Returns `Ok(None)` when the route needs no auth.
    pub fn authorize(
        &self,
        request: &RequestHead,
        auth_needed: bool,
    ) -> Result<Option<AuthInfo>, SecurityFailure> {
        if !auth_needed {
            return Ok(None);
        }

        let Some(verifier) = self.verifier.as_deref() else {
            return Err(SecurityFailure::AuthConfigMissing);
        };

        let header = request
            .authorization()
            .ok_or(SecurityFailure::TokenMissing)?;
        let value = header.to_str().map_err(|_| {
            logger::log_warning(&format!(
                "Authorization header for {} is not visible ASCII",
                request.target()
            ));
            SecurityFailure::TokenInvalid
        })?;
        let token = extract_token(value, self.bearer_match)?;

        match panic::catch_unwind(AssertUnwindSafe(|| verifier.verify(token))) {
            Ok(Ok(info)) => Ok(Some(info)),
            Ok(Err(err)) => {
                logger::log_warning(&format!(
                    "Token rejected for {}: {err}",
                    request.target()
                ));
                Err(SecurityFailure::TokenInvalid)
            }
            Err(_) => {
                logger::log_error(&format!(
                    "Token verifier panicked for {}",
                    request.target()
                ));
                Err(SecurityFailure::TokenInvalid)
            }
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("verifier", &self.verifier.is_some())
            .field("bearer_match", &self.bearer_match)
            .finish()
    }
}

/// Pull the raw token out of an `Authorization` value
pub fn extract_token(value: &str, mode: BearerMatch) -> Result<&str, SecurityFailure> {
    match mode {
        BearerMatch::Contains => {
            if value.contains(BEARER_SCHEME) {
                Ok(value.get(BEARER_PREFIX_LEN..).unwrap_or(""))
            } else {
                Ok(value)
            }
        }
        BearerMatch::Prefix => value
            .get(..BEARER_PREFIX_LEN)
            .filter(|scheme| scheme.eq_ignore_ascii_case("Bearer "))
            .map(|_| &value[BEARER_PREFIX_LEN..])
            .ok_or(SecurityFailure::TokenInvalid),
    }
}
