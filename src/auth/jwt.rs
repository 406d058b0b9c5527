//! HS256 JWT verifier
//!
//! Signature and registered-claim checks are delegated to `jsonwebtoken`; the
//! `sub` claim becomes the subject and every other claim is kept as-is.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use super::{AuthInfo, TokenVerifier, VerifyError};

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Clock skew tolerated on `exp`/`nbf`, in seconds
    #[must_use]
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.validation.leeway = leeway;
        self
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<AuthInfo, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::Empty);
        }

        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| VerifyError::Rejected(e.to_string()))?;

        let mut claims = data.claims;
        let subject = match claims.remove("sub") {
            Some(Value::String(sub)) if !sub.is_empty() => sub,
            _ => return Err(VerifyError::Rejected("missing sub claim".to_string())),
        };

        Ok(AuthInfo::with_claims(subject, claims))
    }
}
