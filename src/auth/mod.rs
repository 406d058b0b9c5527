//! Auth module
//!
//! Bearer-token authentication for routes that require it:
//! - `TokenVerifier` contract plus static-table and JWT implementations
//! - `AuthGate` extraction and verification
//! - `AuthInfo` claims scoped to a single request

mod gate;
mod jwt;
mod types;
mod verifier;

pub use gate::{extract_token, AuthGate, BearerMatch};
pub use jwt::JwtVerifier;
pub use types::{AuthInfo, SecurityFailure};
pub use verifier::{StaticTokenVerifier, TokenVerifier, VerifyError};
