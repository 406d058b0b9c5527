//! Dispatch outcome types

use hyper::StatusCode;
use thiserror::Error;

use crate::auth::SecurityFailure;

/// Status and plain-text body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    status: StatusCode,
    body: String,
}

impl RouteResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn not_found(target: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("missing resource {target}"))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

impl From<SecurityFailure> for RouteResponse {
    fn from(failure: SecurityFailure) -> Self {
        Self::new(failure.status(), failure.to_string())
    }
}

impl From<HandlerError> for RouteResponse {
    fn from(err: HandlerError) -> Self {
        Self::internal_error(err.into_message())
    }
}

/// Failure raised by a route handler; its message becomes the 500 body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

/// Terminal state a dispatch stopped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    NotFound,
    AuthRejected,
    Handled,
    HandlerFailed,
    TimedOut,
}

impl DispatchStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AuthRejected => "auth_rejected",
            Self::Handled => "handled",
            Self::HandlerFailed => "handler_failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of dispatching one request
///
/// `subject` is a copy of the authenticated subject for access logging; the
/// `AuthInfo` it came from is dropped when dispatch returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub stage: DispatchStage,
    pub response: RouteResponse,
    pub subject: Option<String>,
}

impl Dispatched {
    pub const fn new(stage: DispatchStage, response: RouteResponse) -> Self {
        Self {
            stage,
            response,
            subject: None,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }
}
