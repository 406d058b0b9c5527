//! Built-in route handlers for config-defined routes

use hyper::StatusCode;

use super::RouteHandler;
use crate::auth::AuthInfo;
use crate::dispatch::{HandlerError, RouteResponse};
use crate::http::RequestHead;

/// Fixed status and body
#[derive(Debug, Clone)]
pub struct TextHandler {
    status: StatusCode,
    body: String,
}

impl TextHandler {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

impl RouteHandler for TextHandler {
    fn handle(&self, _: &RequestHead, _: Option<&AuthInfo>) -> Result<RouteResponse, HandlerError> {
        Ok(RouteResponse::new(self.status, self.body.clone()))
    }
}

/// Reports the caller's verified identity as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsHandler;

impl RouteHandler for ClaimsHandler {
    fn handle(&self, _: &RequestHead, auth: Option<&AuthInfo>) -> Result<RouteResponse, HandlerError> {
        let Some(info) = auth else {
            return Ok(RouteResponse::ok("anonymous"));
        };
        serde_json::to_string(info)
            .map(RouteResponse::ok)
            .map_err(|e| HandlerError::new(format!("failed to encode claims: {e}")))
    }
}

/// Echoes the request line back
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl RouteHandler for EchoHandler {
    fn handle(&self, request: &RequestHead, _: Option<&AuthInfo>) -> Result<RouteResponse, HandlerError> {
        Ok(RouteResponse::ok(format!(
            "{} {}",
            request.method(),
            request.target()
        )))
    }
}
