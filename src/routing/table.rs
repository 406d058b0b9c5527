//! Route table
//!
//! Exact-match lookup from request target to `Route`. Built once at startup,
//! then shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::auth::AuthInfo;
use crate::dispatch::{HandlerError, RouteResponse};
use crate::http::RequestHead;

/// Handler invoked for a matched route
///
/// `auth` is `Some` only on routes that need auth, and only after the token
/// verified. Returning `Err` produces a 500 with the error message as body.
pub trait RouteHandler: Send + Sync {
    fn handle(
        &self,
        request: &RequestHead,
        auth: Option<&AuthInfo>,
    ) -> Result<RouteResponse, HandlerError>;
}

impl<F> RouteHandler for F
where
    F: Fn(&RequestHead, Option<&AuthInfo>) -> Result<RouteResponse, HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        request: &RequestHead,
        auth: Option<&AuthInfo>,
    ) -> Result<RouteResponse, HandlerError> {
        self(request, auth)
    }
}

/// A registered path with its auth requirement and handler
#[derive(Clone)]
pub struct Route {
    path: String,
    auth_needed: bool,
    handler: Arc<dyn RouteHandler>,
}

impl Route {
    pub fn new(path: impl Into<String>, auth_needed: bool, handler: impl RouteHandler + 'static) -> Self {
        Self {
            path: path.into(),
            auth_needed,
            handler: Arc::new(handler),
        }
    }

    /// Closure form of `new`; lets the closure signature be inferred
    pub fn from_fn<F>(path: impl Into<String>, auth_needed: bool, handler: F) -> Self
    where
        F: Fn(&RequestHead, Option<&AuthInfo>) -> Result<RouteResponse, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(path, auth_needed, handler)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn auth_needed(&self) -> bool {
        self.auth_needed
    }

    pub fn handle(
        &self,
        request: &RequestHead,
        auth: Option<&AuthInfo>,
    ) -> Result<RouteResponse, HandlerError> {
        self.handler.handle(request, auth)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("auth_needed", &self.auth_needed)
            .finish_non_exhaustive()
    }
}

/// Lookup seam for the dispatcher; swap in another strategy by implementing it
pub trait RouteLookup: Send + Sync {
    fn lookup(&self, path: &str) -> Option<&Route>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route already registered: {0}")]
    Duplicate(String),
}

/// Exact-string route table
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route; a path can only be registered once.
    pub fn insert(&mut self, route: Route) -> Result<(), RouteError> {
        if self.routes.contains_key(route.path()) {
            return Err(RouteError::Duplicate(route.path));
        }
        self.routes.insert(route.path.clone(), route);
        Ok(())
    }

    pub fn with_route(mut self, route: Route) -> Result<Self, RouteError> {
        self.insert(route)?;
        Ok(self)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

impl RouteLookup for RouteTable {
    fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    fn len(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Method, Version};

    fn ok_handler(_: &RequestHead, _: Option<&AuthInfo>) -> Result<RouteResponse, HandlerError> {
        Ok(RouteResponse::ok("ok"))
    }

    fn table() -> RouteTable {
        RouteTable::new()
            .with_route(Route::new("/public", false, ok_handler))
            .and_then(|t| t.with_route(Route::new("/secure", true, ok_handler)))
            .unwrap()
    }

    #[test]
    fn test_lookup_exact() {
        let table = table();
        let route = table.lookup("/secure").unwrap();
        assert_eq!(route.path(), "/secure");
        assert!(route.auth_needed());
        assert!(!table.lookup("/public").unwrap().auth_needed());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lookup_does_not_normalize() {
        let table = table();
        assert!(table.lookup("/secure/").is_none());
        assert!(table.lookup("/secure?x=1").is_none());
        assert!(table.lookup("/SECURE").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = table();
        assert_eq!(
            table.insert(Route::new("/public", true, ok_handler)),
            Err(RouteError::Duplicate("/public".to_string()))
        );
        assert!(!table.lookup("/public").unwrap().auth_needed());
    }

    #[test]
    fn test_route_calls_handler() {
        let route = Route::from_fn("/echo", false, |req, _| {
            Ok(RouteResponse::ok(req.target().to_string()))
        });
        let head = RequestHead::new(Method::GET, "/echo", Version::HTTP_11);
        assert_eq!(route.handle(&head, None).unwrap().body(), "/echo");
    }
}
