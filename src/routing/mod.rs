//! Routing module
//!
//! Provides the route table consulted by the dispatcher:
//! - Exact-match lookup from request target to route
//! - Per-route auth requirement
//! - Built-in handlers for routes declared in configuration

mod handlers;
mod table;

pub use handlers::{ClaimsHandler, EchoHandler, TextHandler};
pub use table::{Route, RouteError, RouteHandler, RouteLookup, RouteTable};
