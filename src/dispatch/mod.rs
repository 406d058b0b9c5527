//! Dispatch module
//!
//! Turns one request head into exactly one `RouteResponse`:
//! route lookup, auth gate, handler call, failure mapping.

mod dispatcher;
mod outcome;

pub use dispatcher::Dispatcher;
pub use outcome::{DispatchStage, Dispatched, HandlerError, RouteResponse};
