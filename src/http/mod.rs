//! HTTP protocol layer module
//!
//! Request head capture, keep-alive negotiation and response rendering,
//! decoupled from dispatch logic.

pub mod keep_alive;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use keep_alive::ConnectionDirective;
pub use request::RequestHead;
pub use response::ResponseBuilder;
