//! Request handler module
//!
//! Bridges hyper requests to the dispatcher and records the access log.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
