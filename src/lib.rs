//! Gatehouse: an HTTP/1 front that resolves exact-path routes, checks bearer
//! tokens on protected ones, and answers with plain-text responses.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
