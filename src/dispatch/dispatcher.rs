//! Request dispatcher
//!
//! Per request: `lookup -> (auth gate) -> handler -> RouteResponse`.
//! Every path ends in exactly one `RouteResponse`; nothing raised by a
//! handler or verifier escapes to the connection layer.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use super::{DispatchStage, Dispatched, RouteResponse};
use crate::auth::AuthGate;
use crate::http::RequestHead;
use crate::logger;
use crate::routing::RouteLookup;

const TIMED_OUT_MESSAGE: &str = "request processing timed out";

pub struct Dispatcher {
    routes: Arc<dyn RouteLookup>,
    gate: AuthGate,
    handler_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(routes: Arc<dyn RouteLookup>, gate: AuthGate) -> Self {
        Self {
            routes,
            gate,
            handler_timeout: None,
        }
    }

    /// Upper bound for `dispatch_bounded`; `None` waits indefinitely
    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub const fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Dispatch one request on the calling thread.
    pub fn dispatch(&self, request: &RequestHead) -> Dispatched {
        let dispatched = self.run(request);
        logger::log_debug(&format!(
            "[Dispatch] {} {} -> {} ({})",
            request.method(),
            request.target(),
            dispatched.response.status().as_u16(),
            dispatched.stage
        ));
        dispatched
    }

    fn run(&self, request: &RequestHead) -> Dispatched {
        let Some(route) = self.routes.lookup(request.target()) else {
            return Dispatched::new(
                DispatchStage::NotFound,
                RouteResponse::not_found(request.target()),
            );
        };

        // AuthInfo lives only in this frame and is lent to the handler
        let auth = match self.gate.authorize(request, route.auth_needed()) {
            Ok(auth) => auth,
            Err(failure) => {
                return Dispatched::new(DispatchStage::AuthRejected, failure.into());
            }
        };
        let subject = auth.as_ref().map(|info| info.subject().to_string());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| route.handle(request, auth.as_ref())));
        let dispatched = match outcome {
            Ok(Ok(response)) => Dispatched::new(DispatchStage::Handled, response),
            Ok(Err(err)) => {
                logger::log_error(&format!(
                    "Handler for {} failed: {err}",
                    route.path()
                ));
                Dispatched::new(DispatchStage::HandlerFailed, err.into())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                logger::log_error(&format!(
                    "Handler for {} panicked: {message}",
                    route.path()
                ));
                Dispatched::new(
                    DispatchStage::HandlerFailed,
                    RouteResponse::internal_error(message),
                )
            }
        };
        dispatched.with_subject(subject)
    }

    /// Dispatch on the blocking pool, bounded by the handler timeout.
    ///
    /// Verification and handler work may block, so they never run on the
    /// task that drives the connection. On timeout the blocking job is left
    /// to finish on its own and its result is discarded.
    pub async fn dispatch_bounded(self: Arc<Self>, request: RequestHead) -> Dispatched {
        let limit = self.handler_timeout;
        let target = request.target().to_string();
        let task = tokio::task::spawn_blocking(move || self.dispatch(&request));

        let joined = match limit {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    logger::log_warning(&format!(
                        "Dispatch of {target} exceeded {} ms",
                        limit.as_millis()
                    ));
                    return Dispatched::new(
                        DispatchStage::TimedOut,
                        RouteResponse::internal_error(TIMED_OUT_MESSAGE),
                    );
                }
            },
            None => task.await,
        };

        joined.unwrap_or_else(|err| {
            logger::log_error(&format!("Dispatch task for {target} failed: {err}"));
            Dispatched::new(
                DispatchStage::HandlerFailed,
                RouteResponse::internal_error("request processing failed"),
            )
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("gate", &self.gate)
            .field("handler_timeout", &self.handler_timeout)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
