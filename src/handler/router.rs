//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: snapshot the request head, run
//! the dispatcher off the connection task, render the response.

use crate::config::AppState;
use crate::http::RequestHead;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// The request body is never read; routes act on the head alone.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let head = RequestHead::from_request(&req);
    drop(req);

    let mut entry = state
        .cached_access_log
        .then(|| AccessLogEntry::for_request(&peer, &head));

    let dispatched = Arc::clone(&state.dispatcher)
        .dispatch_bounded(head.clone())
        .await;
    let response = state.responses.build(&dispatched.response, &head);

    if let Some(entry) = entry.as_mut() {
        entry.complete(&dispatched, started.elapsed());
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH};
    use hyper::{StatusCode, Version};

    fn state() -> Arc<AppState> {
        let cfg = Config::from_toml_str(
            r#"
            [logging]
            access_log = false

            [auth.verifier]
            type = "static"
            tokens = [{ token = "t0k", subject = "alice" }]

            [[routes]]
            path = "/hello"
            action = { type = "text", body = "hi" }

            [[routes]]
            path = "/me"
            auth_needed = true
            action = { type = "claims" }
            "#,
        )
        .unwrap();
        Arc::new(AppState::new(&cfg).unwrap())
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn body_text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_known_route() {
        let req = Request::get("/hello").body(()).unwrap();
        let resp = handle_request(req, state(), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "2");
        assert!(resp.headers().get(CONNECTION).is_none());
        assert_eq!(body_text(resp).await, "hi");
    }

    #[tokio::test]
    async fn test_unknown_route_with_query() {
        let req = Request::get("/nope?x=1").body(()).unwrap();
        let resp = handle_request(req, state(), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "missing resource /nope?x=1");
    }

    #[tokio::test]
    async fn test_protected_route() {
        let req = Request::get("/me").body(()).unwrap();
        let resp = handle_request(req, state(), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(resp).await, "missing auth token");

        let req = Request::get("/me")
            .header(AUTHORIZATION, "Bearer t0k")
            .body(())
            .unwrap();
        let resp = handle_request(req, state(), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("\"subject\":\"alice\""));

        let req = Request::get("/me")
            .header(AUTHORIZATION, "Bearer wrong")
            .body(())
            .unwrap();
        let resp = handle_request(req, state(), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_http10_gets_close() {
        let req = Request::get("/hello")
            .version(Version::HTTP_10)
            .body(())
            .unwrap();
        let resp = handle_request(req, state(), peer()).await.unwrap();
        assert_eq!(resp.version(), Version::HTTP_10);
        assert_eq!(resp.headers()[CONNECTION], "close");
    }
}
