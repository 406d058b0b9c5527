//! HTTP response building module
//!
//! Renders a `RouteResponse` into the wire response: plain-text body, exact
//! `Content-Length`, and the negotiated `Connection` header. hyper finishes
//! writing a `Connection: close` response before it shuts the connection.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};

use super::keep_alive::{self, ConnectionDirective};
use super::RequestHead;
use crate::dispatch::RouteResponse;

const TEXT_PLAIN: &str = "text/plain";

#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    keep_alive_enabled: bool,
    server_name: Option<HeaderValue>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResponseBuilder {
    pub const fn new(keep_alive_enabled: bool) -> Self {
        Self {
            keep_alive_enabled,
            server_name: None,
        }
    }

    /// Adds a `Server` header; names that are not valid header values are ignored
    #[must_use]
    pub fn with_server_name(mut self, name: Option<&str>) -> Self {
        self.server_name = name.and_then(|n| HeaderValue::from_str(n).ok());
        self
    }

    pub fn directive(&self, request: &RequestHead) -> ConnectionDirective {
        keep_alive::negotiate(request.version(), request.headers(), self.keep_alive_enabled)
    }

    /// Build the response for `request` from a dispatch result
    pub fn build(&self, route_response: &RouteResponse, request: &RequestHead) -> Response<Full<Bytes>> {
        let body = Bytes::from(route_response.body().to_owned());
        let directive = self.directive(request);

        let mut builder = Response::builder()
            .status(route_response.status())
            .version(request.version())
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .header(CONTENT_LENGTH, body.len());

        if let Some(value) = directive.header_value() {
            builder = builder.header(CONNECTION, value);
        }
        if let Some(name) = &self.server_name {
            builder = builder.header(SERVER, name.clone());
        }

        builder.body(Full::new(body)).unwrap_or_else(|e| {
            log_build_error(route_response.status(), &e);
            fallback_response()
        })
    }
}

/// Last-resort 500 when the builder itself fails; always closes
fn fallback_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::{Method, Version};

    fn request(version: Version, connection: Option<&'static str>) -> RequestHead {
        let head = RequestHead::new(Method::GET, "/secure", version);
        match connection {
            Some(v) => head.with_header(CONNECTION, HeaderValue::from_static(v)),
            None => head,
        }
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_headers() {
        let resp = ResponseBuilder::default()
            .build(&RouteResponse::ok("ok"), &request(Version::HTTP_11, None));

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "2");
        assert!(resp.headers().get(CONNECTION).is_none());
        assert_eq!(body_string(resp).await, "ok");
    }

    #[test]
    fn test_content_length_counts_bytes() {
        let resp = ResponseBuilder::default().build(
            &RouteResponse::ok("héllo ✓"),
            &request(Version::HTTP_11, None),
        );
        assert_eq!(resp.headers()[CONTENT_LENGTH], "10");
    }

    #[test]
    fn test_http10_keep_alive_is_explicit() {
        let resp = ResponseBuilder::default().build(
            &RouteResponse::ok("ok"),
            &request(Version::HTTP_10, Some("keep-alive")),
        );
        assert_eq!(resp.version(), Version::HTTP_10);
        assert_eq!(resp.headers()[CONNECTION], "keep-alive");
    }

    #[test]
    fn test_close_when_not_eligible() {
        let builder = ResponseBuilder::default();
        let resp = builder.build(
            &RouteResponse::not_found("/secure"),
            &request(Version::HTTP_10, None),
        );
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONNECTION], "close");

        let resp = builder.build(
            &RouteResponse::ok("ok"),
            &request(Version::HTTP_11, Some("close")),
        );
        assert_eq!(resp.headers()[CONNECTION], "close");
    }

    #[test]
    fn test_keep_alive_disabled_server_wide() {
        let resp = ResponseBuilder::new(false)
            .build(&RouteResponse::ok("ok"), &request(Version::HTTP_11, None));
        assert_eq!(resp.headers()[CONNECTION], "close");
    }

    #[test]
    fn test_server_name() {
        let resp = ResponseBuilder::default()
            .with_server_name(Some("gatehouse/0.1"))
            .build(&RouteResponse::ok("ok"), &request(Version::HTTP_11, None));
        assert_eq!(resp.headers()[SERVER], "gatehouse/0.1");
    }
}
