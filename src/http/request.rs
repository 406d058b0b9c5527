//! Request head captured for dispatch
//!
//! The dispatcher only needs the request line and headers, never the body, so
//! the head is copied out of the hyper request once and handed around by value.

use hyper::header::{HeaderName, HeaderValue, AUTHORIZATION};
use hyper::{HeaderMap, Method, Request, Version};

/// Method, target, version and headers of one inbound request
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    target: String,
    version: Version,
    headers: HeaderMap,
}

impl RequestHead {
    pub fn new(method: Method, target: impl Into<String>, version: Version) -> Self {
        Self {
            method,
            target: target.into(),
            version,
            headers: HeaderMap::new(),
        }
    }

    /// Capture the head of a hyper request.
    ///
    /// The target is the request-line URI as sent: query string kept, and an
    /// absolute-form target keeps its scheme and authority.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let target = req.uri().to_string();

        Self {
            method: req.method().clone(),
            target,
            version: req.version(),
            headers: req.headers().clone(),
        }
    }

    /// Builder-style header append, mostly for tests and embedders.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.headers.get(AUTHORIZATION)
    }

    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::USER_AGENT;

    #[test]
    fn test_from_request_keeps_query() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/secure?verbose=1")
            .version(Version::HTTP_10)
            .header(AUTHORIZATION, "Bearer abc")
            .body(())
            .unwrap();

        let head = RequestHead::from_request(&req);
        assert_eq!(head.method(), Method::POST);
        assert_eq!(head.target(), "/secure?verbose=1");
        assert_eq!(head.version(), Version::HTTP_10);
        assert_eq!(head.authorization().unwrap(), "Bearer abc");
    }

    #[test]
    fn test_from_request_absolute_form() {
        let req = Request::builder()
            .uri("http://example.com/status")
            .body(())
            .unwrap();

        let head = RequestHead::from_request(&req);
        assert_eq!(head.target(), "http://example.com/status");
    }

    #[test]
    fn test_header_str() {
        let head = RequestHead::new(Method::GET, "/", Version::HTTP_11)
            .with_header(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        assert_eq!(head.header_str(&USER_AGENT), Some("curl/8.0"));
        assert!(head.authorization().is_none());
    }
}
