//! Keep-alive negotiation
//!
//! Decides, from the request version and its `Connection` header, whether the
//! connection survives the response and which `Connection` header to emit.

use hyper::header::{HeaderMap, HeaderValue, CONNECTION};
use hyper::Version;

/// What the response says about the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirective {
    /// Connection stays open and the version already implies it; no header
    Implicit,
    /// Connection stays open, `Connection: keep-alive` must be sent
    KeepAlive,
    /// Connection closes after the response, `Connection: close` is sent
    Close,
}

impl ConnectionDirective {
    pub const fn keeps_alive(self) -> bool {
        !matches!(self, Self::Close)
    }

    pub fn header_value(self) -> Option<HeaderValue> {
        match self {
            Self::Implicit => None,
            Self::KeepAlive => Some(HeaderValue::from_static("keep-alive")),
            Self::Close => Some(HeaderValue::from_static("close")),
        }
    }
}

/// Whether the protocol version keeps connections open without being asked
pub fn keep_alive_default(version: Version) -> bool {
    !matches!(version, Version::HTTP_09 | Version::HTTP_10)
}

/// Whether the request is eligible to keep its connection open
pub fn is_keep_alive(version: Version, headers: &HeaderMap) -> bool {
    if has_connection_token(headers, "close") {
        return false;
    }
    keep_alive_default(version) || has_connection_token(headers, "keep-alive")
}

/// Negotiate the connection directive for one response.
///
/// `server_keep_alive` is the server-wide switch; when it is off every
/// response closes its connection.
pub fn negotiate(version: Version, headers: &HeaderMap, server_keep_alive: bool) -> ConnectionDirective {
    if !server_keep_alive || !is_keep_alive(version, headers) {
        return ConnectionDirective::Close;
    }
    if keep_alive_default(version) {
        ConnectionDirective::Implicit
    } else {
        ConnectionDirective::KeepAlive
    }
}

/// `Connection` is a comma separated token list and may repeat
fn has_connection_token(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(connection: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = connection {
            map.insert(CONNECTION, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_http11_defaults_to_implicit_keep_alive() {
        let d = negotiate(Version::HTTP_11, &headers(None), true);
        assert_eq!(d, ConnectionDirective::Implicit);
        assert!(d.header_value().is_none());
    }

    #[test]
    fn test_http11_close_requested() {
        let d = negotiate(Version::HTTP_11, &headers(Some("Close")), true);
        assert_eq!(d, ConnectionDirective::Close);
        assert_eq!(d.header_value().unwrap(), "close");
    }

    #[test]
    fn test_http10_defaults_to_close() {
        assert_eq!(
            negotiate(Version::HTTP_10, &headers(None), true),
            ConnectionDirective::Close
        );
    }

    #[test]
    fn test_http10_keep_alive_requested() {
        let d = negotiate(Version::HTTP_10, &headers(Some("Keep-Alive")), true);
        assert_eq!(d, ConnectionDirective::KeepAlive);
        assert_eq!(d.header_value().unwrap(), "keep-alive");
    }

    #[test]
    fn test_token_list_with_close() {
        let map = headers(Some("keep-alive, Upgrade, close"));
        assert!(!is_keep_alive(Version::HTTP_10, &map));
        assert!(!is_keep_alive(Version::HTTP_11, &map));
    }

    #[test]
    fn test_server_switch_forces_close() {
        assert_eq!(
            negotiate(Version::HTTP_11, &headers(None), false),
            ConnectionDirective::Close
        );
    }
}
