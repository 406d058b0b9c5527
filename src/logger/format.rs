//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables
//!
//! The authenticated subject, when there is one, fills the `$remote_user`
//! slot.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Local};
use hyper::header::{REFERER, USER_AGENT};
use hyper::Version;
use serde_json::json;

use crate::dispatch::Dispatched;
use crate::http::RequestHead;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one dispatched request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    /// Authenticated subject
    pub remote_user: Option<String>,
    pub time: DateTime<Local>,
    pub method: String,
    /// Request target as received (path plus query)
    pub target: String,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    /// Terminal dispatch stage (`handled`, `auth_rejected`, ...)
    pub stage: String,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Start an entry for a request; response fields are filled by `complete`
    pub fn for_request(peer: &SocketAddr, request: &RequestHead) -> Self {
        Self {
            remote_addr: peer.ip().to_string(),
            remote_user: None,
            time: Local::now(),
            method: request.method().to_string(),
            target: request.target().to_string(),
            http_version: version_label(request.version()).to_string(),
            status: 0,
            body_bytes: 0,
            stage: String::new(),
            referer: request.header_str(&REFERER).map(ToString::to_string),
            user_agent: request.header_str(&USER_AGENT).map(ToString::to_string),
            request_time_us: 0,
        }
    }

    /// Record the dispatch result and elapsed time
    pub fn complete(&mut self, dispatched: &Dispatched, elapsed: Duration) {
        self.remote_user.clone_from(&dispatched.subject);
        self.status = dispatched.response.status().as_u16();
        self.body_bytes = dispatched.response.body().len();
        self.stage = dispatched.stage.to_string();
        self.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.target, self.http_version)
    }

    /// `$remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - {} [{}] \"{}\" {} {}",
            self.remote_addr,
            self.remote_user.as_deref().unwrap_or("-"),
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "remote_user": self.remote_user,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "target": self.target,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "stage": self.stage,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$remote_user`, `$time_local`,
    /// `$time_iso8601`, `$request`, `$request_method`, `$request_uri`,
    /// `$status`, `$body_bytes_sent`, `$dispatch_stage`, `$http_referer`,
    /// `$http_user_agent`, `$request_time` (seconds, 3 decimals).
    fn format_custom(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;
        // Single pass: substituted values are never scanned again
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];
            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[name_len..];
        }
        out.push_str(rest);
        out
    }

    fn variable(&self, name: &str) -> Option<String> {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        Some(match name {
            "remote_addr" => self.remote_addr.clone(),
            "remote_user" => or_dash(&self.remote_user),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let secs = self.request_time_us as f64 / 1_000_000.0;
                format!("{secs:.3}")
            }
            "request_method" => self.method.clone(),
            "request_uri" => self.target.clone(),
            "request" => self.request_line(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "dispatch_stage" => self.stage.clone(),
            "http_referer" => or_dash(&self.referer),
            "http_user_agent" => or_dash(&self.user_agent),
            _ => return None,
        })
    }
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
