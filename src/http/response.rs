//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hold a fully read backend response for logging and replay
//! - Synthesize responses when the backend cannot be reached
//! - Strip hop-by-hop headers before replaying to the client
//!
//! # Design Decisions
//! - Backend bodies are buffered: the body is logged and returned unchanged
//! - `x-serviceVersion` is added by a response-header layer, not here

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::is_hop_by_hop;

/// Response header carrying the service version.
pub const SERVICE_VERSION_HEADER: HeaderName = HeaderName::from_static("x-serviceversion");

/// A backend (or synthesized) response with its body already read.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            status_text: status_text(status),
            headers,
            body,
        }
    }

    /// Plain-text response produced by the forwarder itself.
    pub fn synthesized(status: StatusCode, message: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self::new(status, headers, Bytes::from(message.into()))
    }

    /// Whether the status counts as a usable answer (2xx or 3xx).
    pub fn is_ok(&self) -> bool {
        is_ok_status(self.status)
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        response
    }
}

/// 2xx and 3xx statuses are passed through as successful backend answers.
pub fn is_ok_status(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

/// Canonical reason phrase, or an empty string for unregistered codes.
pub fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

/// Header value for `version`, falling back to `"unknown"` when the
/// version cannot be sent as a header.
pub fn version_header_value(version: &str) -> HeaderValue {
    HeaderValue::from_str(version).unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}
