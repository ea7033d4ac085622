//! Request capture and preparation for forwarding.
//!
//! # Responsibilities
//! - Buffer the inbound body exactly once, within the configured size limit
//! - Reconstruct the request URL for logging
//! - Select the headers that are forwarded to the backend
//!
//! # Design Decisions
//! - The handler owns the single buffered body; every later step borrows it
//! - Original request preserved for logging; modified copy forwarded

use std::borrow::Cow;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Method, Request};
use thiserror::Error;

/// Headers owned by a single connection, never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// The inbound body could not be read, e.g. it exceeded the size limit.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct CaptureError {
    /// URL of the request whose body was lost.
    pub url: String,
    #[source]
    pub source: axum::Error,
}

/// An inbound request whose body has been fully read.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedRequest {
    /// Consume `request`, reading at most `limit` body bytes.
    pub async fn capture(request: Request<Body>, limit: usize) -> Result<Self, CaptureError> {
        let url = request_url(&request);
        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, limit).await {
            Ok(body) => body,
            Err(source) => return Err(CaptureError { url, source }),
        };

        Ok(Self {
            method: parts.method,
            url,
            headers: parts.headers,
            body,
        })
    }

    /// Body as text; invalid UTF-8 sequences are replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Absolute URL of an inbound request.
///
/// Uses the request target when it is already absolute, otherwise the
/// `Host` header, otherwise just the path.
pub fn request_url<B>(request: &Request<B>) -> String {
    let uri = request.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    match request.headers().get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, path),
        None => path.to_string(),
    }
}

/// True for connection-scoped headers that must not cross the forwarder.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Inbound headers to send to the backend.
///
/// `host` and `content-length` are left to the outbound client, which
/// derives them from the backend URL and the buffered body.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name == header::HOST || name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
