//! Forwarding error types.

use axum::http::StatusCode;
use thiserror::Error;

/// Failure raised to the caller of [`Forwarder::forward`](super::Forwarder::forward).
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The backend answered, but not with an ok status.
    #[error("Backend returned status {status} from {url}")]
    Backend { url: String, status: StatusCode },
}

/// A failed attempt to get an answer from the backend.
///
/// These never propagate; the forwarder turns them into a synthesized
/// response.
#[derive(Debug, Error)]
pub enum TransportFailure {
    /// Could not connect, timed out, or the request never made it out.
    #[error("Network error: Unable to reach backend at {url}")]
    Network { url: String, source: reqwest::Error },

    /// Anything else, e.g. the response body could not be read.
    #[error("Backend error: {source}")]
    Other { source: reqwest::Error },
}

impl TransportFailure {
    pub fn classify(url: &str, source: reqwest::Error) -> Self {
        if source.is_connect() || source.is_timeout() || source.is_request() {
            TransportFailure::Network {
                url: url.to_string(),
                source,
            }
        } else {
            TransportFailure::Other { source }
        }
    }

    /// Status of the synthesized response.
    pub fn status(&self) -> StatusCode {
        match self {
            TransportFailure::Network { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TransportFailure::Other { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// `error_type` of the FORWARD_ERROR record.
    pub fn error_type(&self) -> &'static str {
        match self {
            TransportFailure::Network { .. } => "NETWORK_ERROR",
            TransportFailure::Other { .. } => "TRANSPORT_ERROR",
        }
    }

    /// Underlying client error, for diagnostics.
    pub fn source_error(&self) -> &reqwest::Error {
        match self {
            TransportFailure::Network { source, .. } | TransportFailure::Other { source } => source,
        }
    }
}
