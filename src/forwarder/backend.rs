//! Relays captured requests to the configured backend.

use std::time::Instant;

use reqwest::Client;
use url::Url;

use crate::forwarder::error::{ForwardError, TransportFailure};
use crate::http::request::{forwardable_headers, CapturedRequest};
use crate::http::response::{is_ok_status, status_text, BackendResponse};
use crate::logging::{ErrorFields, LogAdapter, LogEvent, LogRecord};
use crate::observability::metrics;

/// Result of a forward attempt that produced a response.
#[derive(Debug, Clone)]
pub struct Forwarded {
    /// Backend response, or a synthesized one after a transport failure.
    pub response: BackendResponse,
    /// Response body read once as text.
    pub body_text: String,
}

/// Forwards requests to one fixed backend URL.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    backend_url: Url,
    logger: LogAdapter,
}

impl Forwarder {
    pub fn new(backend_url: Url, logger: LogAdapter) -> Self {
        Self::with_client(Client::new(), backend_url, logger)
    }

    pub fn with_client(client: Client, backend_url: Url, logger: LogAdapter) -> Self {
        Self {
            client,
            backend_url,
            logger,
        }
    }

    pub fn backend_url(&self) -> &Url {
        &self.backend_url
    }

    /// Send `request` to the backend once.
    ///
    /// Returns the backend response for 2xx/3xx answers and a synthesized
    /// 503/502 when the backend could not be reached. A backend answer with
    /// any other status is logged as `BACKEND_ERROR` and returned as
    /// [`ForwardError::Backend`].
    pub async fn forward(&self, request: &CapturedRequest) -> Result<Forwarded, ForwardError> {
        let start = Instant::now();
        let backend = self.backend_url.as_str();

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            backend = %backend,
            body_bytes = request.body.len(),
            "Forwarding request"
        );

        let outbound = self
            .client
            .request(request.method.clone(), self.backend_url.clone())
            .headers(forwardable_headers(&request.headers))
            .body(request.body.clone());

        let response = match outbound.send().await {
            Ok(response) => response,
            Err(e) => return Ok(self.transport_failure(request, TransportFailure::classify(backend, e), start)),
        };

        let status = response.status();
        if !is_ok_status(status) {
            tracing::warn!(backend = %backend, status = %status, "Backend returned error status");
            metrics::record_forward("backend_error", start);
            self.logger.emit(&LogRecord::new(LogEvent::BackendError(
                ErrorFields::new(
                    "BACKEND_STATUS_ERROR",
                    format!("Backend returned status {} from {}", status.as_u16(), backend),
                )
                .with_status(status.as_u16(), status_text(status))
                .with_backend(backend)
                .with_request(request.method.as_str(), request.url.as_str()),
            )));
            return Err(ForwardError::Backend {
                url: backend.to_string(),
                status,
            });
        }

        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return Ok(self.transport_failure(request, TransportFailure::classify(backend, e), start)),
        };

        metrics::record_forward("ok", start);
        let body_text = String::from_utf8_lossy(&body).into_owned();
        Ok(Forwarded {
            response: BackendResponse::new(status, headers, body),
            body_text,
        })
    }

    fn transport_failure(
        &self,
        request: &CapturedRequest,
        failure: TransportFailure,
        start: Instant,
    ) -> Forwarded {
        let status = failure.status();
        tracing::error!(
            backend = %self.backend_url,
            error = %failure.source_error(),
            status = %status,
            "Failed to reach backend"
        );
        metrics::record_forward(failure.error_type(), start);

        self.logger.emit(&LogRecord::new(LogEvent::ForwardError(
            ErrorFields::new(failure.error_type(), failure.source_error().to_string())
                .with_backend(self.backend_url.as_str())
                .with_request(request.method.as_str(), request.url.as_str()),
        )));

        let response = BackendResponse::synthesized(status, failure.to_string());
        let body_text = String::from_utf8_lossy(&response.body).into_owned();
        Forwarded { response, body_text }
    }
}
