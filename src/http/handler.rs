//! Per-request orchestration.
//!
//! ```text
//! MethodCheck ──non-POST──▶ 405 (no records)
//!     │
//! BodyCapture ──error──────────────────────────┐
//!     │                                         │
//! LogRequest (REQUEST)                          │
//!     │                                         ▼
//! Forward ──Err(ForwardError)──────────▶ HandlerError: REQUEST_ERROR, 500
//!     │
//! LogResponse (RESPONSE | RESPONSE_ERROR | RESPONSE_LOG_ERROR)
//!     │
//! Respond (backend or synthesized response)
//! ```

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::forwarder::{ForwardError, Forwarded};
use crate::http::request::{CaptureError, CapturedRequest};
use crate::http::response::is_ok_status;
use crate::http::server::AppState;
use crate::logging::{ErrorFields, LogEvent, LogRecord};
use crate::observability::metrics;

/// Failures that end a request with a generic 500.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to read request body: {0}")]
    Body(#[source] CaptureError),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

/// Entry point for every inbound request.
pub async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    if method != Method::POST {
        tracing::debug!(method = %method, "Rejecting non-POST request");
        metrics::record_request(
            method.as_str(),
            StatusCode::METHOD_NOT_ALLOWED.as_u16(),
            "method_not_allowed",
            start,
        );
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    let (response, outcome) = match CapturedRequest::capture(request, state.max_body_size).await {
        Ok(captured) => match process(&state, &captured).await {
            // Transport failures come back as synthesized 502/503 responses.
            Ok(response) if is_ok_status(response.status()) => (response, "ok"),
            Ok(response) => (response, "forward_error"),
            Err(e) => (
                processing_error(&state, &method, &captured.url, e),
                "processing_error",
            ),
        },
        Err(e) => {
            let url = e.url.clone();
            (
                processing_error(&state, &method, &url, HandlerError::Body(e)),
                "processing_error",
            )
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start);
    response
}

async fn process(state: &AppState, captured: &CapturedRequest) -> Result<Response, HandlerError> {
    log_request(state, captured);

    let forwarded = state.forwarder.forward(captured).await?;

    log_response(state, captured, &forwarded);

    Ok(forwarded.response.into_response())
}

fn processing_error(state: &AppState, method: &Method, url: &str, e: HandlerError) -> Response {
    tracing::error!(url = %url, error = %e, "Request processing failed");
    state.logger.emit(&LogRecord::new(LogEvent::RequestError(
        ErrorFields::new("PROCESSING_ERROR", e.to_string())
            .with_backend(state.forwarder.backend_url().as_str())
            .with_request(method.as_str(), url),
    )));

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error processing request: {}", e),
    )
        .into_response()
}

fn log_request(state: &AppState, captured: &CapturedRequest) {
    let backend = state.forwarder.backend_url().as_str();
    state.logger.emit(&LogRecord::request(captured, backend));
}

/// Never affects the client response.
fn log_response(state: &AppState, captured: &CapturedRequest, forwarded: &Forwarded) {
    let backend = state.forwarder.backend_url().as_str();
    let response = &forwarded.response;

    if !response.is_ok() {
        state.logger.emit(&LogRecord::new(LogEvent::ResponseError(
            ErrorFields::new("RESPONSE_ERROR", "Invalid response from backend")
                .with_status(response.status.as_u16(), response.status_text.as_str())
                .with_backend(backend)
                .with_request(captured.method.as_str(), captured.url.as_str()),
        )));
        return;
    }

    let record = LogRecord::response(response, &forwarded.body_text, backend);
    if let Err(e) = state.logger.try_emit(&record) {
        tracing::warn!(log_id = %record.log_id, error = %e, "Could not render response record");
        state.logger.emit(&LogRecord::new(LogEvent::ResponseLogError(
            ErrorFields::new("RESPONSE_LOG_ERROR", e.to_string())
                .with_status(response.status.as_u16(), response.status_text.as_str())
                .with_backend(backend),
        )));
    }
}
