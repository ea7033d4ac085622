//! Structured log records.
//!
//! A [`LogRecord`] describes exactly one observed event: the inbound
//! request, the backend response, or one of the error outcomes. Records are
//! built once, emitted once and never read back.

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::http::request::CapturedRequest;
use crate::http::response::BackendResponse;
use crate::logging::id;

/// Discriminant of a [`LogRecord`], as it appears in `log_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Request,
    Response,
    BackendError,
    ForwardError,
    ResponseError,
    ResponseLogError,
    RequestError,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Request => "REQUEST",
            LogType::Response => "RESPONSE",
            LogType::BackendError => "BACKEND_ERROR",
            LogType::ForwardError => "FORWARD_ERROR",
            LogType::ResponseError => "RESPONSE_ERROR",
            LogType::ResponseLogError => "RESPONSE_LOG_ERROR",
            LogType::RequestError => "REQUEST_ERROR",
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub log_id: String,
    #[serde(serialize_with = "serialize_instant")]
    pub timestamp: DateTime<Utc>,
    pub partition_date: NaiveDate,
    #[serde(flatten)]
    pub event: LogEvent,
}

/// Variant-specific payload, tagged by `log_type` when serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "log_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogEvent {
    Request(RequestFields),
    Response(ResponseFields),
    BackendError(ErrorFields),
    ForwardError(ErrorFields),
    ResponseError(ErrorFields),
    ResponseLogError(ErrorFields),
    RequestError(ErrorFields),
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestFields {
    pub request_method: String,
    pub request_url: String,
    pub backend_url: String,
    pub request_headers: BTreeMap<String, String>,
    pub request_body: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFields {
    pub backend_url: String,
    pub response_status: u16,
    pub response_status_text: String,
    pub response_headers: BTreeMap<String, String>,
    pub response_body: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorFields {
    pub error_message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
}

impl ErrorFields {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            error_type: error_type.into(),
            response_status: None,
            response_status_text: None,
            backend_url: None,
            request_method: None,
            request_url: None,
        }
    }

    pub fn with_status(mut self, status: u16, status_text: impl Into<String>) -> Self {
        self.response_status = Some(status);
        self.response_status_text = Some(status_text.into());
        self
    }

    pub fn with_backend(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = Some(backend_url.into());
        self
    }

    pub fn with_request(mut self, method: impl Into<String>, url: impl Into<String>) -> Self {
        self.request_method = Some(method.into());
        self.request_url = Some(url.into());
        self
    }
}

impl LogEvent {
    pub fn log_type(&self) -> LogType {
        match self {
            LogEvent::Request(_) => LogType::Request,
            LogEvent::Response(_) => LogType::Response,
            LogEvent::BackendError(_) => LogType::BackendError,
            LogEvent::ForwardError(_) => LogType::ForwardError,
            LogEvent::ResponseError(_) => LogType::ResponseError,
            LogEvent::ResponseLogError(_) => LogType::ResponseLogError,
            LogEvent::RequestError(_) => LogType::RequestError,
        }
    }
}

impl LogRecord {
    /// Wrap `event` with a fresh id and the current instant.
    pub fn new(event: LogEvent) -> Self {
        Self::at(Utc::now(), event)
    }

    pub fn at(timestamp: DateTime<Utc>, event: LogEvent) -> Self {
        Self {
            log_id: id::generate_at(timestamp),
            timestamp,
            partition_date: timestamp.date_naive(),
            event,
        }
    }

    /// REQUEST record for a captured inbound request.
    pub fn request(request: &CapturedRequest, backend_url: &str) -> Self {
        Self::new(LogEvent::Request(RequestFields {
            request_method: request.method.to_string(),
            request_url: request.url.clone(),
            backend_url: backend_url.to_string(),
            request_headers: header_map(&request.headers),
            request_body: parse_or_raw(&request.body_text()),
        }))
    }

    /// RESPONSE record for a backend response whose body was read as `body_text`.
    pub fn response(response: &BackendResponse, body_text: &str, backend_url: &str) -> Self {
        Self::new(LogEvent::Response(ResponseFields {
            backend_url: backend_url.to_string(),
            response_status: response.status.as_u16(),
            response_status_text: response.status_text.clone(),
            response_headers: header_map(&response.headers),
            response_body: parse_or_raw(body_text),
        }))
    }

    pub fn log_type(&self) -> LogType {
        self.event.log_type()
    }
}

/// Flatten a header map into `name -> value`, joining repeated headers with `, `.
///
/// Values are decoded as UTF-8, with invalid sequences replaced.
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    map
}

/// Parse `text` as JSON, falling back to the raw string.
pub fn parse_or_raw(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-06-10T14:07:14.567Z`.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn serialize_instant<S: Serializer>(
    instant: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_instant(instant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Method};
    use chrono::TimeZone;

    fn captured(body: &'static str) -> CapturedRequest {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        CapturedRequest {
            method: Method::POST,
            url: "http://edge.example.com/ingest".to_string(),
            headers,
            body: body.into(),
        }
    }

    #[test]
    fn test_request_record_shape() {
        let record = LogRecord::request(&captured(r#"{"a":1}"#), "http://backend/");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["log_type"], "REQUEST");
        assert_eq!(json["request_method"], "POST");
        assert_eq!(json["request_url"], "http://edge.example.com/ingest");
        assert_eq!(json["backend_url"], "http://backend/");
        assert_eq!(json["request_body"]["a"], 1);
        assert_eq!(json["request_headers"]["accept"], "text/plain, application/json");
        assert!(id::is_well_formed(json["log_id"].as_str().unwrap()));
    }

    #[test]
    fn test_non_json_body_is_kept_raw() {
        let record = LogRecord::request(&captured("hello"), "http://backend/");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["request_body"], Value::String("hello".into()));
    }

    #[test]
    fn test_timestamp_and_partition_date() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 58).unwrap();
        let record = LogRecord::at(
            instant,
            LogEvent::RequestError(ErrorFields::new("PROCESSING_ERROR", "boom")),
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["timestamp"], "2024-06-10T23:59:58.000Z");
        assert_eq!(json["partition_date"], "2024-06-10");
        assert_eq!(json["log_type"], "REQUEST_ERROR");
        assert_eq!(json["error_type"], "PROCESSING_ERROR");
        assert!(json.get("response_status").is_none());
    }

    #[test]
    fn test_error_fields_builder() {
        let fields = ErrorFields::new("BACKEND_STATUS_ERROR", "bad")
            .with_status(500, "Internal Server Error")
            .with_backend("http://backend/")
            .with_request("POST", "http://edge/");
        let json = serde_json::to_value(&LogRecord::new(LogEvent::BackendError(fields))).unwrap();

        assert_eq!(json["log_type"], "BACKEND_ERROR");
        assert_eq!(json["response_status"], 500);
        assert_eq!(json["response_status_text"], "Internal Server Error");
        assert_eq!(json["backend_url"], "http://backend/");
        assert_eq!(json["request_method"], "POST");
    }

    #[test]
    fn test_non_ascii_header_values_are_kept() {
        let mut headers = HeaderMap::new();
        headers.insert("x-name", HeaderValue::from_bytes("José".as_bytes()).unwrap());
        headers.insert("x-blob", HeaderValue::from_bytes(&[b'a', 0xfa, 0xfb]).unwrap());

        let map = header_map(&headers);
        assert_eq!(map["x-name"], "José");
        assert_eq!(map["x-blob"], "a\u{fffd}\u{fffd}");
    }

    #[test]
    fn test_log_type_names_match_serde() {
        for ty in [
            LogType::Request,
            LogType::Response,
            LogType::BackendError,
            LogType::ForwardError,
            LogType::ResponseError,
            LogType::ResponseLogError,
            LogType::RequestError,
        ] {
            assert_eq!(serde_json::to_value(ty).unwrap(), ty.as_str());
        }
    }
}
