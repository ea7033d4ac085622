//! Logger adapter: renders records and dispatches them to the sinks.
//!
//! `emit` never fails. A record that cannot be rendered as valid JSON is
//! replaced by a minimal fallback record carrying the same id, timestamps
//! and type, so the remote sink still sees one record per event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::logging::console::ConsoleRecord;
use crate::logging::record::{format_instant, serialize_instant, LogRecord};
use crate::logging::sink::LogSink;
use crate::observability::metrics;

/// Message carried by the fallback record.
pub const SERIALIZATION_FAILED: &str = "JSON serialization failed";

/// A record as written to the remote sink: the record plus its emission instant.
#[derive(Serialize)]
struct Emission<'a, T: Serialize> {
    #[serde(flatten)]
    record: &'a T,
    #[serde(serialize_with = "serialize_instant")]
    created_at: DateTime<Utc>,
}

/// Dispatches [`LogRecord`]s to a remote sink and an optional console sink.
#[derive(Clone)]
pub struct LogAdapter {
    remote: Arc<dyn LogSink>,
    console: Option<Arc<dyn LogSink>>,
}

impl LogAdapter {
    pub fn new(remote: Arc<dyn LogSink>, console: Option<Arc<dyn LogSink>>) -> Self {
        Self { remote, console }
    }

    /// Emit one record to every sink, substituting the fallback record when
    /// it cannot be rendered.
    pub fn emit(&self, record: &LogRecord) {
        self.emit_with(record, record);
    }

    /// Emit one record to every sink, or report why it could not be rendered.
    ///
    /// Nothing is written on failure; the caller decides what to log instead.
    pub fn try_emit(&self, record: &LogRecord) -> Result<(), serde_json::Error> {
        self.try_emit_with(record, record)
    }

    /// Render `payload` for the remote sink, using `record` for the fallback
    /// fields and the console view.
    fn emit_with<T: Serialize>(&self, payload: &T, record: &LogRecord) {
        if let Err(e) = self.try_emit_with(payload, record) {
            tracing::warn!(
                log_id = %record.log_id,
                log_type = %record.log_type(),
                error = %e,
                "Log record failed serialization, emitting fallback"
            );
            metrics::record_log_fallback();
            self.write_remote(&fallback(record), record);
        }
    }

    fn try_emit_with<T: Serialize>(
        &self,
        payload: &T,
        record: &LogRecord,
    ) -> Result<(), serde_json::Error> {
        metrics::record_log_record(record.log_type().as_str());

        let line = render(payload)?;
        self.write_remote(&line, record);
        self.write_console(record);
        Ok(())
    }

    fn write_remote(&self, line: &str, record: &LogRecord) {
        if let Err(e) = self.remote.write(line) {
            tracing::warn!(
                sink = self.remote.name(),
                log_id = %record.log_id,
                error = %e,
                "Failed to dispatch log record"
            );
        }
    }

    fn write_console(&self, record: &LogRecord) {
        let Some(console) = &self.console else {
            return;
        };

        let result = serde_json::to_string_pretty(&ConsoleRecord::from_record(record))
            .map_err(|e| e.to_string())
            .and_then(|line| console.write(&line).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::debug!(sink = console.name(), log_id = %record.log_id, error = %e, "Console log write failed");
        }
    }
}

/// Serialize and then re-parse, so only well-formed JSON leaves the adapter.
fn render<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    let line = serde_json::to_string_pretty(&Emission {
        record: payload,
        created_at: Utc::now(),
    })?;
    serde_json::from_str::<serde_json::Value>(&line)?;
    Ok(line)
}

fn fallback(record: &LogRecord) -> String {
    let value = json!({
        "log_id": record.log_id,
        "timestamp": format_instant(&record.timestamp),
        "log_type": record.log_type().as_str(),
        "created_at": format_instant(&Utc::now()),
        "partition_date": record.partition_date.to_string(),
        "error_message": SERIALIZATION_FAILED,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
