//! Log sinks.
//!
//! A sink receives fully rendered records, one JSON document per call.
//! Writes must not block the request path: slow destinations queue the
//! line and deliver it from a background task.

use std::sync::Mutex;

use thiserror::Error;

/// Errors a sink can report. The adapter logs and drops them.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink queue is full")]
    QueueFull,

    #[error("sink is closed")]
    Closed,

    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for rendered log records.
pub trait LogSink: Send + Sync {
    /// Hand one rendered record to the sink.
    fn write(&self, line: &str) -> Result<(), SinkError>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// A sink that drops everything. Used when no remote endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write(&self, _line: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// A sink that keeps every line in memory, in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Lines written so far, parsed back into JSON. Unparseable lines are skipped.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// `log_type` of every record written so far.
    pub fn log_types(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|r| r.get("log_type").and_then(|t| t.as_str()).map(str::to_string))
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write(&self, line: &str) -> Result<(), SinkError> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
