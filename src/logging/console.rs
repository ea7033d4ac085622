//! Local console sink and the human-readable record shape it receives.
//!
//! The console record is meant for tailing a single node. It is shaped
//! differently from the remote record and is not consumed downstream.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use serde::Serialize;
use serde_json::Value;

use crate::logging::record::{format_instant, LogEvent, LogRecord};
use crate::logging::sink::{LogSink, SinkError};

/// Console view of a [`LogRecord`].
#[derive(Debug, Serialize)]
pub struct ConsoleRecord<'a> {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub detail: ConsoleDetail<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ConsoleDetail<'a> {
    Request {
        method: &'a str,
        url: &'a str,
        headers: &'a BTreeMap<String, String>,
        body: &'a Value,
    },
    Response {
        status: u16,
        #[serde(rename = "statusText")]
        status_text: &'a str,
        headers: &'a BTreeMap<String, String>,
        body: &'a Value,
    },
    Error {
        error: &'a str,
        #[serde(rename = "errorType")]
        error_type: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}

impl<'a> ConsoleRecord<'a> {
    pub fn from_record(record: &'a LogRecord) -> Self {
        let detail = match &record.event {
            LogEvent::Request(f) => ConsoleDetail::Request {
                method: &f.request_method,
                url: &f.request_url,
                headers: &f.request_headers,
                body: &f.request_body,
            },
            LogEvent::Response(f) => ConsoleDetail::Response {
                status: f.response_status,
                status_text: &f.response_status_text,
                headers: &f.response_headers,
                body: &f.response_body,
            },
            LogEvent::BackendError(f)
            | LogEvent::ForwardError(f)
            | LogEvent::ResponseError(f)
            | LogEvent::ResponseLogError(f)
            | LogEvent::RequestError(f) => ConsoleDetail::Error {
                error: &f.error_message,
                error_type: &f.error_type,
                status: f.response_status,
            },
        };

        Self {
            timestamp: format_instant(&record.timestamp),
            kind: record.log_type().as_str(),
            detail,
        }
    }
}

/// Records buffered ahead of the console writer thread.
const CONSOLE_QUEUE: usize = 1024;

/// Writes one JSON document per record to a console-style stream.
///
/// Lines are handed to a dedicated writer thread over a bounded queue, so a
/// slow terminal never stalls request handling. A full queue drops the line.
pub struct ConsoleSink {
    sender: SyncSender<String>,
}

impl ConsoleSink {
    /// Console sink on standard output.
    pub fn stdout() -> io::Result<Self> {
        let (sink, _writer) = Self::spawn(io::stdout(), CONSOLE_QUEUE)?;
        Ok(sink)
    }

    /// Start a writer thread draining into `writer`.
    ///
    /// The thread exits once every sender is dropped and the queue is empty.
    pub fn spawn(
        mut writer: impl Write + Send + 'static,
        queue: usize,
    ) -> io::Result<(Self, JoinHandle<()>)> {
        let (sender, receiver) = mpsc::sync_channel::<String>(queue.max(1));

        let handle = thread::Builder::new()
            .name("console-log".to_string())
            .spawn(move || {
                for line in receiver {
                    if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                        tracing::debug!(error = %e, "Console log write failed");
                    }
                }
            })?;

        Ok((Self { sender }, handle))
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, line: &str) -> Result<(), SinkError> {
        self.sender.try_send(line.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::QueueFull,
            TrySendError::Disconnected(_) => SinkError::Closed,
        })
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
