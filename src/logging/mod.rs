//! Structured request/response logging.
//!
//! # Data Flow
//! ```text
//! handler / forwarder
//!     → record.rs (LogRecord: REQUEST, RESPONSE, *_ERROR)
//!     → adapter.rs (render, self-validate, fallback on failure)
//!         → remote.rs (bounded queue → background HTTP POST)
//!         → console.rs (human-readable JSON on stdout)
//! ```
//!
//! # Design Decisions
//! - One record type and one `emit` for every call site
//! - Emission never fails and never blocks on the network
//! - Sinks are chosen once at startup from `LoggingConfig`

pub mod adapter;
pub mod console;
pub mod id;
pub mod record;
pub mod remote;
pub mod sink;

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::schema::LoggingConfig;

pub use adapter::LogAdapter;
pub use record::{ErrorFields, LogEvent, LogRecord, LogType};
pub use sink::{LogSink, MemorySink, NoopSink, SinkError};

/// Failures while setting up log sinks.
#[derive(Debug, Error)]
pub enum SinkSetupError {
    #[error("invalid remote log URL: {0}")]
    RemoteUrl(#[from] url::ParseError),

    #[error("failed to start console writer: {0}")]
    Console(#[source] std::io::Error),
}

/// Build the adapter described by `config`.
///
/// Must be called inside a Tokio runtime when a remote URL is configured,
/// since the remote sink spawns its delivery task. The returned handle is
/// `None` when no remote sink was started.
pub fn build_adapter(
    config: &LoggingConfig,
) -> Result<(LogAdapter, Option<JoinHandle<()>>), SinkSetupError> {
    let (remote, handle): (Arc<dyn LogSink>, _) = match &config.remote_url {
        Some(raw) => {
            let endpoint = raw.parse()?;
            let (sink, handle) =
                remote::RemoteSink::spawn(endpoint, config.remote_queue, reqwest::Client::new());
            tracing::info!(endpoint = %raw, queue = config.remote_queue, "Remote log sink enabled");
            (Arc::new(sink), Some(handle))
        }
        None => {
            tracing::info!("No remote log endpoint configured, remote records are discarded");
            (Arc::new(NoopSink), None)
        }
    };

    let console: Option<Arc<dyn LogSink>> = if config.console_enabled {
        let sink = console::ConsoleSink::stdout().map_err(SinkSetupError::Console)?;
        Some(Arc::new(sink))
    } else {
        None
    };

    Ok((LogAdapter::new(remote, console), handle))
}
