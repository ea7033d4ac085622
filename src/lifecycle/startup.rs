//! Startup orchestration.
//!
//! # Responsibilities
//! - Build log sinks from the validated configuration
//! - Start the metrics exporter when enabled
//! - Bind the listener last, so traffic only arrives when ready
//! - After the server stops, let the remote log sink drain its queue

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ForwarderConfig;
use crate::http::{HttpServer, ServerError};
use crate::logging::{self, remote, SinkSetupError};
use crate::observability::metrics;

/// Upper bound on waiting for queued log records at shutdown.
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    LogSink(#[from] SinkSetupError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Start every subsystem and serve until `shutdown` fires.
pub async fn run(
    config: ForwarderConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    let (logger, sink_task) = logging::build_adapter(&config.logging)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server = HttpServer::new(config, logger)?;
    let served = server.run(listener, shutdown).await.map_err(StartupError::Serve);

    // The router, and with it every sender feeding the sink, is gone by now.
    if let Some(task) = sink_task {
        remote::drain(task, LOG_DRAIN_TIMEOUT).await;
    }

    served
}
