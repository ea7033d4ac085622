//! Edge forwarding shim.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                EDGE FORWARDER                │
//!                      │                                              │
//!   POST /anything     │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ handler  │──▶│ forwarder │──┼──▶ Backend
//!                      │  │ server  │   │          │   │           │  │
//!   response           │  └─────────┘   └────┬─────┘   └─────┬─────┘  │
//!   + x-serviceVersion │                     │               │        │
//!   ◀──────────────────┼─────────────────────┤               │        │
//!                      │                     ▼               ▼        │
//!                      │                ┌──────────────────────────┐  │
//!                      │                │  logging (LogAdapter)    │──┼──▶ Remote log sink
//!                      │                │  REQUEST / RESPONSE /    │──┼──▶ stdout
//!                      │                │  *_ERROR records         │  │
//!                      │                └──────────────────────────┘  │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_forwarder::config::{load_config, validation::validate_config, ConfigError};
use edge_forwarder::lifecycle::{signals, startup, Shutdown};
use edge_forwarder::observability::logging::init_tracing;

#[derive(Parser)]
#[command(name = "edge-forwarder")]
#[command(about = "Relays POST requests to a single backend and logs every exchange", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_tracing(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        backend = %config.backend.url,
        remote_logging = config.logging.remote_url.is_some(),
        "edge-forwarder starting"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    startup::run(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
