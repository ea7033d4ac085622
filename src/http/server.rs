//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler on every path
//! - Wire up middleware (tracing, request ID, service version header)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use axum::{routing::any, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ForwarderConfig;
use crate::forwarder::Forwarder;
use crate::http::handler::forward_handler;
use crate::http::response::{version_header_value, SERVICE_VERSION_HEADER};
use crate::logging::LogAdapter;

/// Errors building the server from a configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid backend URL: {0}")]
    BackendUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub logger: LogAdapter,
    pub max_body_size: usize,
}

/// HTTP server for the forwarder.
pub struct HttpServer {
    router: Router,
    config: ForwarderConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and log adapter.
    pub fn new(config: ForwarderConfig, logger: LogAdapter) -> Result<Self, ServerError> {
        let backend_url = config.backend.url.parse()?;

        let mut client = reqwest::Client::builder();
        if !config.backend.use_system_proxy {
            client = client.no_proxy();
        }
        let forwarder = Arc::new(Forwarder::with_client(
            client.build()?,
            backend_url,
            logger.clone(),
        ));

        let state = AppState {
            forwarder,
            logger,
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ForwarderConfig, state: AppState) -> Router {
        let version = version_header_value(config.service.resolved_version());

        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::overriding(SERVICE_VERSION_HEADER, version)),
            )
    }

    /// The fully layered router, e.g. for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.url,
            version = %self.config.service.resolved_version(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
