//! Edge forwarding shim library.

pub mod config;
pub mod forwarder;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod observability;

pub use config::ForwarderConfig;
pub use forwarder::Forwarder;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logging::LogAdapter;
