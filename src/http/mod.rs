//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → handler.rs (method check, orchestration)
//!     → request.rs (buffer body once, reconstruct URL)
//!     → [forwarder relays to the backend]
//!     → response.rs (replay backend response or synthesized error)
//!     → Send to client (+ x-serviceVersion)
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::HandlerError;
pub use request::CapturedRequest;
pub use response::{BackendResponse, SERVICE_VERSION_HEADER};
pub use server::{AppState, HttpServer, ServerError};
