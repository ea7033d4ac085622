//! Backend forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! CapturedRequest (body already buffered by the handler)
//!     → backend.rs (build outbound request, send once)
//!         ok status        → Forwarded { response, body_text }
//!         non-ok status    → BACKEND_ERROR record, Err(ForwardError::Backend)
//!         transport error  → FORWARD_ERROR record, synthesized 503 / 502
//!     → error.rs (classification of transport failures)
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per request; no retries
//! - No explicit timeouts beyond the HTTP client's defaults
//! - The two failure tiers stay distinct: a bad answer propagates as an
//!   error, an unreachable backend becomes a response

pub mod backend;
pub mod error;

pub use backend::{Forwarded, Forwarder};
pub use error::{ForwardError, TransportFailure};
