//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs before anything binds or connects
//! - Validate value ranges (sizes and queue lengths > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ForwarderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ForwarderConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("observability.log_format: '{0}' is not one of pretty, json")]
    UnknownLogFormat(String),
}

/// Validate `config`, collecting every problem found.
pub fn validate_config(config: &ForwarderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_url(&mut errors, "backend.url", &config.backend.url);

    if let Some(remote) = &config.logging.remote_url {
        check_url(&mut errors, "logging.remote_url", remote);
    }
    if config.logging.remote_queue == 0 {
        errors.push(ValidationError::Zero { field: "logging.remote_queue" });
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "security.max_body_size" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
