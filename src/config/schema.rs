//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the forwarder.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Version reported when none is configured.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Root configuration for the forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single backend every request is relayed to.
    pub backend: BackendConfig,

    /// Service identity reported to callers.
    pub service: ServiceConfig,

    /// Log record sinks.
    pub logging: LoggingConfig,

    /// Diagnostics and metrics settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Absolute URL requests are forwarded to (e.g., "https://api.internal/ingest").
    pub url: String,

    /// Route backend traffic through the proxies named in `HTTP_PROXY` and friends.
    pub use_system_proxy: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8081/".to_string(),
            use_system_proxy: false,
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Version string sent in `x-serviceVersion`.
    pub version: Option<String>,
}

impl ServiceConfig {
    /// Configured version, or `"unknown"` when unset or blank.
    pub fn resolved_version(&self) -> &str {
        self.version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_VERSION)
    }
}

/// Log record sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Endpoint receiving one JSON record per POST. Records are discarded when unset.
    pub remote_url: Option<String>,

    /// Records buffered for the remote sink before new ones are dropped.
    pub remote_queue: usize,

    /// Also write human-readable records to stdout.
    pub console_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_queue: 1024,
            console_enabled: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostic output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ForwarderConfig = toml::from_str(
            r#"
            [backend]
            url = "https://api.example.com/events"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.url, "https://api.example.com/events");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.logging.remote_queue, 1024);
        assert!(config.logging.remote_url.is_none());
        assert_eq!(config.security.max_body_size, 2 * 1024 * 1024);
    }

    #[test]
    fn test_version_fallback() {
        let mut service = ServiceConfig::default();
        assert_eq!(service.resolved_version(), "unknown");

        service.version = Some("  ".into());
        assert_eq!(service.resolved_version(), "unknown");

        service.version = Some("42".into());
        assert_eq!(service.resolved_version(), "42");
    }
}
