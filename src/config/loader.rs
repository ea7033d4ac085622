//! Configuration loading from disk and the environment.

use std::path::Path;
use std::fs;
use crate::config::schema::ForwarderConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `backend.url`.
pub const BACKEND_URL_ENV: &str = "EDGE_BACKEND_URL";

/// Overrides `service.version`.
pub const SERVICE_VERSION_ENV: &str = "EDGE_SERVICE_VERSION";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
///
/// Without a path the built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<ForwarderConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path).map_err(ConfigError::Io)?)?,
        None => ForwarderConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<ForwarderConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Apply overrides looked up through `lookup`. Empty values are ignored.
pub fn apply_overrides<F>(config: &mut ForwarderConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(BACKEND_URL_ENV) {
        config.backend.url = url;
    }
    if let Some(version) = lookup(SERVICE_VERSION_ENV) {
        config.service.version = Some(version);
    }
}
