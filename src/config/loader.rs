//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables consulted for the explicit backend URL, highest
/// priority first.
pub const BACKEND_URL_VARS: [&str; 2] = ["BACKEND_API_URL", "NEXT_PUBLIC_BACKEND_API_URL"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Values given on the command line. They take precedence over the
/// environment and the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub backend_url: Option<String>,
}

/// Load configuration from an optional TOML file, overlay the environment
/// and command-line overrides, and validate the result.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    if let Some(bind_address) = overrides.bind_address {
        config.listener.bind_address = bind_address;
    }
    if let Some(url) = overrides.backend_url {
        config.backend.url = Some(url);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-provided values onto `config`.
///
/// The first non-blank variable of [`BACKEND_URL_VARS`] replaces `backend.url`.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = BACKEND_URL_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty());

    if let Some(url) = explicit {
        tracing::debug!(url = %url, "Backend URL taken from environment");
        config.backend.url = Some(url);
    }
}
