//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check backend URLs are absolute `http` URLs
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid backend URL '{value}': {reason}")]
    InvalidBackendUrl { value: String, reason: String },
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
    #[error("streaming path '{0}' must start with '/'")]
    InvalidStreamPath(String),
    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
            reason: e.to_string(),
        });
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::InvalidAddress {
                field: "observability.metrics_address",
                value: config.observability.metrics_address.clone(),
                reason: e.to_string(),
            });
        }
    }

    // Blank entries are dropped by the resolver, so only check the rest.
    let urls = config
        .backend
        .url
        .iter()
        .chain(config.backend.fallback_urls.iter())
        .filter(|u| !u.trim().is_empty());
    for raw in urls {
        if let Err(reason) = check_backend_url(raw.trim()) {
            errors.push(ValidationError::InvalidBackendUrl {
                value: raw.clone(),
                reason,
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for path in &config.streaming.paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidStreamPath(path.clone()));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("base URL must not carry a query or fragment".to_string());
    }
    Ok(())
}
