//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port > 0, intervals > 0)
//! - Check every backend is a usable origin URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::BalancerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener port must be non-zero")]
    InvalidPort,
    #[error("at least one backend address is required")]
    NoBackends,
    #[error("invalid backend address {address:?}: {reason}")]
    InvalidBackend { address: String, reason: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Parse a backend origin, requiring an http scheme, a host and a resolvable port.
/// Upstream TLS is not supported.
pub fn parse_backend_url(address: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidBackend {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(address).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" => {}
        other => return Err(invalid(&format!("unsupported scheme {other:?}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.port_or_known_default().is_none() {
        return Err(invalid("missing port"));
    }
    Ok(url)
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for address in &config.backends {
        if let Err(e) = parse_backend_url(address) {
            errors.push(e);
        }
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::Zero { field: "health_check.interval_secs" });
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::Zero { field: "health_check.timeout_secs" });
        }
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero { field: "retries.max_attempts" });
    }
    if config.timeouts.forward_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.forward_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
