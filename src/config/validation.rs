//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required store settings are present
//! - Validate value ranges (timeouts > 0, redirect codes, bind address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Redirect statuses accepted for `redirects.*`.
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("{field} = {status} is not a redirect status")]
    RedirectStatus { field: &'static str, status: u16 },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let store = &config.store;
    for (field, value) in [
        ("store.bucket", &store.bucket),
        ("store.endpoint", &store.endpoint),
        ("store.access_key", &store.access_key),
        ("store.secret_key", &store.secret_key),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Missing(field));
        }
    }

    for (field, status) in [
        ("redirects.hit_status", config.redirects.hit_status),
        ("redirects.stored_status", config.redirects.stored_status),
    ] {
        if !REDIRECT_STATUSES.contains(&status) {
            errors.push(ValidationError::RedirectStatus { field, status });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
