//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatcherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::DispatcherConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("client.api_base '{0}' is not a valid http(s) URL")]
    InvalidApiBase(String),

    #[error("client.proxy.url '{0}' is not a valid URL")]
    InvalidProxy(String),

    #[error("client.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("client.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("retries.max_attempts must be at least 1")]
    NoAttempts,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every error found.
pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let client = &config.client;

    match Url::parse(&client.api_base) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => errors.push(ValidationError::InvalidApiBase(client.api_base.clone())),
    }

    if let Some(proxy) = &client.proxy {
        if Url::parse(&proxy.url).is_err() {
            errors.push(ValidationError::InvalidProxy(proxy.url.clone()));
        }
    }

    if client.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }

    if client.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::NoAttempts);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
