//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, percentages in range, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check every semantic constraint on `config`.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::new("upstream.host", "must not be empty"));
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::new("upstream.port", "must be > 0"));
    }
    if !config.upstream.path.starts_with('/') {
        errors.push(ValidationError::new("upstream.path", "must start with '/'"));
    }
    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::new("upstream.timeout_ms", "must be > 0"));
    }

    let breaker = &config.breaker;
    if breaker.timeout_ms == 0 {
        errors.push(ValidationError::new("breaker.timeout_ms", "must be > 0"));
    }
    if !(1..=100).contains(&breaker.error_threshold_percent) {
        errors.push(ValidationError::new(
            "breaker.error_threshold_percent",
            format!("{} is outside 1..=100", breaker.error_threshold_percent),
        ));
    }
    if breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError::new("breaker.reset_timeout_ms", "must be > 0"));
    }
    if breaker.minimum_calls == 0 {
        errors.push(ValidationError::new("breaker.minimum_calls", "must be > 0"));
    }
    if breaker.window_size < breaker.minimum_calls {
        errors.push(ValidationError::new(
            "breaker.window_size",
            format!(
                "{} is smaller than breaker.minimum_calls ({})",
                breaker.window_size, breaker.minimum_calls
            ),
        ));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be > 0"));
    }
    // 2^31 * base would overflow any sane delay; keep the exponent bounded.
    if config.retry.max_attempts > 32 {
        errors.push(ValidationError::new("retry.max_attempts", "must be <= 32"));
    }

    if config.batch.max_count == 0 {
        errors.push(ValidationError::new("batch.max_count", "must be > 0"));
    }
    if config.batch.default_count == 0 || config.batch.default_count > config.batch.max_count {
        errors.push(ValidationError::new(
            "batch.default_count",
            format!("{} is outside 1..={}", config.batch.default_count, config.batch.max_count),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
