//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the endpoint URL
//! - Validate value ranges (timeouts > 0, attempts >= 1, ratios within 0..=1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before a client is built from the config

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.endpoint) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::new(
                    "endpoint",
                    format!("scheme must be http or https, got '{}'", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("endpoint", "missing host"));
            }
        }
        Err(e) => errors.push(ValidationError::new(
            "endpoint",
            format!("'{}' is not a valid URL: {}", config.endpoint, e),
        )),
    }

    if config.timeouts.connect_ms == Some(0) {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be greater than 0"));
    }
    if config.timeouts.read_ms == Some(0) {
        errors.push(ValidationError::new("timeouts.read_ms", "must be greater than 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    if !(0.0..=1.0).contains(&retries.budget_ratio) {
        errors.push(ValidationError::new("retries.budget_ratio", "must be within 0.0..=1.0"));
    }

    if config.circuit_breaker.enabled && config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_threshold",
            "must be at least 1 when the breaker is enabled",
        ));
    }

    if config.worker_pool.max_threads == 0 {
        errors.push(ValidationError::new("worker_pool.max_threads", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
