//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::TransportTimeouts;

/// Root configuration for a GraphQL client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base endpoint URL; operations are posted to `{endpoint}/graphql`.
    pub endpoint: String,

    /// Dispatch mode the client is built for.
    pub mode: ModeKind,

    /// Transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Retry configuration for the default resiliency policy.
    pub retries: RetryConfig,

    /// Circuit breaker configuration for the default resiliency policy.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Default worker pool used by async clients without a custom executor.
    pub worker_pool: WorkerPoolConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            mode: ModeKind::default(),
            timeouts: TimeoutConfig::default(),
            retries: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given endpoint and mode with defaults elsewhere.
    pub fn new(endpoint: impl Into<String>, mode: ModeKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            mode,
            ..Self::default()
        }
    }
}

/// How calls are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    /// Calls block the caller's thread.
    #[default]
    Sync,
    /// Calls return a deferred result immediately.
    Async,
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeKind::Sync => write!(f, "sync"),
            ModeKind::Async => write!(f, "async"),
        }
    }
}

/// Transport timeout configuration. `None` disables the limit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: Option<u64>,

    /// Maximum silence while waiting for response bytes, in milliseconds.
    pub read_ms: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: Some(10_000),
            read_ms: Some(60_000),
        }
    }
}

impl TimeoutConfig {
    /// Convert to the durations handed to transports.
    pub fn transport_timeouts(&self) -> TransportTimeouts {
        TransportTimeouts {
            connect: self.connect_ms.map(Duration::from_millis),
            read: self.read_ms.map(Duration::from_millis),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Fraction of calls that may be retried within a budget window.
    /// e.g., 0.1 for 10% budget.
    pub budget_ratio: f32,

    /// Retries always allowed per budget window regardless of traffic.
    pub budget_min_retries: u32,

    /// Also retry mutations after the request may have reached the server.
    pub retry_mutations: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            budget_ratio: 0.1,
            budget_min_retries: 10,
            retry_mutations: false,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the breaker.
    pub enabled: bool,

    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Time the circuit stays open before a probe is allowed, in milliseconds.
    pub recovery_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: 5,
            recovery_ms: 30_000,
        }
    }
}

/// Default worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Upper bound on threads running calls concurrently.
    pub max_threads: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self { max_threads: 8 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.mode, ModeKind::Sync);
        assert_eq!(config.timeouts.read_ms, Some(60_000));
        assert_eq!(config.retries.max_attempts, 3);
        assert!(!config.circuit_breaker.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            endpoint = "http://api.internal:9000/read"
            mode = "async"

            [timeouts]
            read_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://api.internal:9000/read");
        assert_eq!(config.mode, ModeKind::Async);
        assert_eq!(config.timeouts.read_ms, Some(250));
        assert_eq!(config.timeouts.connect_ms, Some(10_000));
        assert_eq!(config.worker_pool.max_threads, 8);
    }

    #[test]
    fn test_transport_timeouts_conversion() {
        let timeouts = TimeoutConfig {
            connect_ms: None,
            read_ms: Some(15),
        }
        .transport_timeouts();
        assert_eq!(timeouts.connect, None);
        assert_eq!(timeouts.read, Some(Duration::from_millis(15)));
    }
}
