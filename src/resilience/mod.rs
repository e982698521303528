//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Client construction:
//!     Resiliency::build(base)  (called exactly once)
//!     → base builder carrying the policy's layers
//!     → capabilities enrich it
//!     → Invoker used for every call
//!
//! Default policy, per call:
//!     → retries.rs (check if retryable, retry with backoff)
//!     → circuit_breaker.rs (fail fast, track failures)
//!     → timeouts.rs (enforce connect/read timeout inside the transport)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every call has a deadline unless explicitly disabled
//! - The policy is a seam: callers may replace it wholesale
//! - A policy error is returned to the caller unchanged
//! - All resilience logic is composable invoker wrappers

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

use std::sync::Arc;

use crate::config::{CircuitBreakerConfig, ClientConfig, RetryConfig};
use crate::error::BoxError;
use crate::rpc::{Invoker, InvokerBuilder};

use circuit_breaker::{BreakerInvoker, CircuitBreaker};
use retries::RetryingInvoker;

/// Produces the base builder that capabilities enrich.
///
/// Policies usually add layers around the plain invoker; the client
/// assembles the final invoker once capabilities have run.
pub trait Resiliency: Send + Sync + 'static {
    fn build(&self, base: InvokerBuilder) -> Result<InvokerBuilder, BoxError>;
}

impl<R: Resiliency + ?Sized> Resiliency for Arc<R> {
    fn build(&self, base: InvokerBuilder) -> Result<InvokerBuilder, BoxError> {
        (**self).build(base)
    }
}

/// Resiliency policy backed by a closure.
pub struct FnResiliency<F> {
    f: F,
}

/// Build a resiliency policy from a closure.
pub fn from_fn<F>(f: F) -> FnResiliency<F>
where
    F: Fn(InvokerBuilder) -> Result<InvokerBuilder, BoxError> + Send + Sync + 'static,
{
    FnResiliency { f }
}

impl<F> Resiliency for FnResiliency<F>
where
    F: Fn(InvokerBuilder) -> Result<InvokerBuilder, BoxError> + Send + Sync + 'static,
{
    fn build(&self, base: InvokerBuilder) -> Result<InvokerBuilder, BoxError> {
        (self.f)(base)
    }
}

/// Policy that leaves the base builder untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResiliency;

impl Resiliency for NoResiliency {
    fn build(&self, base: InvokerBuilder) -> Result<InvokerBuilder, BoxError> {
        Ok(base)
    }
}

/// Retry with backoff, optionally behind a circuit breaker.
#[derive(Debug, Clone)]
pub struct DefaultResiliency {
    retry: RetryConfig,
    breaker: Option<CircuitBreakerConfig>,
}

impl DefaultResiliency {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry, breaker: None }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let breaker = config
            .circuit_breaker
            .enabled
            .then(|| config.circuit_breaker.clone());
        Self {
            retry: config.retries.clone(),
            breaker,
        }
    }

    pub fn without_retries(mut self) -> Self {
        self.retry.enabled = false;
        self
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker = Some(config);
        self
    }
}

impl Default for DefaultResiliency {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl Resiliency for DefaultResiliency {
    fn build(&self, mut base: InvokerBuilder) -> Result<InvokerBuilder, BoxError> {
        if let Some(config) = &self.breaker {
            if config.failure_threshold == 0 {
                return Err("circuit breaker failure threshold must be greater than 0".into());
            }
            let breaker = CircuitBreaker::from_config(config);
            base.layer("circuit-breaker", move |inner| {
                Arc::new(BreakerInvoker::new(inner, breaker)) as Invoker
            });
        }

        // Retry wraps the breaker so every attempt is gated
        if self.retry.enabled && self.retry.max_attempts > 1 {
            let retry = self.retry.clone();
            base.layer("retry", move |inner| Arc::new(RetryingInvoker::new(inner, retry)) as Invoker);
        }

        Ok(base)
    }
}
