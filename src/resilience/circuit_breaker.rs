//! Circuit breaker for endpoint protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: endpoint assumed down, calls fail fast
//! - Half-Open: testing if endpoint recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: after recovery timeout
//! Half-Open → Closed: probe call succeeds
//! Half-Open → Open: probe call fails
//! ```
//!
//! # Design Decisions
//! - One breaker per client (one client talks to one endpoint)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in Half-Open (prevents hammering recovering endpoint)
//! - Connection errors, timeouts and 5xx count as failures; 4xx do not

use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};

use crate::config::CircuitBreakerConfig;
use crate::error::{ClientError, ClientResult};
use crate::observability::metrics;
use crate::rpc::{Invoke, Invoker};
use crate::transport::{HttpRequest, HttpResponse};

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug)]
enum Inner {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery: Duration,
    state: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery,
            state: Mutex::new(Inner::Closed { failures: 0 }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, Duration::from_millis(config.recovery_ms))
    }

    /// Ask permission to send a call.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        match *state {
            Inner::Closed { .. } => true,
            Inner::Open { until } => {
                if Instant::now() >= until {
                    *state = Inner::HalfOpen;
                    metrics::record_circuit_state(CircuitState::HalfOpen.as_str());
                    tracing::info!("Circuit half-open, sending probe");
                    true
                } else {
                    false
                }
            }
            // The probe is already in flight
            Inner::HalfOpen => false,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        if !matches!(*state, Inner::Closed { failures: 0 }) {
            if matches!(*state, Inner::HalfOpen) {
                tracing::info!("Circuit closed after successful probe");
                metrics::record_circuit_state(CircuitState::Closed.as_str());
            }
            *state = Inner::Closed { failures: 0 };
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("circuit breaker mutex poisoned");
        match *state {
            Inner::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.failure_threshold {
                    tracing::warn!(failures, "Circuit opened");
                    metrics::record_circuit_state(CircuitState::Open.as_str());
                    *state = Inner::Open {
                        until: Instant::now() + self.recovery,
                    };
                } else {
                    *state = Inner::Closed { failures };
                }
            }
            Inner::HalfOpen => {
                tracing::warn!("Probe failed, circuit re-opened");
                metrics::record_circuit_state(CircuitState::Open.as_str());
                *state = Inner::Open {
                    until: Instant::now() + self.recovery,
                };
            }
            Inner::Open { .. } => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        match *self.state.lock().expect("circuit breaker mutex poisoned") {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen => CircuitState::HalfOpen,
        }
    }
}

/// Whether an outcome counts against the endpoint.
fn is_failure(outcome: &ClientResult<HttpResponse>) -> bool {
    match outcome {
        Ok(response) => response.status().is_server_error(),
        Err(ClientError::Connect { .. })
        | Err(ClientError::ConnectTimeout(_))
        | Err(ClientError::ReadTimeout(_))
        | Err(ClientError::Transport(_)) => true,
        Err(_) => false,
    }
}

/// Invoker that rejects calls while the breaker is open.
pub struct BreakerInvoker {
    inner: Invoker,
    breaker: CircuitBreaker,
}

impl BreakerInvoker {
    pub fn new(inner: Invoker, breaker: CircuitBreaker) -> Self {
        Self { inner, breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn call(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        if !self.breaker.try_acquire() {
            return Err(ClientError::CircuitOpen);
        }

        let outcome = self.inner.invoke(request).await;
        if is_failure(&outcome) {
            self.breaker.record_failure();
        } else {
            self.breaker.record_success();
        }
        outcome
    }
}

impl Invoke for BreakerInvoker {
    fn invoke(&self, request: HttpRequest) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        self.call(request).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_single_probe() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.try_acquire());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_failed_probe_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_invoker_fails_fast_when_open() {
        use crate::transport::{self, TransportTimeouts};
        use crate::rpc::InvokerBuilder;
        use hyper::body::Bytes;
        use std::sync::Arc;

        let failing = transport::from_fn(|_req: HttpRequest| async {
            Err(ClientError::Transport("reset by peer".into()))
        });
        let base = InvokerBuilder::new(Arc::new(failing), TransportTimeouts::default()).build();
        let invoker = BreakerInvoker::new(base, CircuitBreaker::new(2, Duration::from_secs(60)));

        for _ in 0..2 {
            let err = invoker.invoke(HttpRequest::new(Bytes::new())).await.unwrap_err();
            assert!(matches!(err, ClientError::Transport(_)));
        }
        let err = invoker.invoke(HttpRequest::new(Bytes::new())).await.unwrap_err();
        assert!(matches!(err, ClientError::CircuitOpen));
    }
}
