//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failed call is retryable (queries only, unless configured)
//! - Execute retries with exponential backoff + jitter
//! - Enforce retry budget (retries as a share of recent calls)
//!
//! # Design Decisions
//! - Mutations are never retried once the request may have been delivered
//! - Connection failures are always retryable: nothing reached the server
//! - Jittered backoff prevents thundering herd
//! - Retry budget prevents retry storms under load

use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};
use hyper::StatusCode;

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult};
use crate::graphql::{OperationInfo, OperationKind};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::rpc::{duplicate_request, Invoke, Invoker};
use crate::transport::{HttpRequest, HttpResponse};

const BUDGET_WINDOW: Duration = Duration::from_secs(10);

/// Caps retries to a fraction of the calls seen in a sliding window.
#[derive(Debug)]
pub struct RetryBudget {
    ratio: f64,
    min_retries: u32,
    window: Mutex<BudgetWindow>,
}

#[derive(Debug)]
struct BudgetWindow {
    started: Instant,
    requests: u32,
    retries: u32,
}

impl RetryBudget {
    pub fn new(ratio: f64, min_retries: u32) -> Self {
        Self {
            ratio,
            min_retries,
            window: Mutex::new(BudgetWindow {
                started: Instant::now(),
                requests: 0,
                retries: 0,
            }),
        }
    }

    /// Count one logical call.
    pub fn record_request(&self) {
        let mut window = self.window.lock().expect("retry budget mutex poisoned");
        window.roll();
        window.requests = window.requests.saturating_add(1);
    }

    /// Take one retry from the budget if any is left.
    pub fn can_retry(&self) -> bool {
        let mut window = self.window.lock().expect("retry budget mutex poisoned");
        window.roll();

        let allowed = self.min_retries as f64 + window.requests as f64 * self.ratio;
        if (window.retries as f64) < allowed {
            window.retries += 1;
            true
        } else {
            false
        }
    }
}

impl BudgetWindow {
    fn roll(&mut self) {
        if self.started.elapsed() >= BUDGET_WINDOW {
            self.started = Instant::now();
            self.requests = 0;
            self.retries = 0;
        }
    }
}

/// Check if a failed call may be sent again.
pub fn is_retryable(kind: OperationKind, error: &ClientError, retry_mutations: bool) -> bool {
    let may_resend = kind == OperationKind::Query || retry_mutations;
    match error {
        ClientError::Connect { .. } | ClientError::ConnectTimeout(_) => true,
        ClientError::ReadTimeout(_) | ClientError::Transport(_) => may_resend,
        _ => false,
    }
}

/// Check if a response status is worth retrying.
pub fn is_retryable_status(kind: OperationKind, status: StatusCode, retry_mutations: bool) -> bool {
    let may_resend = kind == OperationKind::Query || retry_mutations;
    may_resend
        && matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
}

/// Invoker that re-sends retryable failures with backoff.
pub struct RetryingInvoker {
    inner: Invoker,
    config: RetryConfig,
    budget: RetryBudget,
}

impl RetryingInvoker {
    pub fn new(inner: Invoker, config: RetryConfig) -> Self {
        let budget = RetryBudget::new(f64::from(config.budget_ratio), config.budget_min_retries);
        Self { inner, config, budget }
    }

    async fn call(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        // Requests without operation metadata are treated like mutations
        let (kind, operation) = match request.extensions().get::<OperationInfo>() {
            Some(info) => (info.kind, info.name.clone()),
            None => (OperationKind::Mutation, String::from("unknown")),
        };
        let max_attempts = self.config.max_attempts.max(1);

        self.budget.record_request();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = self.inner.invoke(duplicate_request(&request)).await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if attempts < max_attempts
                        && is_retryable_status(kind, status, self.config.retry_mutations)
                        && self.budget.can_retry()
                    {
                        let backoff = calculate_backoff(attempts, self.config.base_delay_ms, self.config.max_delay_ms);
                        tracing::info!(operation = %operation, attempt = attempts, delay = ?backoff, status = %status, "Retrying call");
                        metrics::record_retry(&operation);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if !is_retryable(kind, &e, self.config.retry_mutations) {
                        return Err(e);
                    }
                    if attempts < max_attempts && self.budget.can_retry() {
                        let backoff = calculate_backoff(attempts, self.config.base_delay_ms, self.config.max_delay_ms);
                        tracing::info!(operation = %operation, attempt = attempts, delay = ?backoff, error = %e, "Retrying after transport error");
                        metrics::record_retry(&operation);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    tracing::warn!(operation = %operation, attempts, error = %e, "Giving up on call");
                    return Err(ClientError::RetriesExhausted {
                        attempts,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}

impl Invoke for RetryingInvoker {
    fn invoke(&self, request: HttpRequest) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        self.call(request).boxed()
    }
}
