//! Metrics collection.
//!
//! # Metrics
//! - `graphql_client_calls_total` (counter): calls by operation, outcome
//! - `graphql_client_call_duration_seconds` (histogram): call latency by operation
//! - `graphql_client_retries_total` (counter): retries by operation
//! - `graphql_client_circuit_open` (gauge): 1 while the breaker is open or half-open
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; exporting is the application's choice
//! - Outcome labels come from `ClientError::label`, keeping cardinality bounded

use std::time::Instant;

/// Record a finished call.
pub fn record_call(operation: &str, outcome: &'static str, start: Instant) {
    let duration = start.elapsed().as_secs_f64();

    metrics::counter!(
        "graphql_client_calls_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        "graphql_client_call_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration);
}

/// Record one retry of a call.
pub fn record_retry(operation: &str) {
    metrics::counter!("graphql_client_retries_total", "operation" => operation.to_string()).increment(1);
}

/// Record a circuit breaker transition.
pub fn record_circuit_state(state: &'static str) {
    let open = if state == "closed" { 0.0 } else { 1.0 };
    metrics::gauge!("graphql_client_circuit_open").set(open);
    tracing::trace!(state, "Circuit state recorded");
}
