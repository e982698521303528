//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client construction, calls, retries, breaker transitions produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via the `metrics` facade)
//!
//! Consumers:
//!     → Whatever subscriber / recorder the application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics recorder; without one, updates are no-ops
//! - Logging initialization is opt-in (`init_logging`) and idempotent
//! - Every call runs inside a `graphql_call` span carrying the operation name

pub mod logging;
pub mod metrics;
