//! Client facade.
//!
//! # Data Flow
//! ```text
//! ClientBuilder::{sync, asynchronous, from_config}
//!     → setters (validated eagerly)
//!     → build::<C>()
//!         → validate config, derive {endpoint}/graphql
//!         → transport (override or HyperTransport)
//!         → dispatcher (inline, worker pool, or caller executor)
//!         → resiliency (once) → base InvokerBuilder
//!         → capabilities (in order) → Invoker
//!         → C::bind(Client)
//! ```
//!
//! # Design Decisions
//! - The dispatch mode is a type parameter; `execute` differs per mode
//! - Builders are reusable values; each build yields an independent client
//! - Building performs no network I/O

pub mod builder;
pub mod handle;

pub use builder::ClientBuilder;
pub use handle::{Client, Contract};
