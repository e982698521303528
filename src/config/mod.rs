//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated)
//!     → ClientBuilder::from_config
//!     → frozen inside the built Client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built; a new config means a new client
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ClientConfig;
pub use schema::CircuitBreakerConfig;
pub use schema::ModeKind;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::TimeoutConfig;
pub use schema::WorkerPoolConfig;
