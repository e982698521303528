//! GraphQL RPC client library

pub mod capability;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod graphql;
pub mod observability;
pub mod resilience;
pub mod rpc;
pub mod transport;

pub use capability::Capability;
pub use client::{Client, ClientBuilder, Contract};
pub use config::ClientConfig;
pub use dispatch::{AsyncMode, DeferredResult, SyncMode, TaskExecutor};
pub use error::{BoxError, ClientError, ClientResult};
pub use graphql::{GraphqlError, Operation, OperationKind};
pub use resilience::{DefaultResiliency, Resiliency};
pub use transport::Transport;
