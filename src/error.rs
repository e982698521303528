//! Error types shared by client construction and calls.
//!
//! # Design Decisions
//! - One tagged enum; wrapping variants carry their cause as a field
//! - Caller seams (resiliency, capabilities, interceptors) hand back `BoxError`
//! - Resiliency failures are transparent so the caller's own error type survives

use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

use crate::graphql::GraphqlError;

/// Error raised by caller-supplied code plugged into the client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while building a client or performing a call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Builder or configuration input was rejected.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// No response bytes arrived within the read timeout.
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// The connection was not established within the connect timeout.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The connection attempt failed outright.
    #[error("failed to connect to {address}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other failure while exchanging the request on the wire.
    #[error("transport failure")]
    Transport(#[source] BoxError),

    /// The default transport only speaks plain HTTP.
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),

    /// The resiliency policy failed to build the invoker.
    #[error(transparent)]
    ResiliencyBuild(BoxError),

    /// A capability hook failed during client construction.
    #[error("capability '{name}' at position {position} failed during client construction")]
    Capability {
        name: String,
        position: usize,
        #[source]
        source: BoxError,
    },

    /// An interceptor rejected a request or response.
    #[error("interceptor '{name}' rejected the call")]
    Interceptor {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A deferred call failed; the origin failure is the source.
    #[error("deferred call failed")]
    Execution {
        #[source]
        source: Box<ClientError>,
    },

    /// The executor dropped the task without running it.
    #[error("executor dropped the call before it completed")]
    ExecutorDropped,

    /// A retryable failure persisted through every allowed attempt.
    #[error("call failed after {attempts} attempt(s)")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ClientError>,
    },

    /// The circuit breaker is rejecting calls.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status { status: StatusCode, body: String },

    /// The server answered with GraphQL errors.
    #[error("GraphQL errors: {}", join_messages(.0))]
    Graphql(Vec<GraphqlError>),

    /// Encoding the request or decoding the response failed.
    #[error("JSON encoding failed")]
    Json(#[from] serde_json::Error),

    /// The I/O driver could not be started.
    #[error("failed to start I/O driver")]
    Runtime(#[source] std::io::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Walk through execution and retry wrappers to the failure that started it all.
    pub fn root_cause(&self) -> &ClientError {
        match self {
            ClientError::Execution { source } | ClientError::RetriesExhausted { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Returns true if the root cause is a read timeout.
    pub fn is_read_timeout(&self) -> bool {
        matches!(self.root_cause(), ClientError::ReadTimeout(_))
    }

    /// The origin failure of a deferred call, if this is an execution failure.
    pub fn execution_cause(&self) -> Option<&ClientError> {
        match self {
            ClientError::Execution { source } => Some(source),
            _ => None,
        }
    }

    /// Short label for metrics, taken from the root cause.
    pub fn label(&self) -> &'static str {
        match self.root_cause() {
            ClientError::InvalidConfig(_) => "invalid_config",
            ClientError::ReadTimeout(_) => "read_timeout",
            ClientError::ConnectTimeout(_) => "connect_timeout",
            ClientError::Connect { .. } => "connect",
            ClientError::Transport(_) | ClientError::UnsupportedScheme(_) => "transport",
            ClientError::Interceptor { .. } => "interceptor",
            ClientError::CircuitOpen => "circuit_open",
            ClientError::ExecutorDropped => "executor_dropped",
            ClientError::Status { .. } => "status",
            ClientError::Graphql(_) => "graphql",
            ClientError::Json(_) => "json",
            _ => "error",
        }
    }
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
