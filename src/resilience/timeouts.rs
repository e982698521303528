//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound connection establishment by the connect timeout
//! - Bound every wait for response bytes by the read timeout
//! - Bound whole exchanges of transports that do not enforce timeouts themselves
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - `None` means no limit

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::{ClientError, ClientResult};

/// Run a connect attempt under the connect timeout.
pub async fn connect_within<F, T>(limit: Option<Duration>, address: &str, connect: F) -> ClientResult<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    let outcome = match limit {
        Some(limit) => timeout(limit, connect)
            .await
            .map_err(|_| ClientError::ConnectTimeout(limit))?,
        None => connect.await,
    };

    outcome.map_err(|source| ClientError::Connect {
        address: address.to_string(),
        source,
    })
}

/// Wait for the next piece of the response under the read timeout.
pub async fn read_within<F>(limit: Option<Duration>, read: F) -> ClientResult<F::Output>
where
    F: Future,
{
    match limit {
        Some(limit) => timeout(limit, read)
            .await
            .map_err(|_| ClientError::ReadTimeout(limit)),
        None => Ok(read.await),
    }
}

/// Bound a complete fallible exchange by the read timeout.
pub async fn exchange_within<F, T>(limit: Option<Duration>, exchange: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    read_within(limit, exchange).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn test_connect_timeout_is_distinct() {
        let limit = Duration::from_millis(20);
        let result = connect_within(Some(limit), "10.0.0.1:80", pending::<std::io::Result<()>>()).await;
        assert!(matches!(result, Err(ClientError::ConnectTimeout(d)) if d == limit));
    }

    #[tokio::test]
    async fn test_connect_failure_keeps_io_error() {
        let refused = async {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"))
        };
        let result = connect_within(Some(Duration::from_secs(1)), "127.0.0.1:1", refused).await;
        match result {
            Err(ClientError::Connect { address, source }) => {
                assert_eq!(address, "127.0.0.1:1");
                assert_eq!(source.kind(), std::io::ErrorKind::ConnectionRefused);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let result = read_within(Some(Duration::from_millis(10)), pending::<()>()).await;
        assert!(matches!(result, Err(ClientError::ReadTimeout(_))));

        let result = read_within(None, async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_exchange_flattens_inner_error() {
        let result: ClientResult<()> =
            exchange_within(Some(Duration::from_secs(1)), async { Err(ClientError::CircuitOpen) }).await;
        assert!(matches!(result, Err(ClientError::CircuitOpen)));
    }
}
