//! Handle to the outcome of an async-mode call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{ClientError, ClientResult};

/// Outcome of a call that runs on an executor.
///
/// Await it from async code or [`wait`](DeferredResult::wait) on it from a
/// plain thread. A failed call yields [`ClientError::Execution`] wrapping the
/// origin failure.
#[derive(Debug)]
#[must_use = "a deferred result does nothing unless awaited or waited on"]
pub struct DeferredResult<T> {
    receiver: oneshot::Receiver<ClientResult<T>>,
}

impl<T> DeferredResult<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<ClientResult<T>>) -> Self {
        Self { receiver }
    }

    /// Build a result that is already complete.
    pub fn ready(result: ClientResult<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self::new(rx)
    }

    /// Block the current thread until the call completes.
    ///
    /// Panics if called from within an async runtime.
    pub fn wait(self) -> ClientResult<T> {
        settle(self.receiver.blocking_recv())
    }
}

impl<T> Future for DeferredResult<T> {
    type Output = ClientResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(settle)
    }
}

fn settle<T>(received: Result<ClientResult<T>, oneshot::error::RecvError>) -> ClientResult<T> {
    match received {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(origin)) => Err(ClientError::Execution {
            source: Box::new(origin),
        }),
        Err(_) => Err(ClientError::Execution {
            source: Box::new(ClientError::ExecutorDropped),
        }),
    }
}
