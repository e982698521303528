//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Invoker (rpc)
//!     → TransportAdapter (timeouts handed down, or enforced around the exchange)
//!     → Transport::send (http.rs by default, or a caller override)
//!     → HttpResponse (fully buffered body) or ClientError
//! ```
//!
//! # Design Decisions
//! - Transports never retry; retries belong to the resiliency layer
//! - Timeout expiry surfaces as dedicated error variants, never as generic I/O
//! - Bodies are fully buffered: a GraphQL response is a single JSON document

pub mod http;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use hyper::body::Bytes;

use crate::error::ClientResult;
use crate::resilience::timeouts::exchange_within;

pub use http::HyperTransport;

/// Outbound request with a buffered body. The URI is absolute.
pub type HttpRequest = hyper::Request<Bytes>;

/// Inbound response with a buffered body.
pub type HttpResponse = hyper::Response<Bytes>;

/// Per-call limits handed to a transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportTimeouts {
    /// Limit on establishing the connection.
    pub connect: Option<Duration>,
    /// Limit on any single wait for response bytes.
    pub read: Option<Duration>,
}

/// Sends one HTTP request and returns the response.
pub trait Transport: Send + Sync + 'static {
    /// Perform the exchange. Implementations that honor `timeouts` should
    /// return true from [`Transport::enforces_timeouts`].
    fn send(&self, request: HttpRequest, timeouts: TransportTimeouts) -> BoxFuture<'_, ClientResult<HttpResponse>>;

    /// Whether `send` enforces the timeouts itself.
    fn enforces_timeouts(&self) -> bool {
        false
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest, timeouts: TransportTimeouts) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        (**self).send(request, timeouts)
    }

    fn enforces_timeouts(&self) -> bool {
        (**self).enforces_timeouts()
    }
}

/// Transport backed by a closure.
pub struct FnTransport<F> {
    f: F,
}

/// Build a transport from a closure returning the response future.
pub fn from_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ClientResult<HttpResponse>> + Send + 'static,
{
    FnTransport { f }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ClientResult<HttpResponse>> + Send + 'static,
{
    fn send(&self, request: HttpRequest, _timeouts: TransportTimeouts) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        (self.f)(request).boxed()
    }
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

/// Binds a transport to the configured timeouts.
#[derive(Clone)]
pub struct TransportAdapter {
    inner: Arc<dyn Transport>,
    timeouts: TransportTimeouts,
}

impl TransportAdapter {
    pub fn new(inner: Arc<dyn Transport>, timeouts: TransportTimeouts) -> Self {
        Self { inner, timeouts }
    }

    pub fn timeouts(&self) -> TransportTimeouts {
        self.timeouts
    }

    /// Send a request. Transports that ignore timeouts are bounded by the
    /// read timeout over the whole exchange.
    pub async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        if self.inner.enforces_timeouts() {
            self.inner.send(request, self.timeouts).await
        } else {
            exchange_within(self.timeouts.read, self.inner.send(request, self.timeouts)).await
        }
    }
}

impl std::fmt::Debug for TransportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportAdapter")
            .field("timeouts", &self.timeouts)
            .field("enforces_timeouts", &self.inner.enforces_timeouts())
            .finish()
    }
}
