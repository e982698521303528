//! The bound client handle.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use hyper::Uri;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::config::ModeKind;
use crate::dispatch::{AsyncMode, DeferredResult, Dispatcher, DispatchMode, SyncMode};
use crate::error::ClientResult;
use crate::graphql::{self, Operation};
use crate::observability::metrics;
use crate::rpc::Invoker;

/// Caller-defined API surface bound to a built client.
///
/// ```ignore
/// struct Books(Client<SyncMode>);
///
/// impl Contract<SyncMode> for Books {
///     fn bind(client: Client<SyncMode>) -> Self {
///         Books(client)
///     }
/// }
/// ```
pub trait Contract<M: DispatchMode>: Sized {
    fn bind(client: Client<M>) -> Self;
}

impl<M: DispatchMode> Contract<M> for Client<M> {
    fn bind(client: Client<M>) -> Self {
        client
    }
}

/// GraphQL client. Cheap to clone; clones share the invoker and dispatcher.
pub struct Client<M: DispatchMode> {
    inner: Arc<ClientInner>,
    _mode: PhantomData<M>,
}

struct ClientInner {
    endpoint: String,
    graphql_url: Uri,
    invoker: Invoker,
    dispatcher: Dispatcher,
}

impl<M: DispatchMode> Client<M> {
    pub(crate) fn new(endpoint: String, graphql_url: Uri, invoker: Invoker, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                graphql_url,
                invoker,
                dispatcher,
            }),
            _mode: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Absolute URL operations are posted to.
    pub fn graphql_url(&self) -> &Uri {
        &self.inner.graphql_url
    }

    pub fn mode(&self) -> ModeKind {
        M::KIND
    }

    /// The final invoker, for callers that send raw requests.
    pub fn invoker(&self) -> &Invoker {
        &self.inner.invoker
    }
}

impl Client<SyncMode> {
    /// Run `operation` on the calling thread and decode its root field.
    ///
    /// Must not be called from within an async runtime.
    pub fn execute<T: DeserializeOwned>(&self, operation: &Operation) -> ClientResult<T> {
        let call = perform(self.inner.invoker.clone(), self.inner.graphql_url.clone(), operation.clone());
        self.inner.dispatcher.call(call)
    }
}

impl Client<AsyncMode> {
    /// Submit `operation` to the executor and return immediately.
    pub fn execute<T>(&self, operation: &Operation) -> DeferredResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        // The task captures the invoker, never the client handle
        let call = perform(self.inner.invoker.clone(), self.inner.graphql_url.clone(), operation.clone());
        self.inner.dispatcher.submit(call)
    }
}

async fn perform<T: DeserializeOwned>(invoker: Invoker, url: Uri, operation: Operation) -> ClientResult<T> {
    let span = tracing::debug_span!("graphql_call", operation = %operation.name(), kind = %operation.kind());

    async move {
        let start = Instant::now();
        let outcome = match operation.to_request(&url) {
            Ok(request) => match invoker.invoke(request).await {
                Ok(response) => graphql::decode(response, operation.name()),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let label = match &outcome {
            Ok(_) => "ok",
            Err(e) => {
                tracing::debug!(error = %e, elapsed = ?start.elapsed(), "Call failed");
                e.label()
            }
        };
        metrics::record_call(operation.name(), label, start);
        outcome
    }
    .instrument(span)
    .await
}

impl<M: DispatchMode> Clone for Client<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _mode: PhantomData,
        }
    }
}

impl<M: DispatchMode> std::fmt::Debug for Client<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("mode", &M::KIND)
            .field("endpoint", &self.inner.endpoint)
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}
