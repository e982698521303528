//! Base RPC builder and the invocation primitive it produces.
//!
//! # Data Flow
//! ```text
//! ClientBuilder::build
//!     → InvokerBuilder::new(transport, timeouts)
//!     → Resiliency::build(base) → base builder with policy layers
//!     → capabilities mutate it (interceptors, headers, transport, layers)
//!     → InvokerBuilder::build → Invoker               (final primitive)
//!
//! Per call:
//!     Invoker::invoke(request)
//!         → layers, outermost first (request id, retry, breaker, ...)
//!         → default headers → interceptors (on_request)
//!         → TransportAdapter::send
//!         → interceptors (on_response) → response
//! ```
//!
//! # Design Decisions
//! - The base builder is plain data; it performs no I/O
//! - The base invoker has no retry or breaker; resiliency wraps it
//! - Invokers are shared (`Arc`) and immutable, so one client serves concurrent callers

pub mod interceptor;

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportAdapter, TransportTimeouts};

pub use interceptor::Interceptor;

/// Performs one logical call: request in, response out.
pub trait Invoke: Send + Sync + 'static {
    fn invoke(&self, request: HttpRequest) -> BoxFuture<'_, ClientResult<HttpResponse>>;
}

/// Shared handle to the final invocation primitive.
pub type Invoker = Arc<dyn Invoke>;

type Layer = Box<dyn FnOnce(Invoker) -> Invoker + Send>;

/// In-progress configuration of the invoker.
///
/// The resiliency policy produces it; capabilities then receive it mutably.
pub struct InvokerBuilder {
    transport: Arc<dyn Transport>,
    timeouts: TransportTimeouts,
    interceptors: Vec<Arc<dyn Interceptor>>,
    default_headers: HeaderMap,
    layers: Vec<(String, Layer)>,
}

impl InvokerBuilder {
    pub fn new(transport: Arc<dyn Transport>, timeouts: TransportTimeouts) -> Self {
        Self {
            transport,
            timeouts,
            interceptors: Vec::new(),
            default_headers: HeaderMap::new(),
            layers: Vec::new(),
        }
    }

    /// Timeouts the transport adapter will enforce.
    pub fn timeouts(&self) -> TransportTimeouts {
        self.timeouts
    }

    /// The transport calls will be sent through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Replace the transport with a decorated version of itself.
    pub fn map_transport<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(Arc<dyn Transport>) -> Arc<dyn Transport>,
    {
        self.transport = f(self.transport.clone());
        self
    }

    /// Append an interceptor.
    pub fn interceptor(&mut self, interceptor: impl Interceptor) -> &mut Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append an interceptor that is shared with other owners.
    pub fn shared_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Header added to every request that does not already carry it.
    pub fn default_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn interceptor_names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Wrap the assembled invoker. Later layers wrap earlier ones.
    pub fn layer<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: FnOnce(Invoker) -> Invoker + Send + 'static,
    {
        self.layers.push((name.into(), Box::new(f)));
        self
    }

    /// Layer names, innermost first.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Assemble the invoker: the base call wrapped by every layer.
    pub fn build(self) -> Invoker {
        let base: Invoker = Arc::new(BaseInvoker {
            adapter: TransportAdapter::new(self.transport, self.timeouts),
            interceptors: self.interceptors,
            default_headers: self.default_headers,
        });
        self.layers.into_iter().fold(base, |inner, (_, layer)| layer(inner))
    }
}

impl std::fmt::Debug for InvokerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokerBuilder")
            .field("timeouts", &self.timeouts)
            .field("interceptors", &self.interceptor_names())
            .field("default_headers", &self.default_headers)
            .field("layers", &self.layer_names())
            .finish()
    }
}

struct BaseInvoker {
    adapter: TransportAdapter,
    interceptors: Vec<Arc<dyn Interceptor>>,
    default_headers: HeaderMap,
}

impl BaseInvoker {
    async fn call(&self, mut request: HttpRequest) -> ClientResult<HttpResponse> {
        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }

        for interceptor in &self.interceptors {
            interceptor
                .on_request(&mut request)
                .map_err(|source| ClientError::Interceptor {
                    name: interceptor.name().to_string(),
                    source,
                })?;
        }

        let response = self.adapter.send(request).await?;

        for interceptor in &self.interceptors {
            interceptor
                .on_response(&response)
                .map_err(|source| ClientError::Interceptor {
                    name: interceptor.name().to_string(),
                    source,
                })?;
        }

        Ok(response)
    }
}

impl Invoke for BaseInvoker {
    fn invoke(&self, request: HttpRequest) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        self.call(request).boxed()
    }
}

/// Copy a buffered request so it can be sent again.
pub fn duplicate_request(request: &HttpRequest) -> HttpRequest {
    let mut copy = HttpRequest::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    *copy.extensions_mut() = request.extensions().clone();
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::transport;
    use hyper::body::Bytes;
    use std::sync::Mutex;

    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    impl Interceptor for Tag {
        fn name(&self) -> &str {
            self.0
        }

        fn on_request(&self, request: &mut HttpRequest) -> Result<(), BoxError> {
            self.1.lock().unwrap().push(format!("{}:request", self.0));
            request
                .headers_mut()
                .append("x-tag", HeaderValue::from_static(self.0));
            Ok(())
        }

        fn on_response(&self, _response: &HttpResponse) -> Result<(), BoxError> {
            self.1.lock().unwrap().push(format!("{}:response", self.0));
            Ok(())
        }
    }

    struct Reject;

    impl Interceptor for Reject {
        fn on_request(&self, _request: &mut HttpRequest) -> Result<(), BoxError> {
            Err("not allowed".into())
        }
    }

    fn echo_headers() -> Arc<dyn Transport> {
        Arc::new(transport::from_fn(|request: HttpRequest| async move {
            let tags: Vec<_> = request
                .headers()
                .get_all("x-tag")
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            let agent = request
                .headers()
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            Ok(HttpResponse::new(Bytes::from(format!("{}|{}", tags.join(","), agent))))
        }))
    }

    #[tokio::test]
    async fn test_interceptors_and_headers_applied_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = InvokerBuilder::new(echo_headers(), TransportTimeouts::default());
        builder
            .interceptor(Tag("first", log.clone()))
            .interceptor(Tag("second", log.clone()))
            .default_header(HeaderName::from_static("user-agent"), HeaderValue::from_static("test-agent"));

        assert_eq!(builder.interceptor_names(), vec!["first", "second"]);

        let invoker = builder.build();
        let response = invoker.invoke(HttpRequest::new(Bytes::new())).await.unwrap();
        assert_eq!(response.body().as_ref(), b"first,second|test-agent");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:request", "second:request", "first:response", "second:response"]
        );
    }

    #[tokio::test]
    async fn test_explicit_header_wins_over_default() {
        let mut builder = InvokerBuilder::new(echo_headers(), TransportTimeouts::default());
        builder.default_header(HeaderName::from_static("user-agent"), HeaderValue::from_static("default"));
        let invoker = builder.build();

        let mut request = HttpRequest::new(Bytes::new());
        request
            .headers_mut()
            .insert("user-agent", HeaderValue::from_static("explicit"));
        let response = invoker.invoke(request).await.unwrap();
        assert_eq!(response.body().as_ref(), b"|explicit");
    }

    #[tokio::test]
    async fn test_interceptor_error_aborts_call() {
        let mut builder = InvokerBuilder::new(echo_headers(), TransportTimeouts::default());
        builder.interceptor(Reject);
        let err = builder
            .build()
            .invoke(HttpRequest::new(Bytes::new()))
            .await
            .unwrap_err();
        match err {
            ClientError::Interceptor { name, source } => {
                assert!(name.ends_with("Reject"));
                assert_eq!(source.to_string(), "not allowed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    struct Prefix(&'static str, Invoker);

    impl Invoke for Prefix {
        fn invoke(&self, request: HttpRequest) -> BoxFuture<'_, ClientResult<HttpResponse>> {
            async move {
                let response = self.1.invoke(request).await?;
                let mut body = self.0.as_bytes().to_vec();
                body.extend_from_slice(response.body());
                Ok(HttpResponse::new(Bytes::from(body)))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_later_layers_wrap_earlier_ones() {
        let mut builder = InvokerBuilder::new(echo_headers(), TransportTimeouts::default());
        builder
            .layer("inner", |inner| Arc::new(Prefix("inner>", inner)) as Invoker)
            .layer("outer", |inner| Arc::new(Prefix("outer>", inner)) as Invoker);
        assert_eq!(builder.layer_names(), vec!["inner", "outer"]);

        let response = builder.build().invoke(HttpRequest::new(Bytes::new())).await.unwrap();
        assert_eq!(response.body().as_ref(), b"outer>inner>|");
    }

    #[test]
    fn test_duplicate_request_keeps_everything() {
        let mut request = hyper::Request::builder()
            .method("POST")
            .uri("http://localhost/graphql")
            .header("x-a", "1")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        request.extensions_mut().insert(42u32);

        let copy = duplicate_request(&request);
        assert_eq!(copy.method(), "POST");
        assert_eq!(copy.uri(), "http://localhost/graphql");
        assert_eq!(copy.headers()["x-a"], "1");
        assert_eq!(copy.body().as_ref(), b"payload");
        assert_eq!(copy.extensions().get::<u32>(), Some(&42));
    }
}
