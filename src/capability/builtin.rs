//! Built-in capabilities.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use crate::capability::Capability;
use crate::error::{BoxError, ClientError, ClientResult};
use crate::graphql::OperationInfo;
use crate::rpc::{Interceptor, Invoke, Invoker, InvokerBuilder};
use crate::transport::{HttpRequest, HttpResponse};

/// Adds fixed headers to every request that does not already carry them.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. Invalid names or values are rejected here, not at build time.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, BoxError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

impl Capability for DefaultHeaders {
    fn name(&self) -> &str {
        "default-headers"
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError> {
        for (name, value) in &self.headers {
            builder.default_header(name.clone(), value.clone());
        }
        Ok(())
    }
}

/// Tags each logical call with a fresh `x-request-id` unless one is present.
///
/// The id is assigned in a layer around the whole invoker, so every retry
/// attempt of one call carries the same id.
#[derive(Debug, Clone, Default)]
pub struct RequestIdCapability;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

struct RequestIdInvoker {
    inner: Invoker,
}

impl RequestIdInvoker {
    async fn call(&self, mut request: HttpRequest) -> ClientResult<HttpResponse> {
        if !request.headers().contains_key(REQUEST_ID_HEADER) {
            let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).map_err(|e| ClientError::Interceptor {
                name: "request-id".to_string(),
                source: Box::new(e),
            })?;
            request
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
        }
        self.inner.invoke(request).await
    }
}

impl Invoke for RequestIdInvoker {
    fn invoke(&self, request: HttpRequest) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        self.call(request).boxed()
    }
}

impl Capability for RequestIdCapability {
    fn name(&self) -> &str {
        "request-id"
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError> {
        builder.layer("request-id", |inner| Arc::new(RequestIdInvoker { inner }) as Invoker);
        Ok(())
    }
}

/// Emits a tracing event for every request and response.
#[derive(Debug, Clone, Default)]
pub struct CallLogging;

struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        "call-logging"
    }

    fn on_request(&self, request: &mut HttpRequest) -> Result<(), BoxError> {
        let operation = request
            .extensions()
            .get::<OperationInfo>()
            .map(|info| info.name.as_str())
            .unwrap_or("unknown");
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        tracing::debug!(
            operation,
            request_id,
            uri = %request.uri(),
            bytes = request.body().len(),
            "Sending request"
        );
        Ok(())
    }

    fn on_response(&self, response: &HttpResponse) -> Result<(), BoxError> {
        tracing::debug!(
            status = %response.status(),
            bytes = response.body().len(),
            "Received response"
        );
        Ok(())
    }
}

impl Capability for CallLogging {
    fn name(&self) -> &str {
        "call-logging"
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError> {
        builder.interceptor(LoggingInterceptor);
        Ok(())
    }
}

/// Composite capability whose hook runs its members in order.
///
/// The first member failure is returned unchanged.
#[derive(Clone)]
pub struct Chain {
    name: String,
    members: Vec<Arc<dyn Capability>>,
}

impl Chain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn then(mut self, capability: impl Capability) -> Self {
        self.members.push(Arc::new(capability));
        self
    }

    pub fn then_shared(mut self, capability: Arc<dyn Capability>) -> Self {
        self.members.push(capability);
        self
    }
}

impl Capability for Chain {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError> {
        for member in &self.members {
            tracing::trace!(chain = %self.name, capability = member.name(), "Applying chained capability");
            member.apply(builder)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("members", &self.members.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}
