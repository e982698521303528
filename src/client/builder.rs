//! Client builder.

use std::marker::PhantomData;
use std::sync::Arc;

use hyper::Uri;

use crate::capability::{Capability, CapabilityRegistry};
use crate::client::handle::{Client, Contract};
use crate::config::validation::validate_config;
use crate::config::{CircuitBreakerConfig, ClientConfig, ModeKind, RetryConfig};
use crate::dispatch::{AsyncMode, DispatchMode, Dispatcher, Driver, SyncMode, TaskExecutor, WorkerPool};
use crate::error::{ClientError, ClientResult};
use crate::resilience::{DefaultResiliency, Resiliency};
use crate::rpc::InvokerBuilder;
use crate::transport::{HyperTransport, Transport};

/// Accumulates configuration and produces bound clients.
///
/// Setters take and return the builder by value; `build` borrows it, so one
/// builder can produce any number of independent clients.
pub struct ClientBuilder<M: DispatchMode> {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    resiliency: Option<Arc<dyn Resiliency>>,
    capabilities: CapabilityRegistry,
    executor: Option<Arc<dyn TaskExecutor>>,
    _mode: PhantomData<M>,
}

impl ClientBuilder<SyncMode> {
    /// Start a blocking client for `endpoint`.
    pub fn sync(endpoint: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(endpoint, ModeKind::Sync))
    }
}

impl ClientBuilder<AsyncMode> {
    /// Start a client whose calls return deferred results.
    pub fn asynchronous(endpoint: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(endpoint, ModeKind::Async))
    }

    /// Run calls on `executor` instead of the internal worker pool.
    pub fn executor(self, executor: impl TaskExecutor) -> Self {
        self.shared_executor(Arc::new(executor))
    }

    pub fn shared_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }
}

impl<M: DispatchMode> ClientBuilder<M> {
    fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            resiliency: None,
            capabilities: CapabilityRegistry::new(),
            executor: None,
            _mode: PhantomData,
        }
    }

    /// Start from a loaded configuration.
    ///
    /// Fails if the configured mode is not `M` or the configuration is invalid.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        if config.mode != M::KIND {
            return Err(ClientError::InvalidConfig(format!(
                "configuration selects {} mode but the builder is {}",
                config.mode,
                M::KIND
            )));
        }
        validate(&config)?;
        Ok(Self::with_config(config))
    }

    /// Limit on waiting for response bytes. Must be greater than zero.
    pub fn read_timeout(mut self, ms: u64) -> ClientResult<Self> {
        if ms == 0 {
            return Err(ClientError::InvalidConfig(
                "read timeout must be greater than 0 ms".to_string(),
            ));
        }
        self.config.timeouts.read_ms = Some(ms);
        Ok(self)
    }

    /// Limit on establishing the connection. Must be greater than zero.
    pub fn connect_timeout(mut self, ms: u64) -> ClientResult<Self> {
        if ms == 0 {
            return Err(ClientError::InvalidConfig(
                "connect timeout must be greater than 0 ms".to_string(),
            ));
        }
        self.config.timeouts.connect_ms = Some(ms);
        Ok(self)
    }

    pub fn transport(self, transport: impl Transport) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the default retry/breaker policy.
    pub fn resiliency(mut self, resiliency: impl Resiliency) -> Self {
        self.resiliency = Some(Arc::new(resiliency));
        self
    }

    /// Retry settings for the default policy.
    pub fn retries(mut self, retries: RetryConfig) -> Self {
        self.config.retries = retries;
        self
    }

    /// Circuit breaker settings for the default policy.
    pub fn circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.config.circuit_breaker = circuit_breaker;
        self
    }

    pub fn add_capability(self, capability: impl Capability) -> Self {
        self.add_shared_capability(Arc::new(capability))
    }

    /// Append a capability. The same instance may be added more than once.
    pub fn add_shared_capability(mut self, capability: Arc<dyn Capability>) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Construct a client and bind it to `C`.
    ///
    /// Runs the resiliency policy once to obtain the base builder, then every
    /// capability hook once, in order, against that builder. Performs no
    /// network I/O and starts no threads.
    ///
    /// Sync calls run on the caller's thread. The default transport resolves
    /// host names on the driver's blocking pool, so calls to a host name
    /// rather than an IP literal may start resolver threads.
    pub fn build<C: Contract<M>>(&self) -> ClientResult<C> {
        validate(&self.config)?;
        let graphql_url = graphql_url(&self.config.endpoint)?;

        let transport = self
            .transport
            .clone()
            .unwrap_or_else(|| Arc::new(HyperTransport::new()));

        let driver = Driver::new()?;
        let dispatcher = match M::KIND {
            ModeKind::Sync => Dispatcher::inline(driver),
            ModeKind::Async => match &self.executor {
                Some(executor) => Dispatcher::executor(driver, executor.clone()),
                None => Dispatcher::pool(driver, WorkerPool::new(self.config.worker_pool.max_threads)),
            },
        };

        let plain = InvokerBuilder::new(transport, self.config.timeouts.transport_timeouts());
        let mut base = match &self.resiliency {
            Some(policy) => policy.build(plain),
            None => DefaultResiliency::from_config(&self.config).build(plain),
        }
        .map_err(ClientError::ResiliencyBuild)?;

        self.capabilities.apply_all(&mut base)?;
        let invoker = base.build();

        tracing::info!(
            endpoint = %self.config.endpoint,
            mode = %M::KIND,
            capabilities = self.capabilities.len(),
            custom_transport = self.transport.is_some(),
            custom_resiliency = self.resiliency.is_some(),
            "GraphQL client built"
        );

        Ok(C::bind(Client::new(
            self.config.endpoint.clone(),
            graphql_url,
            invoker,
            dispatcher,
        )))
    }
}

fn validate(config: &ClientConfig) -> ClientResult<()> {
    validate_config(config).map_err(|errors| {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        ClientError::InvalidConfig(message)
    })
}

fn graphql_url(endpoint: &str) -> ClientResult<Uri> {
    format!("{}/graphql", endpoint.trim_end_matches('/'))
        .parse::<Uri>()
        .map_err(|e| ClientError::InvalidConfig(format!("invalid endpoint '{}': {}", endpoint, e)))
}

impl<M: DispatchMode> Clone for ClientBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: self.transport.clone(),
            resiliency: self.resiliency.clone(),
            capabilities: self.capabilities.clone(),
            executor: self.executor.clone(),
            _mode: PhantomData,
        }
    }
}

impl<M: DispatchMode> std::fmt::Debug for ClientBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("mode", &M::KIND)
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .field("custom_transport", &self.transport.is_some())
            .field("custom_resiliency", &self.resiliency.is_some())
            .field("custom_executor", &self.executor.is_some())
            .finish()
    }
}
