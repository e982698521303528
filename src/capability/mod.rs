//! Capability registry.
//!
//! # Data Flow
//! ```text
//! ClientBuilder::add_capability (registration order kept, duplicates allowed)
//!     → build(): CapabilityRegistry::apply_all(&mut base)   (base from the resiliency policy)
//!         → capability[0].apply → capability[1].apply → ...
//!     → first failure aborts construction (name + position + original error)
//! ```
//!
//! # Design Decisions
//! - Capabilities are composed, not inherited; `Chain` nests hooks explicitly
//! - Each hook runs exactly once per build
//! - Hooks only configure; they never perform I/O

pub mod builtin;

use std::sync::Arc;

use crate::error::{BoxError, ClientError, ClientResult};
use crate::rpc::InvokerBuilder;

pub use builtin::{CallLogging, Chain, DefaultHeaders, RequestIdCapability};

/// A named construction hook that may enrich the base builder.
pub trait Capability: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError>;
}

impl<C: Capability + ?Sized> Capability for Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError> {
        (**self).apply(builder)
    }
}

/// Capability backed by a closure.
pub struct FnCapability<F> {
    name: String,
    f: F,
}

/// Build a named capability from a closure.
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnCapability<F>
where
    F: Fn(&mut InvokerBuilder) -> Result<(), BoxError> + Send + Sync + 'static,
{
    FnCapability { name: name.into(), f }
}

impl<F> Capability for FnCapability<F>
where
    F: Fn(&mut InvokerBuilder) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, builder: &mut InvokerBuilder) -> Result<(), BoxError> {
        (self.f)(builder)
    }
}

/// Ordered list of capabilities.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    entries: Vec<Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, capability: Arc<dyn Capability>) {
        self.entries.push(capability);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.name()).collect()
    }

    /// Run every hook once, in registration order.
    pub fn apply_all(&self, builder: &mut InvokerBuilder) -> ClientResult<()> {
        for (position, capability) in self.entries.iter().enumerate() {
            tracing::debug!(capability = capability.name(), position, "Applying capability");
            capability.apply(builder).map_err(|source| {
                tracing::error!(capability = capability.name(), position, error = %source, "Capability failed");
                ClientError::Capability {
                    name: capability.name().to_string(),
                    position,
                    source,
                }
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
