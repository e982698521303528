//! Dispatch mode markers.

use crate::config::ModeKind;

mod sealed {
    pub trait Sealed {}
}

/// Type-level dispatch mode of a builder or client.
pub trait DispatchMode: sealed::Sealed + Send + Sync + 'static {
    const KIND: ModeKind;
}

/// Calls block the caller until the response arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncMode;

/// Calls return a [`DeferredResult`](crate::dispatch::DeferredResult) immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncMode;

impl sealed::Sealed for SyncMode {}
impl sealed::Sealed for AsyncMode {}

impl DispatchMode for SyncMode {
    const KIND: ModeKind = ModeKind::Sync;
}

impl DispatchMode for AsyncMode {
    const KIND: ModeKind = ModeKind::Async;
}
