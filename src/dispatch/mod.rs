//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Sync mode:
//!     Client::execute → Dispatcher::call → Driver::block_on(call)   (caller's thread)
//!
//! Async mode:
//!     Client::execute → Dispatcher::submit
//!         → TaskExecutor::execute(task)       (exactly once per call)
//!         → task: Driver::block_on(call) → oneshot
//!           (on a runtime thread: spawned onto that runtime instead)
//!     ← DeferredResult (returned immediately)
//! ```
//!
//! # Design Decisions
//! - Mode is a type parameter, so sync and async clients expose different `execute` signatures
//! - Every call is a synchronous operation; async mode only moves it to another thread
//! - No I/O or thread creation happens until the first call

pub mod deferred;
pub mod driver;
pub mod executor;
pub mod mode;

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::error::ClientResult;

pub use deferred::DeferredResult;
pub use driver::Driver;
pub use executor::{Task, TaskExecutor, WorkerPool};
pub use mode::{AsyncMode, DispatchMode, SyncMode};

/// How a client runs its calls.
pub enum Dispatcher {
    /// Block the calling thread.
    Inline { driver: Arc<Driver> },
    /// Hand each call to the internal worker pool.
    Pool { driver: Arc<Driver>, pool: Arc<WorkerPool> },
    /// Hand each call to a caller-supplied executor.
    Executor {
        driver: Arc<Driver>,
        executor: Arc<dyn TaskExecutor>,
    },
}

impl Dispatcher {
    pub fn inline(driver: Driver) -> Self {
        Dispatcher::Inline {
            driver: Arc::new(driver),
        }
    }

    pub fn pool(driver: Driver, pool: WorkerPool) -> Self {
        Dispatcher::Pool {
            driver: Arc::new(driver),
            pool: Arc::new(pool),
        }
    }

    pub fn executor(driver: Driver, executor: Arc<dyn TaskExecutor>) -> Self {
        Dispatcher::Executor {
            driver: Arc::new(driver),
            executor,
        }
    }

    fn driver(&self) -> &Arc<Driver> {
        match self {
            Dispatcher::Inline { driver }
            | Dispatcher::Pool { driver, .. }
            | Dispatcher::Executor { driver, .. } => driver,
        }
    }

    /// Run the call on the current thread and return its outcome.
    pub fn call<F, T>(&self, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        self.driver().block_on(call)
    }

    /// Submit the call and return a handle to its outcome.
    pub fn submit<F, T>(&self, call: F) -> DeferredResult<T>
    where
        F: Future<Output = ClientResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let driver = self.driver().clone();

        match self {
            Dispatcher::Inline { .. } => {
                let _ = tx.send(driver.block_on(call));
            }
            Dispatcher::Pool { pool, .. } => pool.execute(Box::new(move || {
                let _ = tx.send(driver.block_on(call));
            })),
            Dispatcher::Executor { executor, .. } => executor.execute(Box::new(move || {
                run_anywhere(&driver, call, tx);
            })),
        }
        DeferredResult::new(rx)
    }
}

/// Run a call handed out to a caller-supplied executor.
///
/// Such executors may run the task on a thread that is driving an async
/// runtime, where blocking on the driver would panic. The call is then
/// spawned onto that runtime and completes when the runtime polls it.
fn run_anywhere<F, T>(driver: &Driver, call: F, tx: oneshot::Sender<ClientResult<T>>)
where
    F: Future<Output = ClientResult<T>> + Send + 'static,
    T: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                let _ = tx.send(call.await);
            });
        }
        Err(_) => {
            let _ = tx.send(driver.block_on(call));
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatcher::Inline { .. } => f.write_str("Dispatcher::Inline"),
            Dispatcher::Pool { pool, .. } => f
                .debug_struct("Dispatcher::Pool")
                .field("max_threads", &pool.max_threads())
                .finish(),
            Dispatcher::Executor { executor, .. } => f
                .debug_struct("Dispatcher::Executor")
                .field("shutdown", &executor.is_shutdown())
                .finish(),
        }
    }
}
