//! Executors that run deferred calls.
//!
//! # Responsibilities
//! - Define the executor seam callers can plug in
//! - Provide the default worker pool used in async mode
//!
//! # Design Decisions
//! - The seam is minimal: one submission method, lifecycle queries default to "running"
//! - The default pool is created lazily on the first call, so building a client spawns nothing
//! - Caller-supplied executors are never shut down by the client

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

/// Unit of work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted tasks, usually on other threads.
///
/// Dropping a task without running it is allowed; the pending call then
/// fails with [`ClientError::ExecutorDropped`](crate::error::ClientError::ExecutorDropped).
pub trait TaskExecutor: Send + Sync + 'static {
    fn execute(&self, task: Task);

    fn is_shutdown(&self) -> bool {
        false
    }

    fn is_terminated(&self) -> bool {
        false
    }

    /// Wait up to `timeout` for termination. Returns true if terminated.
    fn await_termination(&self, _timeout: Duration) -> bool {
        false
    }
}

impl<E: TaskExecutor + ?Sized> TaskExecutor for Arc<E> {
    fn execute(&self, task: Task) {
        (**self).execute(task)
    }

    fn is_shutdown(&self) -> bool {
        (**self).is_shutdown()
    }

    fn is_terminated(&self) -> bool {
        (**self).is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        (**self).await_termination(timeout)
    }
}

/// Default executor: a bounded pool of blocking threads.
#[derive(Debug)]
pub struct WorkerPool {
    max_threads: usize,
    runtime: OnceLock<Option<Runtime>>,
}

impl WorkerPool {
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads: max_threads.max(1),
            runtime: OnceLock::new(),
        }
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Whether any task has been submitted yet.
    pub fn is_started(&self) -> bool {
        self.runtime.get().is_some()
    }

    fn runtime(&self) -> Option<&Runtime> {
        self.runtime
            .get_or_init(|| {
                let built = Builder::new_multi_thread()
                    .worker_threads(1)
                    .max_blocking_threads(self.max_threads)
                    .thread_name("graphql-client-worker")
                    .build();
                match built {
                    Ok(runtime) => {
                        tracing::debug!(max_threads = self.max_threads, "Worker pool started");
                        Some(runtime)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to start worker pool");
                        None
                    }
                }
            })
            .as_ref()
    }
}

impl TaskExecutor for WorkerPool {
    fn execute(&self, task: Task) {
        match self.runtime() {
            Some(runtime) => {
                runtime.spawn_blocking(task);
            }
            None => {
                tracing::warn!("Worker pool unavailable, dropping task");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(Some(runtime)) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
