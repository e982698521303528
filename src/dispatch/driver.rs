//! Per-client I/O driver.
//!
//! A current-thread Tokio runtime that runs a call to completion on whichever
//! thread asks for it: the caller in sync mode, a worker in async mode.

use std::future::Future;

use tokio::runtime::{Builder, Runtime};

use crate::error::{ClientError, ClientResult};

#[derive(Debug)]
pub struct Driver {
    runtime: Option<Runtime>,
}

impl Driver {
    /// Create the driver. Starts no threads.
    pub fn new() -> ClientResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientError::Runtime)?;
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    /// Run `future` to completion on the current thread.
    ///
    /// Panics if called from within an async runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime
            .as_ref()
            .expect("driver runtime present until drop")
            .block_on(future)
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        // The last client handle may be dropped inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
