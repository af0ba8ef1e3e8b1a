//! Close-after-wait completion signal for channel fan-in.
//!
//! The collector reads the result channel until it is closed. A channel
//! closes when its last sender is dropped, so the `Supervisor` holds one
//! sender (the "closer") on a dedicated thread, waits on the pool's join
//! barrier, and only then drops the closer. The collector therefore never
//! sees end-of-stream before every worker has terminated.

use anyhow::{anyhow, Context, Result};
use std::thread;
use tracing::debug;

use super::pool::WorkerPool;

pub(crate) struct Supervisor {
    handle: thread::JoinHandle<Result<()>>,
}

impl Supervisor {
    /// Moves `pool` and `closer` onto a supervisor thread that joins the
    /// pool and then drops `closer`.
    pub(crate) fn close_on_completion<T>(pool: WorkerPool, closer: T) -> Result<Self>
    where
        T: Send + 'static,
    {
        let workers = pool.len();
        let handle = thread::Builder::new()
            .name("harness-supervisor".to_string())
            .spawn(move || {
                let joined = pool.join();
                drop(closer);
                debug!(workers, "All workers joined, result channel closed");
                joined
            })
            .context("Failed to spawn supervisor thread")?;

        Ok(Self { handle })
    }

    /// Waits for the supervisor and returns the pool's join result.
    pub(crate) fn wait(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|_| anyhow!("Supervisor thread panicked"))?
    }
}
