//! Worker pool implementation for the harness.
//!
//! Spawns a fixed number of named threads running the same worker function
//! and provides the completion barrier (`join`) the run driver waits on.
//!
//! # Key features
//! - Every thread knows its worker ID through the `WORKER_ID` thread-local
//! - A failing or panicking worker raises the shared shutdown flag so the
//!   rest of the pool and the feeder stop early
//! - Graceful shutdown on drop

use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

use crate::harness::common::thread::set_worker_id;

/// Fixed-size pool of worker threads.
///
/// Each worker runs `worker_fn(worker_id, &shutdown)` exactly once and
/// reports its outcome through its join handle.
pub(crate) struct WorkerPool {
    pub(crate) workers: Vec<thread::JoinHandle<Result<()>>>,
    pub(crate) shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawns `num_workers` threads named `<role>-worker-<id>`.
    pub(crate) fn spawn<F>(num_workers: usize, role: &str, worker_fn: F) -> Result<Self>
    where
        F: Fn(usize, &AtomicBool) -> Result<()> + Send + Sync + 'static,
    {
        if num_workers == 0 {
            return Err(anyhow!(
                "Cannot create WorkerPool with 0 workers. \
                Resolve the worker count before spawning."
            ));
        }

        let worker_fn = Arc::new(worker_fn);
        let mut pool = Self {
            workers: Vec::with_capacity(num_workers),
            shutdown: Arc::new(AtomicBool::new(false)),
        };

        for worker_id in 0..num_workers {
            let shutdown = pool.shutdown.clone();
            let worker_fn = worker_fn.clone();

            // on error, `pool` is dropped here and joins the threads spawned so far
            let handle = thread::Builder::new()
                .name(format!("{}-worker-{}", role, worker_id))
                .spawn(move || {
                    set_worker_id(worker_id);
                    let _guard = ShutdownOnPanic(&shutdown);

                    let result = worker_fn(worker_id, &shutdown);
                    match &result {
                        Ok(()) => debug!(worker_id, "Worker finished"),
                        Err(e) => {
                            error!(worker_id, error = %e, "Worker aborted");
                            shutdown.store(true, Ordering::Release);
                        }
                    }
                    result
                })
                .with_context(|| format!("Failed to spawn worker thread {}", worker_id))?;

            pool.workers.push(handle);
        }

        Ok(pool)
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    /// Blocks until every worker has terminated.
    ///
    /// Returns the first worker error (or panic) in worker-ID order. All
    /// workers are joined even when one of them failed.
    pub(crate) fn join(mut self) -> Result<()> {
        let mut first_error = None;

        for (worker_id, handle) in self.workers.drain(..).enumerate() {
            let outcome = handle
                .join()
                .unwrap_or_else(|_| Err(anyhow!("Worker {} panicked", worker_id)));

            if let Err(e) = outcome {
                self.shutdown.store(true, Ordering::Release);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Raises the shutdown flag when a worker unwinds.
struct ShutdownOnPanic<'a>(&'a AtomicBool);

impl Drop for ShutdownOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Worker panicked");
            self.0.store(true, Ordering::Release);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        // Signal shutdown to all workers
        self.shutdown.store(true, Ordering::Release);

        // Wait for workers to finish
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
