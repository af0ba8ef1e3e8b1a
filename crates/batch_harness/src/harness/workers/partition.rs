//! src/harness/workers/partition.rs
//!
//! Workers for the partition variant.
//!
//! Every worker receives exactly one partition size from a `PartitionPlan`,
//! seeds its own RNG, generates its sub-items internally through the kernel
//! and sends a single `Partial` on the result channel.
//!
//! # Fan-in protocol
//! 1. Spawn one worker per partition, each holding a `PartialSender` clone
//! 2. Hand the pool and the remaining sender to a `Supervisor`, which joins
//!    the pool and then drops the sender
//! 3. Drain the channel on the calling thread until it is closed
//! 4. Wait on the supervisor for worker errors

use anyhow::{ensure, Context, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::pool::WorkerPool;
use super::supervisor::Supervisor;
use crate::harness::aggregator::{result_channel, CollectedSum, Partial};
use crate::harness::common::thread::init_worker_rng;
use crate::kernel::Kernel;
use crate::source::PartitionPlan;

/// Runs `kernel` once per partition of `plan` and sums the partials.
///
/// `run` and `base_seed` select the per-worker RNG streams.
pub(crate) fn run_collect<K>(
    plan: &PartitionPlan,
    run: usize,
    base_seed: u64,
    kernel: K,
) -> Result<CollectedSum>
where
    K: Kernel<u64> + 'static,
{
    let num_workers = plan.workers();
    let sizes: Arc<[u64]> = plan.sizes().into();
    let (results, collector) = result_channel(num_workers);

    let pool = {
        let results = results.clone();
        WorkerPool::spawn(num_workers, "partition", move |worker_id, shutdown| {
            init_worker_rng(worker_id, run, base_seed);

            let size = sizes[worker_id];
            if shutdown.load(Ordering::Acquire) {
                return Ok(());
            }

            let value = kernel.apply(size).with_context(|| {
                format!(
                    "Worker {} failed on a partition of {} items",
                    worker_id, size
                )
            })?;
            results.send(Partial {
                worker_id,
                size,
                value,
            })
        })
        .context("Failed to start partition workers")?
    };

    let supervisor = Supervisor::close_on_completion(pool, results)?;
    let collected = collector.collect();
    supervisor.wait()?;
    let collected = collected?;

    ensure!(
        collected.partials == num_workers,
        "Collected {} partial results from {} workers",
        collected.partials,
        num_workers
    );
    ensure!(
        collected.denominator == plan.effective_total(),
        "Partials cover {} items but the plan covers {}",
        collected.denominator,
        plan.effective_total()
    );

    Ok(collected)
}
