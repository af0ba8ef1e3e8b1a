//! src/harness/workers/stream.rs
//!
//! Workers for the stream variant.
//!
//! The run driver feeds `1..=total` into a bounded queue while every worker
//! pulls from it, applies the kernel and adds the result straight into a
//! shared `AtomicAccumulator`.
//!
//! # Architecture
//! - One queue shared by all workers: whichever worker is idle takes the
//!   next item, so uneven kernel costs balance themselves
//! - Queue capacity is `num_workers * queue_depth`; the feeder blocks while
//!   it is full
//! - The accumulator is reclaimed from its `Arc` only after the pool has
//!   joined

use anyhow::{ensure, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::pool::WorkerPool;
use crate::harness::aggregator::AtomicAccumulator;
use crate::kernel::Kernel;
use crate::source::sequence;

/// Runs `kernel` over `1..=total` on `num_workers` threads and returns the
/// accumulated total.
pub(crate) fn run_atomic<K>(
    num_workers: usize,
    total: u64,
    queue_depth: usize,
    poll: Duration,
    kernel: K,
) -> Result<u64>
where
    K: Kernel<u64> + 'static,
{
    let capacity = num_workers
        .checked_mul(queue_depth)
        .context("Stream queue capacity overflows usize")?;
    let (feeder, source) = sequence(total, capacity);
    let accumulator = Arc::new(AtomicAccumulator::new());

    let pool = {
        let accumulator = accumulator.clone();
        WorkerPool::spawn(num_workers, "stream", move |worker_id, shutdown| {
            let mut processed = 0u64;
            while let Some(item) = source.next(shutdown, poll) {
                let value = kernel
                    .apply(item)
                    .with_context(|| format!("Worker {} failed on item {}", worker_id, item))?;
                accumulator
                    .contribute(value)
                    .with_context(|| format!("Worker {} failed on item {}", worker_id, item))?;
                processed += 1;
            }
            debug!(worker_id, processed, "Stream source exhausted");
            Ok(())
        })
        .context("Failed to start stream workers")?
    };

    let feeder_total = feeder.total();
    let fed = feeder.feed(&pool.shutdown, poll);

    // worker errors explain a short feed better than the feed error itself
    pool.join()?;
    let fed = fed?;
    ensure!(
        fed == feeder_total,
        "Stream stopped after {} of {} items without a worker error",
        fed,
        feeder_total
    );

    AtomicAccumulator::reclaim(accumulator)
}
