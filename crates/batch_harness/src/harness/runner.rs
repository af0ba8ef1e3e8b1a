//! src/harness/runner.rs
//!
//! The run driver.
//!
//! `Harness` resolves the configuration once (worker count, base seed) and
//! then executes single-shot runs:
//!
//! - `run_stream()` - integers `1..=total_work` pulled from a shared queue,
//!   atomic accumulation
//! - `run_partitioned()` - one partition per worker, collect-then-sum
//! - `sweep_partitioned()` - the partition variant once per worker count
//!
//! Every run blocks until the completion barrier has been crossed and only
//! then reads the aggregate. Nothing is retried.
//!
//! # Seed coordination
//!
//! Worker `i` of run `r` draws from `StdRng::seed_from_u64(seed + (r << 32) + i)`.
//! Without a configured seed, a base seed is drawn once from the OS-seeded
//! thread RNG when the harness is built, so all runs of one harness share it.

use anyhow::{Context, Result};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::config::{resolve_workers, HarnessConfig};
use super::workers::{partition, stream};
use crate::kernel::Kernel;
use crate::source::PartitionPlan;

/// Which aggregation strategy produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Shared counter under atomic add
    Atomic,
    /// One partial per worker, summed by a single collector
    Collected,
}

/// Outcome of one run, handed out only after the completion barrier.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub aggregation: Aggregation,
    pub workers: usize,
    /// Total work asked for in the configuration
    pub requested_total: u64,
    /// Items actually processed (smaller than requested after truncation)
    pub effective_total: u64,
    /// Final accumulator value
    pub accumulator: u64,
    /// Wall-clock time from pool start to the barrier
    pub elapsed: Duration,
}

impl RunSummary {
    /// Accumulator per processed item.
    pub fn mean(&self) -> f64 {
        self.accumulator as f64 / self.effective_total as f64
    }

    /// Requested items no worker processed.
    pub fn dropped(&self) -> u64 {
        self.requested_total - self.effective_total
    }

    /// Pi estimate for a run of the `UnitCircle` kernel.
    pub fn pi_estimate(&self) -> f64 {
        4.0 * self.mean()
    }
}

/// Single-shot batch executor over a resolved configuration.
///
/// # Example
/// ```ignore
/// let config = HarnessConfig::builder()
///     .total_work(10_000_000)
///     .build();
/// let harness = Harness::new(config)?;
/// let summary = harness.run_stream(CollatzSteps)?;
/// println!("average steps: {:.6}", summary.mean());
/// ```
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
    workers: usize,
    seed: u64,
}

impl Harness {
    /// Validates `config` and resolves the worker count and base seed.
    ///
    /// # Errors
    /// - `total_work` is 0
    /// - `queue_depth` or `poll_interval` is 0
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate().context("Invalid harness configuration")?;

        let workers = config.resolved_workers();
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());

        Ok(Self {
            config,
            workers,
            seed,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Resolved worker count (never 0)
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Base seed shared by all runs of this harness
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs `kernel` over every integer in `1..=total_work` using the atomic
    /// accumulation strategy.
    pub fn run_stream<K>(&self, kernel: K) -> Result<RunSummary>
    where
        K: Kernel<u64> + 'static,
    {
        let total = self.config.total_work;
        info!(total, workers = self.workers, "Starting stream run");

        let start = Instant::now();
        let accumulator = stream::run_atomic(
            self.workers,
            total,
            self.config.queue_depth,
            self.config.poll_interval,
            kernel,
        )
        .context("Stream run failed")?;
        let elapsed = start.elapsed();

        let summary = RunSummary {
            aggregation: Aggregation::Atomic,
            workers: self.workers,
            requested_total: total,
            effective_total: total,
            accumulator,
            elapsed,
        };
        info!(accumulator, ?elapsed, "Stream run finished");
        Ok(summary)
    }

    /// Splits `total_work` into one partition per worker and runs `kernel`
    /// once per partition using the collect-then-sum strategy.
    pub fn run_partitioned<K>(&self, kernel: K) -> Result<RunSummary>
    where
        K: Kernel<u64> + 'static,
    {
        self.run_partitioned_with(self.workers, 0, kernel)
    }

    /// Runs the partition variant once per entry of `worker_counts`.
    ///
    /// Entry `r` uses run index `r` for seeding, so runs never replay each
    /// other's random streams. A worker count of 0 means available
    /// parallelism.
    pub fn sweep_partitioned<K>(&self, worker_counts: &[usize], kernel: K) -> Result<Vec<RunSummary>>
    where
        K: Kernel<u64> + Clone + 'static,
    {
        worker_counts
            .iter()
            .enumerate()
            .map(|(run, &workers)| {
                self.run_partitioned_with(resolve_workers(workers), run, kernel.clone())
                    .with_context(|| format!("Sweep run {} with {} workers failed", run, workers))
            })
            .collect()
    }

    fn run_partitioned_with<K>(&self, workers: usize, run: usize, kernel: K) -> Result<RunSummary>
    where
        K: Kernel<u64> + 'static,
    {
        let total = self.config.total_work;
        let plan = PartitionPlan::new(total, workers, self.config.remainder)
            .context("Failed to partition work")?;

        if plan.dropped() > 0 {
            warn!(
                requested = total,
                effective = plan.effective_total(),
                dropped = plan.dropped(),
                "Work does not divide evenly across workers; remainder is not processed"
            );
        }
        info!(
            total,
            workers,
            run,
            partition = plan.sizes()[0],
            "Starting partitioned run"
        );

        let start = Instant::now();
        let collected = partition::run_collect(&plan, run, self.seed, kernel)
            .context("Partitioned run failed")?;
        let elapsed = start.elapsed();

        let summary = RunSummary {
            aggregation: Aggregation::Collected,
            workers,
            requested_total: total,
            effective_total: collected.denominator,
            accumulator: collected.sum,
            elapsed,
        };
        info!(accumulator = summary.accumulator, ?elapsed, "Partitioned run finished");
        Ok(summary)
    }
}
