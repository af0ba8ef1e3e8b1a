//! src/harness/config.rs
//!
//! Configuration for a harness run
//!
//! The `HarnessConfig` struct stores the parameters that control how work
//! is fanned out to workers.
//!
//! Example:
//! ```ignore
//! let config = HarnessConfig::builder()
//!     .total_work(1_000_000)
//!     .num_workers(4)
//!     .seed(42)
//!     .build();
//! ```
//!
//! # Performance considerations:
//! - `num_workers`: beyond the number of cores, more workers only add
//!   scheduling overhead
//! - `queue_depth`: deeper queues keep stream workers busy when the kernel
//!   cost varies per item, at the price of more buffered items

use anyhow::{ensure, Result};
use std::time::Duration;

use crate::source::RemainderPolicy;

/// Per-worker depth of the stream queue
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// Configuration for Harness
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of parallel workers (0 = number of available CPUs)
    pub num_workers: usize,
    /// Total number of work items (stream) or samples (partition). Must be > 0
    pub total_work: u64,
    /// Stream queue capacity per worker (must be > 0)
    pub queue_depth: usize,
    /// Base seed for the per-worker RNGs. Drawn from the OS when absent
    pub seed: Option<u64>,
    /// What to do with `total_work % num_workers` in the partition variant
    pub remainder: RemainderPolicy,
    /// How often blocked workers and the feeder check for shutdown.
    /// Not a timeout - just a polling interval. Default: 100ms.
    pub poll_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            num_workers: 0,
            total_work: 0,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            seed: None,
            remainder: RemainderPolicy::default(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl HarnessConfig {
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Worker count with `0` replaced by the available parallelism.
    pub fn resolved_workers(&self) -> usize {
        resolve_workers(self.num_workers)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.total_work > 0, "Total work must be greater than 0");
        ensure!(
            self.queue_depth > 0,
            "Queue depth must be > 0 to keep the feeder from blocking forever"
        );
        ensure!(
            !self.poll_interval.is_zero(),
            "Poll interval must be greater than 0"
        );
        Ok(())
    }
}

/// Replaces a worker count of 0 with the number of available CPUs.
pub fn resolve_workers(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}

/// Builder for HarnessConfig with method chaining
#[derive(Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Set the number of workers (0 = available parallelism)
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    /// Set the total number of items or samples
    pub fn total_work(mut self, total: u64) -> Self {
        self.config.total_work = total;
        self
    }

    /// Set the per-worker stream queue depth
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.config.queue_depth = depth;
        self
    }

    /// Set the base seed for reproducible sampling.
    ///
    /// Worker `i` of run `r` is seeded with `seed + (r << 32) + i`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the partition remainder policy
    pub fn remainder(mut self, policy: RemainderPolicy) -> Self {
        self.config.remainder = policy;
        self
    }

    /// Set the shutdown polling interval
    ///
    /// - Too low: more responsive abort, higher CPU usage while idle
    /// - Too high: slower reaction to a failed worker
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}
