//! src/harness/mod.rs
//!
//! This module implements the `Harness`.
//!
//! The `Harness` fans a batch of independent work out to a fixed pool of
//! worker threads and folds their results back into a single total.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────┐
//!                  │   Harness    │ ←───── HarnessConfig (workers, total, seed, ...)
//!                  └──────┬───────┘
//!                         │ builds
//!                         ↓
//!                  ┌──────────────┐
//!                  │ Work Source  │ (1..=N queue, or one partition per worker)
//!                  └──────┬───────┘
//!                         │ items / partition sizes
//!                         ↓
//!                   [Worker Threads] ──── Kernel (item -> u64)
//!                         │
//!                         │ contributions
//!                         ↓
//!                  ┌──────────────┐
//!                  │  Aggregator  │ (atomic add, or result channel + collector)
//!                  └──────┬───────┘
//!                         │ after the completion barrier
//!                         ↓
//!                   ┌────────────┐
//!                   │ RunSummary │
//!                   └────────────┘
//! ```
//!
//! # Module Structure
//!
//! ```text
//! src/harness/
//! ├── mod.rs             # Public API exports + architecture docs
//! ├── config.rs          # HarnessConfig, builder, and validation
//! ├── runner.rs          # Harness, RunSummary
//! ├── aggregator.rs      # AtomicAccumulator, result channel, collector
//! ├── workers/
//! │   ├── mod.rs
//! │   ├── pool.rs        # WorkerPool and its join barrier
//! │   ├── supervisor.rs  # Close-after-wait for the result channel
//! │   ├── stream.rs      # Shared-queue workers, atomic accumulation
//! │   └── partition.rs   # Per-partition workers, collect-then-sum
//! └── common/
//!     ├── mod.rs
//!     └── thread.rs      # Thread-local worker ID and RNG
//! ```
//!
//! # Choosing a strategy
//! - `run_stream`: the kernel's result for one item is a plain count that
//!   can be added in any order (Collatz step counts)
//! - `run_partitioned`: a worker's result only makes sense together with
//!   the exact number of samples it drew (Monte-Carlo hit counts)
//!
//! ## Notes:
//! - `num_workers = 0` uses every available CPU
//! - Set `seed` for reproducible partitioned runs; the result still depends
//!   on the worker count, because each worker draws its own stream
//! - With `RemainderPolicy::Truncate` the mean is computed over
//!   `workers * (total / workers)` items, see `RunSummary::dropped`

mod aggregator;
mod common;
mod config;
mod runner;
mod workers;

// Public re-exports
pub use aggregator::{
    result_channel, AtomicAccumulator, CollectedSum, Partial, PartialCollector, PartialSender,
};
pub use config::{resolve_workers, HarnessConfig, HarnessConfigBuilder, DEFAULT_QUEUE_DEPTH};
pub use runner::{Aggregation, Harness, RunSummary};

pub use common::thread::{
    current_worker_id, init_worker_rng, with_worker_rng, worker_seed, WORKER_ID, WORKER_RNG,
};
