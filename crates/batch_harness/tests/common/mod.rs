#![allow(dead_code)]

use anyhow::{anyhow, Result};
use batch_harness::{Harness, HarnessConfig, Kernel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_SEED: u64 = 42;

/// Worker counts swept by the concurrency tests
pub const WORKER_COUNTS: [usize; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Builds a seeded harness with a short poll interval.
pub fn harness(total: u64, workers: usize) -> Result<Harness> {
    Harness::new(
        HarnessConfig::builder()
            .total_work(total)
            .num_workers(workers)
            .seed(TEST_SEED)
            .poll_interval(Duration::from_millis(5))
            .build(),
    )
}

/// Contributes 1 per item.
#[derive(Clone, Copy)]
pub struct UnitKernel;
impl Kernel<u64> for UnitKernel {
    fn apply(&self, _: u64) -> Result<u64> {
        Ok(1)
    }
}

/// Records every item it sees, contributes nothing.
#[derive(Clone, Default)]
pub struct RecordingKernel {
    pub seen: Arc<Mutex<Vec<u64>>>,
}
impl Kernel<u64> for RecordingKernel {
    fn apply(&self, item: u64) -> Result<u64> {
        self.seen.lock().unwrap().push(item);
        Ok(0)
    }
}

/// Fails on one specific item.
#[derive(Clone, Copy)]
pub struct FailOn(pub u64);
impl Kernel<u64> for FailOn {
    fn apply(&self, item: u64) -> Result<u64> {
        if item == self.0 {
            Err(anyhow!("refusing item {}", item))
        } else {
            Ok(1)
        }
    }
}
