//! Stream variant tests: `1..=N` pulled from a shared queue, atomic accumulation.
//!
//! Tests cover:
//! - Exactly-once delivery of every item across worker counts
//! - Lost-update freedom of the shared accumulator
//! - Determinism of the Collatz total across runs and worker counts
//! - Abort on kernel failure and termination in edge cases

mod common;
use common::{harness, FailOn, RecordingKernel, UnitKernel, WORKER_COUNTS};

use anyhow::Result;
use batch_harness::harness::Aggregation;
use batch_harness::{CollatzSteps, Harness, HarnessConfig, Kernel};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// 1. Concrete scenarios
// ============================================================================

#[test]
fn test_collatz_first_ten_single_and_four_workers() -> Result<()> {
    for workers in [1, 4] {
        let summary = harness(10, workers)?.run_stream(CollatzSteps)?;

        assert_eq!(summary.accumulator, 67, "workers = {}", workers);
        assert_eq!(summary.effective_total, 10);
        assert!((summary.mean() - 6.7).abs() < 1e-12);
        assert_eq!(summary.aggregation, Aggregation::Atomic);
    }
    Ok(())
}

#[test]
fn test_unit_kernel_counts_every_item() -> Result<()> {
    for workers in WORKER_COUNTS {
        let summary = harness(10_000, workers)?.run_stream(UnitKernel)?;
        assert_eq!(summary.accumulator, 10_000, "workers = {}", workers);
        assert_eq!(summary.workers, workers);
    }
    Ok(())
}

// ============================================================================
// 2. Delivery guarantees
// ============================================================================

#[test]
fn test_every_item_delivered_exactly_once() -> Result<()> {
    for workers in [1, 3, 8, 32] {
        let kernel = RecordingKernel::default();
        harness(5_000, workers)?.run_stream(kernel.clone())?;

        let seen = kernel.seen.lock().unwrap();
        assert_eq!(seen.len(), 5_000, "workers = {}", workers);
        let distinct: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(distinct, (1..=5_000).collect::<HashSet<_>>());
    }
    Ok(())
}

#[test]
fn test_work_is_spread_across_workers() -> Result<()> {
    let threads = Arc::new(std::sync::Mutex::new(HashSet::new()));
    let threads_clone = threads.clone();

    harness(400, 4)?.run_stream(move |_: u64| -> Result<u64> {
        threads_clone
            .lock()
            .unwrap()
            .insert(batch_harness::harness::current_worker_id());
        std::thread::sleep(Duration::from_millis(1));
        Ok(1)
    })?;

    let threads = threads.lock().unwrap();
    assert!(threads.iter().all(|id| matches!(id, Some(0..=3))));
    assert!(threads.len() > 1, "only {:?} did any work", threads);
    Ok(())
}

// ============================================================================
// 3. Determinism
// ============================================================================

#[test]
fn test_collatz_total_independent_of_worker_count() -> Result<()> {
    let reference = harness(20_000, 1)?.run_stream(CollatzSteps)?.accumulator;

    for workers in WORKER_COUNTS {
        for _ in 0..2 {
            let total = harness(20_000, workers)?.run_stream(CollatzSteps)?.accumulator;
            assert_eq!(total, reference, "workers = {}", workers);
        }
    }
    Ok(())
}

// ============================================================================
// 4. Failure and termination
// ============================================================================

#[test]
fn test_kernel_failure_aborts_run() -> Result<()> {
    let err = harness(100_000, 4)?.run_stream(FailOn(500)).unwrap_err();
    let msg = format!("{:#}", err);

    assert!(msg.contains("Stream run failed"));
    assert!(msg.contains("failed on item 500"));
    assert!(msg.contains("refusing item 500"));
    Ok(())
}

#[test]
fn test_kernel_failure_stops_other_workers_early() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let result = harness(1_000_000, 4)?.run_stream(move |n: u64| -> Result<u64> {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        FailOn(10).apply(n)
    });

    assert!(result.is_err());
    assert!(
        calls.load(Ordering::SeqCst) < 1_000_000,
        "workers kept going after the failure"
    );
    Ok(())
}

#[test]
fn test_worker_panic_stops_other_workers_early() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let err = harness(1_000_000, 4)?
        .run_stream(move |n: u64| -> Result<u64> {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if n == 10 {
                panic!("kernel bug");
            }
            Ok(1)
        })
        .unwrap_err();

    assert!(format!("{:#}", err).contains("panicked"));
    assert!(
        calls.load(Ordering::SeqCst) < 1_000_000,
        "workers kept going after the panic"
    );
    Ok(())
}

#[test]
fn test_accumulator_overflow_is_an_error() -> Result<()> {
    let err = harness(2, 2)?
        .run_stream(|_: u64| -> Result<u64> { Ok(u64::MAX / 2 + 1) })
        .unwrap_err();

    let msg = format!("{:#}", err);
    assert!(msg.contains("Stream run failed"));
    assert!(msg.contains("Accumulator overflow"));
    Ok(())
}

#[test]
fn test_more_workers_than_items_terminates() -> Result<()> {
    let summary = harness(3, 64)?.run_stream(UnitKernel)?;
    assert_eq!(summary.accumulator, 3);
    Ok(())
}

#[test]
fn test_single_item_queue_depth_one() -> Result<()> {
    let harness = Harness::new(
        HarnessConfig::builder()
            .total_work(1_000)
            .num_workers(2)
            .queue_depth(1)
            .build(),
    )?;
    assert_eq!(harness.run_stream(UnitKernel)?.accumulator, 1_000);
    Ok(())
}

#[test]
fn test_auto_worker_count() -> Result<()> {
    let summary = harness(100, 0)?.run_stream(UnitKernel)?;
    assert_eq!(summary.workers, num_cpus::get().max(1));
    assert_eq!(summary.accumulator, 100);
    Ok(())
}
