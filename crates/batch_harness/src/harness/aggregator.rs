//! src/harness/aggregator.rs
//!
//! The two ways partial results are folded into one total.
//!
//! - **Atomic accumulation** (`AtomicAccumulator`): every worker adds each
//!   contribution straight into a shared counter. Used when contributions
//!   are plain scalars that can be summed in any order.
//! - **Collect-then-sum** (`result_channel`): every worker sends one
//!   `Partial` carrying both its value and the partition size it was
//!   computed against. A single collector drains the channel once it is
//!   closed and sums both, so value and denominator always stay paired.
//!
//! In both cases the total is read exactly once, after the pool has joined.

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared counter for the atomic-accumulation strategy.
#[derive(Debug, Default)]
pub struct AtomicAccumulator {
    total: AtomicU64,
}

impl AtomicAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one contribution. Safe for any number of concurrent callers.
    ///
    /// Fails without touching the total if the sum would exceed `u64::MAX`.
    #[inline]
    pub fn contribute(&self, value: u64) -> Result<()> {
        // ordering is provided by the join barrier, not by the counter
        self.total
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                total.checked_add(value)
            })
            .map(|_| ())
            .map_err(|total| {
                anyhow!(
                    "Accumulator overflow: {} + {} exceeds u64::MAX",
                    total,
                    value
                )
            })
    }

    /// Consumes the accumulator and returns the total.
    pub fn into_total(self) -> u64 {
        self.total.into_inner()
    }

    /// Reclaims sole ownership after every worker has released its handle.
    ///
    /// Fails if a clone of the `Arc` is still alive, i.e. a worker could
    /// still be writing.
    pub fn reclaim(shared: Arc<Self>) -> Result<u64> {
        Arc::try_unwrap(shared)
            .map(Self::into_total)
            .map_err(|shared| {
                anyhow!(
                    "Accumulator still shared by {} handles after the completion barrier",
                    Arc::strong_count(&shared) - 1
                )
            })
    }
}

/// One worker's contribution under the collect-then-sum strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partial {
    pub worker_id: usize,
    /// Partition size the value was computed against
    pub size: u64,
    pub value: u64,
}

/// Everything the collector drained from a closed result channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectedSum {
    pub sum: u64,
    /// Sum of the partition sizes behind `sum`
    pub denominator: u64,
    /// Number of partials received
    pub partials: usize,
}

/// Creates the result channel for `capacity` partials.
pub fn result_channel(capacity: usize) -> (PartialSender, PartialCollector) {
    let (tx, rx) = bounded(capacity);
    (PartialSender { tx }, PartialCollector { rx })
}

/// Sending half of the result channel. The channel closes once every clone
/// has been dropped.
#[derive(Debug, Clone)]
pub struct PartialSender {
    tx: Sender<Partial>,
}

impl PartialSender {
    pub fn send(&self, partial: Partial) -> Result<()> {
        self.tx.send(partial).map_err(|_| {
            anyhow!(
                "Result channel closed before worker {} could report",
                partial.worker_id
            )
        })
    }
}

/// Receiving half of the result channel, owned by the single collector.
#[derive(Debug)]
pub struct PartialCollector {
    rx: Receiver<Partial>,
}

impl PartialCollector {
    /// Drains the channel until it is closed and sums what arrived.
    ///
    /// Blocks until every `PartialSender` clone has been dropped. Fails if
    /// the values or the partition sizes sum past `u64::MAX`; the channel is
    /// still drained so no sender stays blocked.
    pub fn collect(self) -> Result<CollectedSum> {
        let mut collected = CollectedSum::default();
        let mut overflow = None;
        for partial in self.rx.iter() {
            debug!(
                worker_id = partial.worker_id,
                size = partial.size,
                value = partial.value,
                "Collected partial result"
            );
            collected.partials += 1;
            if overflow.is_some() {
                continue;
            }
            match (
                collected.sum.checked_add(partial.value),
                collected.denominator.checked_add(partial.size),
            ) {
                (Some(sum), Some(denominator)) => {
                    collected.sum = sum;
                    collected.denominator = denominator;
                }
                _ => overflow = Some(partial.worker_id),
            }
        }

        match overflow {
            Some(worker_id) => Err(anyhow!(
                "Collected sum overflows u64 at the partial of worker {}",
                worker_id
            )),
            None => Ok(collected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    mod atomic_tests {
        use super::*;

        #[test]
        fn concurrent_contributions_are_not_lost() -> Result<()> {
            let accumulator = Arc::new(AtomicAccumulator::new());

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let accumulator = accumulator.clone();
                    thread::spawn(move || {
                        for _ in 0..10_000 {
                            accumulator.contribute(1).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(AtomicAccumulator::reclaim(accumulator)?, 80_000);
            Ok(())
        }

        #[test]
        fn reclaim_fails_while_shared() {
            let accumulator = Arc::new(AtomicAccumulator::new());
            let _writer = accumulator.clone();

            let err = AtomicAccumulator::reclaim(accumulator).unwrap_err();
            assert!(err.to_string().contains("still shared by 1"));
        }

        #[test]
        fn starts_at_zero() {
            assert_eq!(AtomicAccumulator::new().into_total(), 0);
        }

        #[test]
        fn overflow_is_an_error_and_keeps_the_total() -> Result<()> {
            let accumulator = AtomicAccumulator::new();
            accumulator.contribute(u64::MAX / 2 + 1)?;

            let err = accumulator.contribute(u64::MAX / 2 + 1).unwrap_err();
            assert!(err.to_string().contains("overflow"));
            assert_eq!(accumulator.into_total(), u64::MAX / 2 + 1);
            Ok(())
        }
    }

    mod collect_tests {
        use super::*;

        #[test]
        fn sums_values_and_denominators() -> Result<()> {
            let (tx, collector) = result_channel(3);
            for worker_id in 0..3 {
                tx.send(Partial {
                    worker_id,
                    size: 10,
                    value: worker_id as u64 + 1,
                })?;
            }
            drop(tx);

            let collected = collector.collect()?;
            assert_eq!(
                collected,
                CollectedSum {
                    sum: 6,
                    denominator: 30,
                    partials: 3
                }
            );
            Ok(())
        }

        #[test]
        fn collect_waits_for_every_sender() {
            let (tx, collector) = result_channel(1);

            let senders: Vec<_> = (0..16)
                .map(|worker_id| {
                    let tx = tx.clone();
                    thread::spawn(move || {
                        tx.send(Partial {
                            worker_id,
                            size: 1,
                            value: 2,
                        })
                    })
                })
                .collect();
            drop(tx);

            // capacity 1: senders block until the collector drains
            let collected = collector.collect().unwrap();
            for sender in senders {
                sender.join().unwrap().unwrap();
            }
            assert_eq!(collected.partials, 16);
            assert_eq!(collected.sum, 32);
        }

        #[test]
        fn overflowing_values_are_an_error() -> Result<()> {
            let (tx, collector) = result_channel(3);
            for worker_id in 0..3 {
                tx.send(Partial {
                    worker_id,
                    size: 1,
                    value: u64::MAX / 2 + 1,
                })?;
            }
            drop(tx);

            let err = collector.collect().unwrap_err();
            assert!(err.to_string().contains("overflows u64"));
            assert!(err.to_string().contains("worker 1"));
            Ok(())
        }

        #[test]
        fn send_fails_without_collector() {
            let (tx, collector) = result_channel(1);
            drop(collector);

            let err = tx
                .send(Partial {
                    worker_id: 4,
                    size: 1,
                    value: 1,
                })
                .unwrap_err();
            assert!(err.to_string().contains("worker 4"));
        }
    }
}
