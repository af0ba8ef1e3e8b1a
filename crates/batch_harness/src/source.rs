use anyhow::{anyhow, ensure, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// ============================================================================
/// Stream variant: the integers `1..=total`, each delivered to exactly one
/// worker through a bounded multi-consumer queue.
///
/// Built as a pair:
/// - `SequenceFeeder`: producer side, owned by the run driver
/// - `StreamSource`: consumer side, shared by reference between workers
///
/// The queue is closed when the feeder finishes (or is dropped), which is
/// how workers learn the source is exhausted.
///
/// # Examples
/// ```ignore
/// let (feeder, source) = sequence(3, 4);
/// let shutdown = AtomicBool::new(false);
/// feeder.feed(&shutdown, Duration::from_millis(100))?;
/// assert_eq!(source.next(&shutdown, Duration::from_millis(100)), Some(1));
/// ```
pub fn sequence(total: u64, capacity: usize) -> (SequenceFeeder, StreamSource) {
    let (tx, rx) = bounded(capacity);
    (SequenceFeeder { tx, total }, StreamSource { rx })
}

/// Producer half of the stream variant.
#[derive(Debug)]
pub struct SequenceFeeder {
    tx: Sender<u64>,
    total: u64,
}

impl SequenceFeeder {
    /// Pushes `1..=total` into the queue, then closes it.
    ///
    /// Blocks while the queue is full. Every `poll` the shutdown flag is
    /// checked; once raised, feeding stops and the number of items pushed so
    /// far is returned. Fails if every consumer disconnected before the
    /// sequence was exhausted.
    pub fn feed(self, shutdown: &AtomicBool, poll: Duration) -> Result<u64> {
        let mut fed = 0;

        for item in 1..=self.total {
            let mut pending = item;
            loop {
                if shutdown.load(Ordering::Acquire) {
                    return Ok(fed);
                }
                match self.tx.send_timeout(pending, poll) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Timeout(item)) => pending = item,
                    Err(SendTimeoutError::Disconnected(_)) => {
                        return Err(anyhow!(
                            "All workers disconnected after {} of {} items",
                            fed,
                            self.total
                        ));
                    }
                }
            }
            fed += 1;
        }

        Ok(fed)
    }

    /// Number of items an uninterrupted `feed` pushes.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Consumer half of the stream variant.
///
/// `Sync`: all workers pull from the same source concurrently.
#[derive(Debug, Clone)]
pub struct StreamSource {
    rx: Receiver<u64>,
}

impl StreamSource {
    /// Returns the next item, or `None` once the source is exhausted.
    ///
    /// Waits in slices of `poll` so a raised shutdown flag is observed even
    /// while the feeder is still alive. After shutdown no further items are
    /// handed out.
    pub fn next(&self, shutdown: &AtomicBool, poll: Duration) -> Option<u64> {
        loop {
            if shutdown.load(Ordering::Acquire) {
                return None;
            }
            match self.rx.recv_timeout(poll) {
                Ok(item) => return Some(item),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

/// ============================================================================
/// How the remainder of `total / workers` is treated when partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Every partition gets `total / workers` items; the remainder is not
    /// processed at all. Effective total is `workers * (total / workers)`.
    #[default]
    Truncate,

    /// The last partition also takes `total % workers`, so the effective
    /// total equals the requested total.
    Redistribute,
}

/// Partition variant: one pre-computed partition size per worker.
///
/// Each worker receives exactly one entry and generates its own sub-items
/// internally. Downstream rates must be computed against
/// [`PartitionPlan::effective_total`], never the requested total.
///
/// # Examples
/// ```ignore
/// let plan = PartitionPlan::new(10, 4, RemainderPolicy::Truncate)?;
/// assert_eq!(plan.sizes(), &[2, 2, 2, 2]);
/// assert_eq!(plan.effective_total(), 8);
/// assert_eq!(plan.dropped(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    sizes: Vec<u64>,
    requested: u64,
    policy: RemainderPolicy,
}

impl PartitionPlan {
    pub fn new(total: u64, workers: usize, policy: RemainderPolicy) -> Result<Self> {
        ensure!(workers > 0, "Cannot partition work across 0 workers");

        let base = total / workers as u64;
        let remainder = total % workers as u64;

        let mut sizes = vec![base; workers];
        if policy == RemainderPolicy::Redistribute {
            if let Some(last) = sizes.last_mut() {
                *last += remainder;
            }
        }

        let plan = Self {
            sizes,
            requested: total,
            policy,
        };

        ensure!(
            plan.effective_total() > 0,
            "Partitioning {} items across {} workers with {:?} leaves every partition empty",
            total,
            workers,
            policy
        );

        Ok(plan)
    }

    /// Partition size per worker, indexed by worker ID
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn workers(&self) -> usize {
        self.sizes.len()
    }

    pub fn requested_total(&self) -> u64 {
        self.requested
    }

    /// Number of items that will actually be processed
    pub fn effective_total(&self) -> u64 {
        self.sizes.iter().sum()
    }

    /// Number of requested items no partition covers
    pub fn dropped(&self) -> u64 {
        self.requested - self.effective_total()
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }
}
