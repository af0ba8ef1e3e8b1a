//! Worker management for the two aggregation strategies.
//!
//! - `pool`: fixed-size thread pool and its join barrier
//! - `supervisor`: close-after-wait signal for channel fan-in
//! - `stream`: workers pulling `1..=N` from a shared queue, atomic accumulation
//! - `partition`: one pre-sized partition per worker, collect-then-sum

pub(crate) mod partition;
pub(crate) mod pool;
pub(crate) mod stream;
pub(crate) mod supervisor;
