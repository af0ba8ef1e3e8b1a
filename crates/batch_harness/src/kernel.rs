use anyhow::{anyhow, Result};
use rand::Rng;

use crate::harness::with_worker_rng;

/// The per-item computation plugged into the harness.
///
/// A `Kernel<In>` maps one work item (a sequence member, or the size of a
/// partition) to a `u64` contribution. Kernels are shared by reference
/// across every worker thread, so they must be `Send + Sync` and must not
/// rely on interior state for correctness.
///
/// Returning `Err` aborts the calling worker. The contribution for that
/// item is never applied to the accumulator.
///
/// Any `Fn(In) -> Result<u64> + Send + Sync` closure is a kernel:
/// ```ignore
/// let unit = |_: u64| -> anyhow::Result<u64> { Ok(1) };
/// let summary = harness.run_stream(unit)?;
/// ```
pub trait Kernel<In>: Send + Sync {
    /// Computes the contribution of a single input
    fn apply(&self, input: In) -> Result<u64>;
}

impl<In, F> Kernel<In> for F
where
    F: Fn(In) -> Result<u64> + Send + Sync,
{
    #[inline]
    fn apply(&self, input: In) -> Result<u64> {
        self(input)
    }
}

/// Number of `n -> n/2` / `n -> 3n+1` steps needed to reach 1.
///
/// Returns `None` if an intermediate value does not fit in a `u64`.
/// `0` and `1` take no steps.
pub fn collatz_steps(mut n: u64) -> Option<u64> {
    let mut steps = 0;
    while n > 1 {
        n = if n % 2 == 0 {
            n / 2
        } else {
            n.checked_mul(3)?.checked_add(1)?
        };
        steps += 1;
    }
    Some(steps)
}

/// Stream kernel: Collatz step count of each sequence member.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollatzSteps;

impl Kernel<u64> for CollatzSteps {
    fn apply(&self, n: u64) -> Result<u64> {
        collatz_steps(n).ok_or_else(|| anyhow!("Collatz trajectory of {} overflows u64", n))
    }
}

/// Partition kernel: Monte-Carlo sampling of the unit quarter-circle.
///
/// For a partition of `points` samples, draws that many points uniformly
/// from `[0, 1) x [0, 1)` using the calling worker's RNG and returns how
/// many fall inside `x^2 + y^2 <= 1`. Multiplying the overall inside ratio
/// by 4 estimates pi.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCircle;

impl Kernel<u64> for UnitCircle {
    fn apply(&self, points: u64) -> Result<u64> {
        Ok(with_worker_rng(|rng| count_inside(rng, points)))
    }
}

fn count_inside<R: Rng + ?Sized>(rng: &mut R, points: u64) -> u64 {
    let mut inside = 0;
    for _ in 0..points {
        let x: f64 = rng.random();
        let y: f64 = rng.random();
        if x * x + y * y <= 1.0 {
            inside += 1;
        }
    }
    inside
}
