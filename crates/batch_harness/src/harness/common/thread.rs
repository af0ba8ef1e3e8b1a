//! Thread-local worker state.
//!
//! Every pool thread records its worker ID, and partition workers own a
//! private RNG. Nothing here is shared between threads.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;

thread_local! {
    /// Thread-local worker ID.
    ///
    /// Each worker thread is assigned a unique ID (0 to num_workers-1) when
    /// spawned. Used for partition assignment, seeding and error messages.
    pub static WORKER_ID: RefCell<Option<usize>> = const { RefCell::new(None) };

    /// Thread-local RNG, one independent generator per worker
    pub static WORKER_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// ID of the calling worker, or `None` outside a pool thread.
pub fn current_worker_id() -> Option<usize> {
    WORKER_ID.with(|id| *id.borrow())
}

pub(crate) fn set_worker_id(worker_id: usize) {
    WORKER_ID.with(|id| *id.borrow_mut() = Some(worker_id));
}

/// Derives the seed of one worker's generator.
/// Seed formula: base_seed + (run << 32) + worker_id
pub fn worker_seed(worker_id: usize, run: usize, base_seed: u64) -> u64 {
    base_seed
        .wrapping_add((run as u64) << 32)
        .wrapping_add(worker_id as u64)
}

/// Initialize the calling worker's RNG from worker_id, run index and base seed.
pub fn init_worker_rng(worker_id: usize, run: usize, base_seed: u64) {
    WORKER_RNG.with(|rng| {
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(worker_seed(
            worker_id, run, base_seed,
        )));
    })
}

/// Runs `f` with the calling worker's RNG.
///
/// Outside a seeded worker a generator is seeded from the OS on first use
/// and kept for the rest of the thread's life.
pub fn with_worker_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    WORKER_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        let rng = rng_ref.get_or_insert_with(StdRng::from_os_rng);
        f(rng)
    })
}
