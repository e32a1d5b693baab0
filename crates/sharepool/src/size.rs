//! Sources for the number of workers a pool builds.
//!
//! The pool reads its [`PoolSize`] once per Empty → Active transition, never
//! at construction, so the value may still change up until the first
//! acquisition (and again between a full teardown and the next rebuild).

use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Supplies the configured worker count.
pub trait PoolSize {
    /// Returns how many workers the next worker set should contain.
    ///
    /// A value of `0` is valid and yields an empty (but active) worker set.
    fn worker_count(&self) -> usize;
}

impl PoolSize for usize {
    fn worker_count(&self) -> usize {
        *self
    }
}

impl<F> PoolSize for F
where
    F: Fn() -> usize,
{
    fn worker_count(&self) -> usize {
        self()
    }
}

/// A worker count that can be changed at runtime and is shared between
/// clones.
///
/// Hand one clone to the pool and keep another to adjust the count before the
/// pool is first used:
///
/// ```
/// use sharepool::{PoolSize, SharedWorkerCount};
///
/// let count = SharedWorkerCount::new(2);
/// let handle = count.clone();
/// handle.set(8);
/// assert_eq!(count.worker_count(), 8);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedWorkerCount {
    count: Arc<AtomicUsize>,
}

impl SharedWorkerCount {
    /// Creates a shared count starting at `count`.
    pub fn new(count: usize) -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(count)),
        }
    }

    /// Replaces the count. Takes effect at the next Empty → Active transition.
    pub fn set(&self, count: usize) {
        self.count.store(count, Ordering::Release);
    }

    /// Returns the current count.
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

impl PoolSize for SharedWorkerCount {
    fn worker_count(&self) -> usize {
        self.get()
    }
}

/// Half of the logical CPUs, but never fewer than one worker.
///
/// Leaves the other half of the machine to the threads that own the pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct AvailableParallelism;

impl PoolSize for AvailableParallelism {
    fn worker_count(&self) -> usize {
        (num_cpus::get() / 2).max(1)
    }
}
