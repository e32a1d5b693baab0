//! Lazily-built worker set shared between many owners.
//!
//! This module defines [`WorkerPool`], which creates its workers on the first
//! [`WorkerPool::acquire`], hands the very same workers to every later owner,
//! and tears the whole set down when the last owner calls
//! [`WorkerPool::release`].
//!
//! The pool does not schedule, balance, or restart anything. Owners decide for
//! themselves how to use the workers they are handed.

mod lease;
mod state;

pub use lease::*;

use crate::{
    Error, PoolSize, PoolStatus, Result, WorkerFactory,
    mutex::{Mutex, lock, lock_recover},
};
use core::{borrow::Borrow, fmt, hash::Hash};
use state::{PoolState, shutdown_workers};
use std::{
    panic::{AssertUnwindSafe, catch_unwind, resume_unwind},
    sync::Arc,
};

/// Shorthand for the worker type produced by a pool's factory.
pub type PoolWorker<F> = <F as WorkerFactory>::Worker;

/// A reference-counted pool of background workers.
///
/// The pool moves between two states:
///
/// - **Empty**: no workers, no owners. This is where every pool starts.
/// - **Active**: a worker set exists and at least one owner holds it.
///
/// The first [`acquire`] reads the [`PoolSize`] and builds that many workers
/// through the [`WorkerFactory`]. The last matching [`release`] terminates all
/// of them and returns the pool to Empty. A later acquisition re-reads the size
/// and builds a fresh set.
///
/// Both operations are serialized by one lock per pool, and worker creation
/// and termination happen while it is held. Concurrent first acquisitions
/// therefore build exactly one worker set, and a teardown can never interleave
/// with an acquisition.
///
/// Owners are identified by any `K: Eq + Hash`. Registration is idempotent and
/// releasing an unknown owner is a no-op.
///
/// # Example
///
/// ```
/// use sharepool::{Worker, WorkerPool};
/// use std::sync::Arc;
///
/// struct Noop;
/// impl Worker for Noop {
///     fn terminate(&self) {}
/// }
///
/// let pool = WorkerPool::new(|_slot: usize| Ok::<_, std::io::Error>(Noop), 2_usize);
///
/// let a = pool.acquire("a").unwrap();
/// let b = pool.acquire("b").unwrap();
/// assert!(a.iter().zip(&b).all(|(x, y)| Arc::ptr_eq(x, y)));
///
/// pool.release("a");
/// assert!(pool.is_active());
/// pool.release("b");
/// assert!(!pool.is_active());
/// ```
///
/// [`acquire`]: WorkerPool::acquire
/// [`release`]: WorkerPool::release
pub struct WorkerPool<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    factory: F,
    size: S,
    state: Mutex<PoolState<F::Worker, K>>,
}

impl<F, S, K> WorkerPool<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    /// Creates an empty pool.
    ///
    /// Nothing is read from `size` and no worker is started until the first
    /// call to [`WorkerPool::acquire`].
    pub fn new(factory: F, size: S) -> Self {
        Self {
            factory,
            size,
            state: Mutex::new(PoolState::new()),
        }
    }

    /// Registers `owner` and returns the shared worker set, building it first
    /// if the pool is empty.
    ///
    /// The returned `Vec` is the caller's own copy; it holds the same
    /// `Arc`-shared workers as every other owner's copy. Acquiring again with
    /// an already registered owner just returns the set.
    ///
    /// # Errors
    ///
    /// - [`Error::Creation`] if the factory fails to start a worker. Workers
    ///   started earlier in the same call are released and terminated, the
    ///   owner is not registered, and the pool stays Empty.
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   pool lock (only without the `parking-lot` feature).
    ///
    /// # Panics
    ///
    /// A panic from the factory or the size source is propagated after the
    /// partially built set has been rolled back. The pool stays Empty and its
    /// lock is left unpoisoned, so later acquisitions proceed normally.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn acquire(&self, owner: K) -> Result<Vec<Arc<F::Worker>>, F::Error> {
        let mut state = lock(&self.state)?;

        if state.workers().is_none() {
            // Nothing has been written yet, so a panicking factory or size
            // source must not leave the lock poisoned.
            match catch_unwind(AssertUnwindSafe(|| self.build_workers())) {
                Ok(built) => state.activate(built?),
                Err(payload) => {
                    drop(state);
                    resume_unwind(payload);
                }
            }
        }

        state.register(owner);
        let workers = state.workers().map(<[_]>::to_vec).unwrap_or_default();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Owner registered ({} active, {} workers)",
            state.owner_count(),
            workers.len()
        );

        Ok(workers)
    }

    /// Deregisters `owner`, terminating every worker if it was the last one.
    ///
    /// Releasing an owner that never acquired, or releasing twice, does
    /// nothing. Termination is best-effort: a worker that panics while
    /// terminating is logged and skipped, and the pool still becomes Empty.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn release<Q>(&self, owner: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = lock_recover(&self.state);

        if !state.deregister(owner) {
            return;
        }

        if let Some(workers) = state.take_workers() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Last owner released, terminating {} workers", workers.len());
            shutdown_workers(&workers);
        }
    }

    /// Returns a snapshot of the pool's lifecycle state.
    pub fn status(&self) -> PoolStatus {
        lock_recover(&self.state).status()
    }

    /// Returns `true` while a worker set exists.
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Number of distinct owners currently registered.
    pub fn owner_count(&self) -> usize {
        lock_recover(&self.state).owner_count()
    }

    /// Returns `true` if `owner` is currently registered.
    pub fn contains_owner<Q>(&self, owner: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        lock_recover(&self.state).contains(owner)
    }

    /// The factory this pool builds workers with.
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// The source this pool reads its worker count from.
    pub const fn size_source(&self) -> &S {
        &self.size
    }

    /// Builds a complete worker set or none at all.
    fn build_workers(&self) -> Result<Vec<Arc<F::Worker>>, F::Error> {
        let count = self.size.worker_count();

        #[cfg(feature = "tracing")]
        tracing::debug!("Building worker set of {count}");

        let mut workers = Vec::with_capacity(count);
        for slot in 0..count {
            match catch_unwind(AssertUnwindSafe(|| self.factory.create_worker(slot))) {
                Ok(Ok(worker)) => workers.push(Arc::new(worker)),
                Ok(Err(source)) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "Worker {slot} failed to start, rolling back {} workers",
                        workers.len()
                    );
                    shutdown_workers(&workers);
                    return Err(Error::Creation { slot, source });
                }
                Err(payload) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(
                        "Worker {slot} panicked while starting, rolling back {} workers",
                        workers.len()
                    );
                    shutdown_workers(&workers);
                    resume_unwind(payload);
                }
            }
        }

        Ok(workers)
    }
}

impl<F, S, K> Drop for WorkerPool<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    /// Tears down a worker set that is still alive when the pool goes away.
    fn drop(&mut self) {
        let mut state = lock_recover(&self.state);
        if let Some(workers) = state.take_workers() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Pool dropped while active, terminating {} workers", workers.len());
            shutdown_workers(&workers);
        }
    }
}

impl<F, S, K> fmt::Debug for WorkerPool<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
