use crate::{PoolStatus, Worker};
use core::{borrow::Borrow, hash::Hash};
use std::{
    collections::HashSet,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

/// The mutable half of a [`WorkerPool`], always accessed under its lock.
///
/// `workers` is `Some` exactly when `owners` is non-empty. The two fields only
/// change together, inside [`WorkerPool::acquire`] and
/// [`WorkerPool::release`].
///
/// [`WorkerPool`]: crate::WorkerPool
/// [`WorkerPool::acquire`]: crate::WorkerPool::acquire
/// [`WorkerPool::release`]: crate::WorkerPool::release
pub(crate) struct PoolState<W, K> {
    workers: Option<Vec<Arc<W>>>,
    owners: HashSet<K>,
}

impl<W, K> PoolState<W, K>
where
    W: Worker,
    K: Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            workers: None,
            owners: HashSet::new(),
        }
    }

    pub(crate) fn workers(&self) -> Option<&[Arc<W>]> {
        self.workers.as_deref()
    }

    pub(crate) fn activate(&mut self, workers: Vec<Arc<W>>) {
        debug_assert!(self.workers.is_none(), "worker set built twice");
        self.workers = Some(workers);
    }

    /// Adds `owner`. Re-adding a registered owner is a no-op.
    pub(crate) fn register(&mut self, owner: K) {
        self.owners.insert(owner);
    }

    /// Removes `owner` and reports whether that emptied the owner set.
    ///
    /// Unknown owners leave the state untouched and return `false`.
    pub(crate) fn deregister<Q>(&mut self, owner: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.owners.remove(owner) && self.owners.is_empty()
    }

    /// Detaches the worker set, leaving the pool empty.
    pub(crate) fn take_workers(&mut self) -> Option<Vec<Arc<W>>> {
        self.owners.clear();
        self.workers.take()
    }

    pub(crate) fn contains<Q>(&self, owner: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.owners.contains(owner)
    }

    pub(crate) fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub(crate) fn status(&self) -> PoolStatus {
        match &self.workers {
            None => PoolStatus::Empty,
            Some(workers) => PoolStatus::Active {
                workers: workers.len(),
                owners: self.owners.len(),
            },
        }
    }
}

/// Releases resources and terminates every worker in `workers`, in order.
///
/// Each call is isolated: a panic in `release_resources` still lets
/// `terminate` run, and a panicking worker does not stop the rest of the set
/// from being torn down.
pub(crate) fn shutdown_workers<W: Worker>(workers: &[Arc<W>]) {
    for (_slot, worker) in workers.iter().enumerate() {
        let released = catch_unwind(AssertUnwindSafe(|| worker.release_resources()));
        let terminated = catch_unwind(AssertUnwindSafe(|| worker.terminate()));

        if released.is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!("Worker {_slot} panicked while releasing resources");
        }

        if terminated.is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!("Worker {_slot} panicked during termination");
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!("Worker {_slot} terminated");
        }
    }
}
