use crate::{PoolSize, Result, WorkerFactory, WorkerPool, pool::PoolWorker};
use core::{fmt, hash::Hash, ops::Deref};
use std::sync::Arc;

/// An owner's hold on a [`WorkerPool`] that is released on drop.
///
/// Created by [`WorkerPool::lease`]. Dereferences to the shared worker slice.
///
/// Leases follow the pool's idempotent registration rules: two leases taken
/// with the same owner key share one registration, and dropping either of
/// them releases it. Use distinct keys for independent owners.
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
/// let pool = Arc::new(WorkerPool::new(|_slot: usize| Ok::<_, std::io::Error>(Noop), 3_usize));
/// {
///     let lease = pool.lease("renderer").unwrap();
///     assert_eq!(lease.len(), 3);
///     assert!(pool.is_active());
/// }
/// assert!(!pool.is_active());
/// ```
pub struct PoolLease<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    pool: Arc<WorkerPool<F, S, K>>,
    owner: K,
    workers: Vec<Arc<PoolWorker<F>>>,
}

impl<F, S, K> WorkerPool<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash + Clone,
{
    /// Acquires the worker set for `owner` and wraps it in a [`PoolLease`]
    /// that calls [`WorkerPool::release`] when dropped.
    ///
    /// # Errors
    ///
    /// Fails exactly when [`WorkerPool::acquire`] does.
    pub fn lease(self: &Arc<Self>, owner: K) -> Result<PoolLease<F, S, K>, F::Error> {
        let workers = self.acquire(owner.clone())?;
        Ok(PoolLease {
            pool: Arc::clone(self),
            owner,
            workers,
        })
    }
}

impl<F, S, K> PoolLease<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    /// The key this lease is registered under.
    pub const fn owner(&self) -> &K {
        &self.owner
    }

    /// The shared workers handed out at acquisition.
    pub fn workers(&self) -> &[Arc<PoolWorker<F>>] {
        &self.workers
    }

    /// The pool this lease belongs to.
    pub const fn pool(&self) -> &Arc<WorkerPool<F, S, K>> {
        &self.pool
    }
}

impl<F, S, K> Deref for PoolLease<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    type Target = [Arc<PoolWorker<F>>];

    fn deref(&self) -> &Self::Target {
        &self.workers
    }
}

impl<F, S, K> Drop for PoolLease<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash,
{
    fn drop(&mut self) {
        // Drop our handles first so a teardown leaves no strays behind.
        self.workers.clear();
        self.pool.release(&self.owner);
    }
}

impl<F, S, K> fmt::Debug for PoolLease<F, S, K>
where
    F: WorkerFactory,
    S: PoolSize,
    K: Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolLease")
            .field("owner", &self.owner)
            .field("workers", &self.workers.len())
            .finish()
    }
}
