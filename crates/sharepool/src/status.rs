/// A point-in-time view of a [`WorkerPool`]'s lifecycle.
///
/// - [`PoolStatus::Empty`]: no owner is registered and no worker exists.
/// - [`PoolStatus::Active`]: at least one owner holds the worker set.
///
/// The snapshot is taken under the pool lock but may be stale as soon as it
/// is returned.
///
/// # Example
///
/// ```
/// use sharepool::{PoolStatus, Worker, WorkerPool};
///
/// struct Noop;
/// impl Worker for Noop {
///     fn terminate(&self) {}
/// }
///
/// let pool = WorkerPool::new(|_slot: usize| Ok::<_, std::io::Error>(Noop), 2_usize);
/// assert_eq!(pool.status(), PoolStatus::Empty);
///
/// let _workers = pool.acquire("map-1").unwrap();
/// assert_eq!(pool.status(), PoolStatus::Active { workers: 2, owners: 1 });
/// ```
///
/// [`WorkerPool`]: crate::WorkerPool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolStatus {
    /// No workers exist and no owners are registered.
    Empty,
    /// A worker set is live.
    Active {
        /// Number of workers in the live set.
        workers: usize,
        /// Number of distinct registered owners.
        owners: usize,
    },
}

impl PoolStatus {
    /// Returns `true` if the pool currently holds a worker set.
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}
