/// A handle to one running background worker.
///
/// The pool never looks inside a worker. It only ever calls
/// [`Worker::release_resources`] followed by [`Worker::terminate`], once each,
/// when the last owner lets go of the worker set (or when a partially built
/// set is rolled back).
///
/// Handles are shared between owners as `Arc<W>`, so both methods take
/// `&self`. Owners should never call `terminate` themselves.
pub trait Worker: Send + Sync {
    /// Releases any externally allocated resource tied to this worker, such as
    /// a resource locator the worker was started from.
    ///
    /// Called immediately before [`Worker::terminate`]. A panic raised here is
    /// caught, and `terminate` still runs. The default does nothing.
    fn release_resources(&self) {}

    /// Stops the worker.
    ///
    /// Termination is best-effort. A panic raised here is caught and logged by
    /// the pool so the remaining workers are still torn down.
    ///
    /// This runs while the pool lock is held. It must not wait on anything
    /// that is itself waiting to acquire or release the same pool.
    fn terminate(&self);
}

/// Starts workers on behalf of a [`WorkerPool`].
///
/// `slot` is the zero-based position of the worker in the set being built.
/// Slots are requested strictly in order, from `0` up to the configured count.
///
/// If `create_worker` fails or panics, every worker already created for the
/// same set is released and terminated before the error is returned or the
/// panic resumes.
///
/// Any `Fn(usize) -> Result<W, E>` closure is a factory:
///
/// ```
/// use sharepool::{Worker, WorkerFactory};
///
/// struct Noop;
/// impl Worker for Noop {
///     fn terminate(&self) {}
/// }
///
/// let factory = |_slot: usize| Ok::<_, std::io::Error>(Noop);
/// assert!(factory.create_worker(0).is_ok());
/// ```
///
/// [`WorkerPool`]: crate::WorkerPool
pub trait WorkerFactory {
    /// The worker handle this factory produces.
    type Worker: Worker;

    /// Why a worker could not be started.
    type Error;

    /// Starts the worker for `slot`.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if the underlying worker cannot be started.
    fn create_worker(&self, slot: usize) -> Result<Self::Worker, Self::Error>;
}

impl<F, W, E> WorkerFactory for F
where
    F: Fn(usize) -> Result<W, E>,
    W: Worker,
{
    type Worker = W;
    type Error = E;

    fn create_worker(&self, slot: usize) -> Result<W, E> {
        self(slot)
    }
}
