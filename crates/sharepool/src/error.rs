#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
use core::fmt;

/// A result type carrying the pool's [`Error`].
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// All errors a [`WorkerPool`] can surface.
///
/// The generic parameter `E` is the error type of the injected
/// [`WorkerFactory`]. Only [`WorkerPool::acquire`] (and the lease built on it)
/// can fail; releasing is infallible by contract.
///
/// [`WorkerPool`]: crate::WorkerPool
/// [`WorkerPool::acquire`]: crate::WorkerPool::acquire
/// [`WorkerFactory`]: crate::WorkerFactory
#[derive(Debug)]
#[non_exhaustive]
pub enum Error<E> {
    /// The factory could not start the worker for `slot`.
    ///
    /// Every worker created earlier in the same acquisition has already been
    /// terminated when this is returned, and the pool is still empty.
    Creation {
        /// Zero-based position of the worker that failed to start.
        slot: usize,
        /// The factory's own error.
        source: E,
    },

    /// The pool state lock was poisoned by a panic in another thread.
    ///
    /// When the `parking-lot` feature is enabled, mutexes do **not** poison,
    /// so this variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    LockPoisoned,
}

impl<E> Error<E> {
    /// Returns the slot whose creation failed, if this is a creation error.
    pub const fn slot(&self) -> Option<usize> {
        match self {
            Self::Creation { slot, .. } => Some(*slot),
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => None,
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creation { slot, .. } => write!(fmt, "failed to create worker for slot {slot}"),
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => fmt.write_str("worker pool lock poisoned"),
        }
    }
}

impl<E> core::error::Error for Error<E>
where
    E: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Creation { source, .. } => Some(source),
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => None,
        }
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T, E> From<PoisonError<MutexGuard<'_, T>>> for Error<E> {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

/// Returned by the bundled workers when work is offered after termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker has been terminated")]
pub struct WorkerTerminated;

#[cfg(test)]
mod tests {
    use super::*;
    use core::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("no threads left")]
    struct Exhausted;

    #[test]
    fn creation_error_exposes_slot_and_source() {
        let err: Error<Exhausted> = Error::Creation {
            slot: 4,
            source: Exhausted,
        };
        assert_eq!(err.slot(), Some(4));
        assert_eq!(err.to_string(), "failed to create worker for slot 4");
        assert_eq!(err.source().unwrap().to_string(), "no threads left");
    }

    #[cfg(not(feature = "parking-lot"))]
    #[test]
    fn poisoned_lock_converts() {
        use crate::mutex::Mutex;
        use std::sync::Arc;

        let mutex = Arc::new(Mutex::new(0_u8));
        let poisoner = Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err: Error<Exhausted> = mutex.lock().unwrap_err().into();
        assert!(matches!(err, Error::LockPoisoned));
        assert_eq!(err.slot(), None);
    }
}
