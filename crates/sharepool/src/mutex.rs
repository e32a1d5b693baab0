//! Lock selection for shared pool state.
//!
//! `std::sync::Mutex` by default; `parking_lot::Mutex` (which never poisons)
//! with the `parking-lot` feature.

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, MutexGuard};
#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Error;

/// Locks `mutex`, reporting poisoning as [`Error::LockPoisoned`].
#[cfg(not(feature = "parking-lot"))]
pub(crate) fn lock<T, E>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error<E>> {
    Ok(mutex.lock()?)
}

#[cfg(feature = "parking-lot")]
pub(crate) fn lock<T, E>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error<E>> {
    Ok(mutex.lock())
}

/// Locks `mutex` for paths that must not fail, taking the guard back from a
/// poisoned lock.
#[cfg(not(feature = "parking-lot"))]
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(feature = "parking-lot")]
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock()
}
