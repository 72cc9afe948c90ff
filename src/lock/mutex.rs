use super::{Lock, LockKind, RawLock};
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use std::fmt;

/// A value protected by any [`RawLock`].
///
/// The lock and the value are kept apart in memory, the lock types pad their own
/// contended words.
pub struct Mutex<T, L = Lock> {
    lock: L,
    value: UnsafeCell<T>,
}

impl<T> Mutex<T, Lock> {
    pub fn new(kind: LockKind, value: T) -> Self {
        Self::with_lock(Lock::new(kind), value)
    }
}

impl<T, L: RawLock> Mutex<T, L> {
    pub fn with_lock(lock: L, value: T) -> Self {
        Self {
            lock,
            value: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T, L> {
        self.lock.acquire();
        MutexGuard::new(self)
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, T, L>> {
        if self.lock.try_acquire() {
            Some(MutexGuard::new(self))
        } else {
            None
        }
    }

    pub fn raw(&self) -> &L {
        &self.lock
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

unsafe impl<T: Send, L: RawLock> Send for Mutex<T, L> {}
unsafe impl<T: Send, L: RawLock> Sync for Mutex<T, L> {}

impl<T, L> fmt::Debug for Mutex<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex").finish_non_exhaustive()
    }
}

/// Proof of holding the lock of a [`Mutex`]. Releases it on drop.
pub struct MutexGuard<'a, T, L: RawLock = Lock> {
    mutex: &'a Mutex<T, L>,
}

impl<'a, T, L: RawLock> MutexGuard<'a, T, L> {
    fn new(mutex: &'a Mutex<T, L>) -> Self {
        Self { mutex }
    }
}

impl<'a, T, L: RawLock> Deref for MutexGuard<'a, T, L> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.mutex.value.get() }
    }
}

impl<'a, T, L: RawLock> DerefMut for MutexGuard<'a, T, L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<'a, T, L: RawLock> Drop for MutexGuard<'a, T, L> {
    fn drop(&mut self) {
        unsafe {
            self.mutex.lock.release();
        }
    }
}
