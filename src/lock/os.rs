use super::RawLock;
use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;

/// Delegates to the platform parking mutex. Contended waiters sleep instead of spinning.
pub struct OsLock {
    raw: RawMutex,
}

impl OsLock {
    pub fn new() -> Self {
        Self {
            raw: RawMutex::INIT,
        }
    }
}

impl RawLock for OsLock {
    fn acquire(&self) {
        self.raw.lock();
    }

    fn try_acquire(&self) -> bool {
        self.raw.try_lock()
    }

    unsafe fn release(&self) {
        self.raw.unlock();
    }
}

impl Default for OsLock {
    fn default() -> Self {
        Self::new()
    }
}
