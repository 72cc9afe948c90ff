use super::RawLock;
use crate::backoff::SpinConfig;
use crate::CachePadded;
use core::sync::atomic::{AtomicBool, Ordering};

/// Test-and-test-and-set lock.
///
/// Waiters spin on a plain load, which keeps the cache line shared between them, and only
/// attempt the compare-and-swap once they have seen the flag clear.
pub struct TtasLock {
    flag: CachePadded<AtomicBool>,
    spin: SpinConfig,
}

impl TtasLock {
    pub fn new() -> Self {
        Self::with_spin(SpinConfig::default())
    }

    pub fn with_spin(spin: SpinConfig) -> Self {
        Self {
            flag: CachePadded::new(AtomicBool::new(false)),
            spin,
        }
    }

    #[inline]
    fn test_and_set(&self) -> bool {
        self.flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

impl RawLock for TtasLock {
    fn acquire(&self) {
        let backoff = self.spin.backoff();

        loop {
            while self.flag.load(Ordering::Relaxed) {
                backoff.snooze();
            }

            if self.test_and_set() {
                return;
            }
        }
    }

    fn try_acquire(&self) -> bool {
        !self.flag.load(Ordering::Relaxed) && self.test_and_set()
    }

    unsafe fn release(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for TtasLock {
    fn default() -> Self {
        Self::new()
    }
}
