use super::RawLock;
use crate::backoff::SpinConfig;
use crate::CachePadded;
use core::sync::atomic::{AtomicBool, Ordering};

/// Test-and-set lock. Every waiter hammers the flag with compare-and-swap.
pub struct TasLock {
    flag: CachePadded<AtomicBool>,
    spin: SpinConfig,
}

impl TasLock {
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

impl RawLock for TasLock {
    fn acquire(&self) {
        let backoff = self.spin.backoff();

        while !self.test_and_set() {
            backoff.snooze();
        }
    }

    fn try_acquire(&self) -> bool {
        self.test_and_set()
    }

    unsafe fn release(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for TasLock {
    fn default() -> Self {
        Self::new()
    }
}
