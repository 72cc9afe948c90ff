use super::RawLock;
use crate::backoff::SpinConfig;
use crate::CachePadded;
use core::sync::atomic::{AtomicUsize, Ordering};

/// This is an implementation of a fair lock based on a ticket lock.
/// Waiters are served strictly in the order they took their tickets which keeps
/// the worst case latency down.
///
/// The two counters are padded to separate cache lines since the ticket counter is hit
/// on arrival and the serving counter is spun on by every waiter.
///
/// The downside to this lock is that the average latency tanks when the amount of
/// waiting threads exceed the amount of processors on the system.
pub struct TicketLock {
    next_ticket: CachePadded<AtomicUsize>,
    now_serving: CachePadded<AtomicUsize>,
    spin: SpinConfig,
}

impl TicketLock {
    pub fn new() -> Self {
        Self::with_spin(SpinConfig::default())
    }

    pub fn with_spin(spin: SpinConfig) -> Self {
        Self {
            next_ticket: CachePadded::new(AtomicUsize::new(0)),
            now_serving: CachePadded::new(AtomicUsize::new(0)),
            spin,
        }
    }
}

impl RawLock for TicketLock {
    fn acquire(&self) {
        // Grab the next free ticket by incrementing the ticket counter.
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let backoff = self.spin.backoff();

        // Wait until it's our turn by continously checking the ticket number.
        while self.now_serving.load(Ordering::Acquire) != ticket {
            backoff.snooze();
        }
    }

    /// Only succeeds when nobody holds or waits for the lock: the ticket we would draw
    /// has to be the one currently being served.
    fn try_acquire(&self) -> bool {
        let serving = self.now_serving.load(Ordering::Acquire);

        self.next_ticket
            .compare_exchange(
                serving,
                serving.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// We can use a store instead of an atomic increment here because only the holder
    /// may execute this function.
    unsafe fn release(&self) {
        let serving = self.now_serving.load(Ordering::Relaxed);
        self.now_serving
            .store(serving.wrapping_add(1), Ordering::Release);
    }
}

impl Default for TicketLock {
    fn default() -> Self {
        Self::new()
    }
}
