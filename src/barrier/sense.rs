use super::{LocalSense, RawBarrier};
use crate::backoff::SpinConfig;
use crate::CachePadded;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Sense-reversing centralized barrier.
///
/// The last thread to arrive resets the counter and publishes its sense, which is the
/// only release signal. Waiters compare against their own flipped sense rather than
/// waiting for the counter to drop, so a fast thread re-entering the next episode
/// cannot confuse a slow one still leaving the previous episode.
pub struct SenseBarrier {
    count: CachePadded<AtomicUsize>,
    sense: CachePadded<AtomicBool>,
    parties: usize,
    spin: SpinConfig,
}

impl SenseBarrier {
    pub fn new(parties: usize) -> Self {
        Self::with_spin(parties, SpinConfig::default())
    }

    pub fn with_spin(parties: usize, spin: SpinConfig) -> Self {
        assert!(parties > 0, "a barrier needs at least one party");

        Self {
            count: CachePadded::new(AtomicUsize::new(0)),
            sense: CachePadded::new(AtomicBool::new(false)),
            parties,
            spin,
        }
    }
}

impl RawBarrier for SenseBarrier {
    fn wait(&self, local: &mut LocalSense) -> bool {
        let my_sense = local.flip();
        let arrived = self.count.fetch_add(1, Ordering::AcqRel) + 1;

        if arrived == self.parties {
            // Nobody touches the counter again until they observe the new sense.
            self.count.store(0, Ordering::Relaxed);
            self.sense.store(my_sense, Ordering::Release);
            return true;
        }

        let backoff = self.spin.backoff();

        while self.sense.load(Ordering::Acquire) != my_sense {
            backoff.snooze();
        }

        false
    }

    fn parties(&self) -> usize {
        self.parties
    }
}
