//! The exchanger shared by the elimination backed stacks.
//!
//! A push and a pop that meet in the same slot cancel out without touching the stack.
//! Every exchange is a short state machine on one slot. The thread that moved the slot
//! out of `EMPTY` owns it and is the only one that ever moves it back.

use crate::backoff::SpinConfig;
use core::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use rand::Rng;

const EMPTY: u8 = 0;

// Push side, owned by the pusher.
const WRITING: u8 = 1;
const PUSH_WAITING: u8 = 2;
const TAKING: u8 = 3;
const TAKEN: u8 = 4;

// Pop side, owned by the popper.
const POP_WAITING: u8 = 5;
const FILLING: u8 = 6;
const FILLED: u8 = 7;

#[derive(Default)]
struct Slot {
    state: AtomicU8,
    value: AtomicI64,
}

pub struct EliminationArray {
    slots: Box<[Slot]>,
    delay: SpinConfig,
}

impl EliminationArray {
    /// An array of `len` slots. A zero length is rounded up to one slot.
    pub fn new(len: usize, delay: SpinConfig) -> Self {
        Self {
            slots: (0..len.max(1)).map(|_| Slot::default()).collect(),
            delay,
        }
    }

    /// The length used when none is configured: one slot per pair of operations.
    pub fn default_len(threads: usize, iterations: usize) -> usize {
        (threads.saturating_mul(iterations) / 2).max(1)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots where an operation is waiting for a partner.
    #[cfg(test)]
    pub(crate) fn waiting(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| {
                matches!(
                    slot.state.load(Ordering::Acquire),
                    PUSH_WAITING | POP_WAITING
                )
            })
            .count()
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Slot {
        &self.slots[rng.gen_range(0..self.slots.len())]
    }

    /// Try to hand `value` to a concurrent pop. Returns `true` if a pop consumed it.
    pub fn try_push<R: Rng + ?Sized>(&self, value: i64, rng: &mut R) -> bool {
        let slot = self.pick(rng);

        match slot.state.load(Ordering::Acquire) {
            EMPTY => self.offer(slot, value),
            POP_WAITING => fill(slot, value),
            _ => false,
        }
    }

    /// Try to take a value from a concurrent push.
    pub fn try_pop<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i64> {
        let slot = self.pick(rng);

        match slot.state.load(Ordering::Acquire) {
            PUSH_WAITING => take(slot),
            EMPTY => self.request(slot),
            _ => None,
        }
    }

    fn offer(&self, slot: &Slot, value: i64) -> bool {
        if slot
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        slot.value.store(value, Ordering::Relaxed);
        slot.state.store(PUSH_WAITING, Ordering::Release);

        let backoff = self.delay.backoff();

        while !backoff.is_completed() {
            if slot.state.load(Ordering::Acquire) == TAKEN {
                slot.state.store(EMPTY, Ordering::Release);
                return true;
            }

            backoff.snooze();
        }

        if slot
            .state
            .compare_exchange(PUSH_WAITING, EMPTY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return false;
        }

        // A pop claimed the value while we were giving up.
        let backoff = self.delay.backoff();

        while slot.state.load(Ordering::Acquire) != TAKEN {
            backoff.snooze();
        }

        slot.state.store(EMPTY, Ordering::Release);
        true
    }

    fn request(&self, slot: &Slot) -> Option<i64> {
        if slot
            .state
            .compare_exchange(EMPTY, POP_WAITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }

        let backoff = self.delay.backoff();

        while !backoff.is_completed() {
            if slot.state.load(Ordering::Acquire) == FILLED {
                return Some(drain(slot));
            }

            backoff.snooze();
        }

        if slot
            .state
            .compare_exchange(POP_WAITING, EMPTY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return None;
        }

        // A push is already filling the slot.
        let backoff = self.delay.backoff();

        while slot.state.load(Ordering::Acquire) != FILLED {
            backoff.snooze();
        }

        Some(drain(slot))
    }
}

fn fill(slot: &Slot, value: i64) -> bool {
    if slot
        .state
        .compare_exchange(POP_WAITING, FILLING, Ordering::Acquire, Ordering::Relaxed)
        .is_err()
    {
        return false;
    }

    slot.value.store(value, Ordering::Relaxed);
    slot.state.store(FILLED, Ordering::Release);
    true
}

fn take(slot: &Slot) -> Option<i64> {
    if slot
        .state
        .compare_exchange(PUSH_WAITING, TAKING, Ordering::Acquire, Ordering::Relaxed)
        .is_err()
    {
        return None;
    }

    let value = slot.value.load(Ordering::Relaxed);
    slot.state.store(TAKEN, Ordering::Release);
    Some(value)
}

fn drain(slot: &Slot) -> i64 {
    let value = slot.value.load(Ordering::Relaxed);
    slot.state.store(EMPTY, Ordering::Release);
    value
}

#[cfg(test)]
mod tests {
    use super::{EliminationArray, EMPTY};
    use crate::backoff::SpinConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::atomic::Ordering;
    use std::thread;

    #[test]
    fn lonely_operations_time_out() {
        let array = EliminationArray::new(1, SpinConfig::new(1, 2));
        let mut rng = SmallRng::seed_from_u64(1);

        assert!(!array.try_push(5, &mut rng));
        assert_eq!(array.try_pop(&mut rng), None);
        assert!(!array.try_push(6, &mut rng));
    }

    #[test]
    fn zero_length_rounds_up() {
        let array = EliminationArray::new(0, SpinConfig::default());
        assert_eq!(array.len(), 1);
        assert_eq!(EliminationArray::default_len(4, 1000), 2000);
        assert_eq!(EliminationArray::default_len(1, 1), 1);
    }

    /// Long enough that a waiting operation never gives up before its partner arrives.
    fn patient() -> SpinConfig {
        SpinConfig::new(4, 1 << 22)
    }

    fn wait_for_partner(array: &EliminationArray) {
        while array.waiting() == 0 {
            thread::yield_now();
        }
    }

    #[test]
    fn waiting_push_hands_its_value_to_a_pop() {
        let array = EliminationArray::new(1, patient());

        thread::scope(|scope| {
            let pusher = scope.spawn(|| array.try_push(42, &mut SmallRng::seed_from_u64(1)));

            wait_for_partner(&array);
            assert_eq!(array.try_pop(&mut SmallRng::seed_from_u64(2)), Some(42));
            assert!(pusher.join().unwrap());
        });

        assert_eq!(array.waiting(), 0);
        assert_eq!(array.slots[0].state.load(Ordering::Relaxed), EMPTY);
    }

    #[test]
    fn waiting_pop_is_filled_by_a_push() {
        let array = EliminationArray::new(1, patient());

        thread::scope(|scope| {
            let popper = scope.spawn(|| array.try_pop(&mut SmallRng::seed_from_u64(1)));

            wait_for_partner(&array);
            assert!(array.try_push(-7, &mut SmallRng::seed_from_u64(2)));
            assert_eq!(popper.join().unwrap(), Some(-7));
        });

        assert_eq!(array.waiting(), 0);
        assert_eq!(array.slots[0].state.load(Ordering::Relaxed), EMPTY);
    }

    #[test]
    fn every_value_goes_through_the_exchanger() {
        const ROUNDS: i64 = 500;

        let array = EliminationArray::new(1, SpinConfig::new(2, 64));

        let popped = thread::scope(|scope| {
            scope.spawn(|| {
                let mut rng = SmallRng::seed_from_u64(2);

                for value in 1..=ROUNDS {
                    while !array.try_push(value, &mut rng) {
                        thread::yield_now();
                    }
                }
            });

            let popper = scope.spawn(|| {
                let mut rng = SmallRng::seed_from_u64(3);
                let mut popped = Vec::new();

                while popped.len() < ROUNDS as usize {
                    match array.try_pop(&mut rng) {
                        Some(value) => popped.push(value),
                        None => thread::yield_now(),
                    }
                }

                popped
            });

            popper.join().unwrap()
        });

        // A push only returns once its value is out of the slot, so the order is kept.
        assert_eq!(popped, (1..=ROUNDS).collect::<Vec<_>>());
        assert_eq!(array.waiting(), 0);
    }
}
