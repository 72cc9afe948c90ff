//! Publication slots for flat combining.
//!
//! A thread that finds the lock taken writes its operation into its own slot. Whoever
//! holds the lock scans every slot once per critical section, runs what is pending and
//! leaves the result in the slot. Slots only move from pending to done under the lock,
//! and the owner only withdraws under the lock, so a published operation runs exactly
//! once.

use crate::CachePadded;
use core::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};

const EMPTY: u8 = 0;
const PENDING: u8 = 1;
const DONE: u8 = 2;

const INSERT: u8 = 0;
const REMOVE: u8 = 1;

/// A single operation on a sequential container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert(i64),
    Remove,
}

/// What the owner finds in its slot once it holds the lock itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withdrawn {
    /// Nobody ran the operation. It is the caller's to run now.
    Pending(Operation),

    /// A combiner already ran it and left this result.
    Completed(Option<i64>),
}

#[derive(Default)]
struct Slot {
    state: AtomicU8,
    op: AtomicU8,
    value: AtomicI64,
    has_result: AtomicBool,
}

impl Slot {
    fn operation(&self) -> Operation {
        match self.op.load(Ordering::Relaxed) {
            INSERT => Operation::Insert(self.value.load(Ordering::Relaxed)),
            _ => Operation::Remove,
        }
    }

    fn result(&self) -> Option<i64> {
        if self.has_result.load(Ordering::Relaxed) {
            Some(self.value.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    fn complete(&self, result: Option<i64>) {
        self.has_result.store(result.is_some(), Ordering::Relaxed);
        self.value.store(result.unwrap_or(0), Ordering::Relaxed);
        self.state.store(DONE, Ordering::Release);
    }
}

pub struct FlatCombiner {
    slots: Box<[CachePadded<Slot>]>,
}

impl FlatCombiner {
    pub fn new(threads: usize) -> Self {
        Self {
            slots: (0..threads).map(|_| CachePadded::default()).collect(),
        }
    }

    pub fn threads(&self) -> usize {
        self.slots.len()
    }

    /// Announce `op` in the slot of `thread`. The slot must be empty.
    pub fn publish(&self, thread: usize, op: Operation) {
        let slot = &self.slots[thread];
        debug_assert_eq!(slot.state.load(Ordering::Relaxed), EMPTY);

        match op {
            Operation::Insert(value) => {
                slot.op.store(INSERT, Ordering::Relaxed);
                slot.value.store(value, Ordering::Relaxed);
            }
            Operation::Remove => slot.op.store(REMOVE, Ordering::Relaxed),
        }

        slot.state.store(PENDING, Ordering::Release);
    }

    /// If a combiner finished the operation of `thread`, clear the slot and return the result.
    pub fn poll(&self, thread: usize) -> Option<Option<i64>> {
        let slot = &self.slots[thread];

        if slot.state.load(Ordering::Acquire) != DONE {
            return None;
        }

        let result = slot.result();
        slot.state.store(EMPTY, Ordering::Relaxed);
        Some(result)
    }

    /// Clear the slot of `thread`. Only the lock holder may call this.
    pub fn withdraw(&self, thread: usize) -> Withdrawn {
        let slot = &self.slots[thread];

        let withdrawn = match slot.state.load(Ordering::Acquire) {
            DONE => Withdrawn::Completed(slot.result()),
            _ => Withdrawn::Pending(slot.operation()),
        };

        slot.state.store(EMPTY, Ordering::Relaxed);
        withdrawn
    }

    /// Run every pending operation through `apply` and return how many there were.
    /// Only the lock holder may call this.
    pub fn combine<F>(&self, mut apply: F) -> usize
    where
        F: FnMut(Operation) -> Option<i64>,
    {
        let mut combined = 0;

        for slot in self.slots.iter() {
            if slot.state.load(Ordering::Acquire) == PENDING {
                slot.complete(apply(slot.operation()));
                combined += 1;
            }
        }

        combined
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatCombiner, Operation, Withdrawn};

    #[test]
    fn combiner_runs_published_operations_once() {
        let combiner = FlatCombiner::new(3);
        let mut stack = vec![1];

        combiner.publish(0, Operation::Insert(5));
        combiner.publish(2, Operation::Remove);

        let ran = combiner.combine(|op| match op {
            Operation::Insert(value) => {
                stack.push(value);
                None
            }
            Operation::Remove => stack.pop(),
        });

        assert_eq!(ran, 2);
        assert_eq!(combiner.poll(0), Some(None));
        assert_eq!(combiner.poll(2), Some(Some(5)));
        assert_eq!(combiner.poll(1), None);
        assert_eq!(combiner.combine(|_| unreachable!()), 0);
    }

    #[test]
    fn withdraw_returns_what_is_left() {
        let combiner = FlatCombiner::new(1);

        combiner.publish(0, Operation::Insert(9));
        assert_eq!(
            combiner.withdraw(0),
            Withdrawn::Pending(Operation::Insert(9))
        );

        combiner.publish(0, Operation::Remove);
        combiner.combine(|_| Some(4));
        assert_eq!(combiner.withdraw(0), Withdrawn::Completed(Some(4)));
        assert_eq!(combiner.poll(0), None);
    }
}
