//! Sequential containers behind a single lock, optionally with flat combining and
//! elimination backoff in front of the lock.

mod list;
mod queue;
mod stack;

pub use list::{LinkedQueue, LinkedStack, Sequential};
pub use queue::LockedQueue;
pub use stack::LockedStack;

use crate::backoff::SpinConfig;
use crate::combining::{FlatCombiner, Operation, Withdrawn};
use crate::config::{Config, Optimizations};
use crate::elimination::EliminationArray;
use crate::lock::{Lock, Mutex, MutexGuard};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Per-thread state for the locked structures.
pub struct LockedHandle {
    thread: usize,
    rng: SmallRng,
}

impl LockedHandle {
    fn new(thread: usize) -> Self {
        Self {
            thread,
            rng: SmallRng::seed_from_u64(thread as u64 + 1),
        }
    }

    pub fn thread(&self) -> usize {
        self.thread
    }
}

/// The shared machinery of [`LockedStack`] and [`LockedQueue`].
struct Locked<S> {
    state: Mutex<S, Lock>,
    combiner: Option<FlatCombiner>,
    elimination: Option<EliminationArray>,
    threads: usize,
    spin: SpinConfig,
}

impl<S: Sequential> Locked<S> {
    fn new(config: &Config, state: S, allow_elimination: bool) -> Self {
        let Optimizations {
            combining,
            elimination,
        } = config.optimizations;

        Self {
            state: Mutex::with_lock(config.build_lock(), state),
            combiner: combining.then(|| FlatCombiner::new(config.threads)),
            elimination: (elimination && allow_elimination).then(|| config.build_elimination()),
            threads: config.threads,
            spin: config.spin,
        }
    }

    fn handle(&self, thread: usize) -> LockedHandle {
        assert!(
            thread < self.threads,
            "thread index {} out of range for {} threads",
            thread,
            self.threads
        );

        LockedHandle::new(thread)
    }

    fn optimizations(&self) -> Optimizations {
        Optimizations::new(self.combiner.is_some(), self.elimination.is_some())
    }

    fn run(&self, handle: &mut LockedHandle, op: Operation) -> Option<i64> {
        if self.optimizations().is_none() {
            let mut guard = self.state.lock();
            return guard.apply(op);
        }

        if let Some(mut guard) = self.state.try_lock() {
            return self.apply_and_combine(&mut guard, op);
        }

        if let Some(elimination) = &self.elimination {
            match op {
                Operation::Insert(value) => {
                    if elimination.try_push(value, &mut handle.rng) {
                        return None;
                    }
                }
                Operation::Remove => {
                    if let Some(value) = elimination.try_pop(&mut handle.rng) {
                        return Some(value);
                    }
                }
            }
        }

        match &self.combiner {
            Some(combiner) => self.run_combined(combiner, handle.thread, op),
            None => {
                let mut guard = self.state.lock();
                self.apply_and_combine(&mut guard, op)
            }
        }
    }

    fn run_combined(&self, combiner: &FlatCombiner, thread: usize, op: Operation) -> Option<i64> {
        combiner.publish(thread, op);
        let backoff = self.spin.backoff();

        loop {
            if let Some(result) = combiner.poll(thread) {
                return result;
            }

            if let Some(mut guard) = self.state.try_lock() {
                let result = match combiner.withdraw(thread) {
                    Withdrawn::Pending(op) => guard.apply(op),
                    Withdrawn::Completed(result) => result,
                };

                combiner.combine(|op| guard.apply(op));
                return result;
            }

            backoff.snooze();
        }
    }

    fn apply_and_combine(&self, guard: &mut MutexGuard<'_, S, Lock>, op: Operation) -> Option<i64> {
        let result = guard.apply(op);

        if let Some(combiner) = &self.combiner {
            let combined = combiner.combine(|op| guard.apply(op));

            if combined > 0 {
                tracing::trace!(combined, "ran published operations");
            }
        }

        result
    }

    fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.state.lock();
        f(&*guard)
    }
}
