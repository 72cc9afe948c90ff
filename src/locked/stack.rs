use super::{LinkedStack, Locked, LockedHandle};
use crate::combining::Operation;
use crate::config::{Config, Optimizations};
use crate::structure::{Structure, Value};

/// A stack guarded by one [`Lock`](crate::lock::Lock).
///
/// With [`Optimizations::elimination`] a push and a pop that both find the lock busy may
/// cancel out in an elimination array. With [`Optimizations::combining`] the lock holder
/// also runs the operations other threads published while waiting.
pub struct LockedStack {
    inner: Locked<LinkedStack>,
}

impl LockedStack {
    pub fn new(config: &Config) -> Self {
        tracing::debug!(
            lock = %config.lock,
            threads = config.threads,
            optimizations = ?config.optimizations,
            "creating locked stack"
        );

        Self {
            inner: Locked::new(config, LinkedStack::new(), true),
        }
    }

    pub fn handle(&self, thread: usize) -> LockedHandle {
        self.inner.handle(thread)
    }

    pub fn push(&self, handle: &mut LockedHandle, value: Value) {
        self.inner.run(handle, Operation::Insert(value));
    }

    pub fn pop(&self, handle: &mut LockedHandle) -> Option<Value> {
        self.inner.run(handle, Operation::Remove)
    }

    pub fn len(&self) -> usize {
        self.inner.with_state(LinkedStack::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.with_state(LinkedStack::is_empty)
    }

    pub fn optimizations(&self) -> Optimizations {
        self.inner.optimizations()
    }
}

impl Structure for LockedStack {
    type Handle<'a> = LockedHandle;

    fn name(&self) -> &'static str {
        "locked-stack"
    }

    fn handle(&self, thread: usize) -> LockedHandle {
        LockedStack::handle(self, thread)
    }

    fn insert(&self, handle: &mut LockedHandle, value: Value) {
        self.push(handle, value);
    }

    fn remove(&self, handle: &mut LockedHandle) -> Option<Value> {
        self.pop(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::LockedStack;
    use crate::backoff::SpinConfig;
    use crate::config::{Config, Optimizations};
    use crate::lock::LockKind;
    use std::thread;

    #[test]
    fn sanity_for_every_variant() {
        let variants = [
            Optimizations::NONE,
            Optimizations::COMBINING,
            Optimizations::ELIMINATION,
            Optimizations::ALL,
        ];

        for lock in LockKind::ALL {
            for optimizations in variants {
                let config = Config::new(1, 3)
                    .with_lock(lock)
                    .with_optimizations(optimizations);
                let stack = LockedStack::new(&config);
                let mut handle = stack.handle(0);

                stack.push(&mut handle, 1);
                stack.push(&mut handle, 2);
                stack.push(&mut handle, 3);
                assert_eq!(stack.len(), 3);

                assert_eq!(stack.pop(&mut handle), Some(3));
                assert_eq!(stack.pop(&mut handle), Some(2));
                assert_eq!(stack.pop(&mut handle), Some(1));
                assert_eq!(stack.pop(&mut handle), None);
                assert!(stack.is_empty());
                assert_eq!(stack.optimizations(), optimizations);
            }
        }
    }

    /// With the lock held elsewhere, a push and a pop can only complete by meeting in
    /// the elimination array.
    #[test]
    fn push_and_pop_meet_while_the_lock_is_held() {
        let config = Config::new(2, 1)
            .with_optimizations(Optimizations::ELIMINATION)
            .with_elimination_slots(1)
            .with_elimination_delay(SpinConfig::new(4, 1 << 22));
        let stack = LockedStack::new(&config);
        let elimination = stack.inner.elimination.as_ref().unwrap();
        let guard = stack.inner.state.lock();

        for (first, value) in [(0, 11), (1, 12)] {
            thread::scope(|scope| {
                let stack = &stack;

                let early = scope.spawn(move || {
                    let mut handle = stack.handle(first);

                    if first == 0 {
                        stack.push(&mut handle, value);
                        None
                    } else {
                        stack.pop(&mut handle)
                    }
                });

                while elimination.waiting() == 0 {
                    thread::yield_now();
                }

                let mut handle = stack.handle(1 - first);

                if first == 0 {
                    assert_eq!(stack.pop(&mut handle), Some(value));
                    assert_eq!(early.join().unwrap(), None);
                } else {
                    stack.push(&mut handle, value);
                    assert_eq!(early.join().unwrap(), Some(value));
                }
            });
        }

        assert!(guard.is_empty());
        drop(guard);
        assert!(stack.is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn handle_checks_the_thread_index() {
        let stack = LockedStack::new(&Config::new(2, 1));
        stack.handle(2);
    }
}
