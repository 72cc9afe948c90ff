use super::{LinkedQueue, Locked, LockedHandle};
use crate::combining::Operation;
use crate::config::{Config, Optimizations};
use crate::structure::{Structure, Value};

/// A FIFO queue guarded by one [`Lock`](crate::lock::Lock), optionally flat combined.
///
/// Elimination never applies here. [`Optimizations::elimination`] is ignored.
pub struct LockedQueue {
    inner: Locked<LinkedQueue>,
}

impl LockedQueue {
    pub fn new(config: &Config) -> Self {
        if config.optimizations.elimination {
            tracing::debug!("elimination requested for a queue, ignoring it");
        }

        tracing::debug!(
            lock = %config.lock,
            threads = config.threads,
            combining = config.optimizations.combining,
            "creating locked queue"
        );

        Self {
            inner: Locked::new(config, LinkedQueue::new(), false),
        }
    }

    pub fn handle(&self, thread: usize) -> LockedHandle {
        self.inner.handle(thread)
    }

    pub fn enqueue(&self, handle: &mut LockedHandle, value: Value) {
        self.inner.run(handle, Operation::Insert(value));
    }

    pub fn dequeue(&self, handle: &mut LockedHandle) -> Option<Value> {
        self.inner.run(handle, Operation::Remove)
    }

    pub fn len(&self) -> usize {
        self.inner.with_state(LinkedQueue::len)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.with_state(LinkedQueue::is_empty)
    }

    pub fn optimizations(&self) -> Optimizations {
        self.inner.optimizations()
    }
}

impl Structure for LockedQueue {
    type Handle<'a> = LockedHandle;

    fn name(&self) -> &'static str {
        "locked-queue"
    }

    fn handle(&self, thread: usize) -> LockedHandle {
        LockedQueue::handle(self, thread)
    }

    fn insert(&self, handle: &mut LockedHandle, value: Value) {
        self.enqueue(handle, value);
    }

    fn remove(&self, handle: &mut LockedHandle) -> Option<Value> {
        self.dequeue(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::LockedQueue;
    use crate::config::{Config, Optimizations};
    use crate::lock::LockKind;

    #[test]
    fn sanity_for_every_variant() {
        for lock in LockKind::ALL {
            for optimizations in [Optimizations::NONE, Optimizations::COMBINING] {
                let config = Config::new(1, 2)
                    .with_lock(lock)
                    .with_optimizations(optimizations);
                let queue = LockedQueue::new(&config);
                let mut handle = queue.handle(0);

                queue.enqueue(&mut handle, 1);
                queue.enqueue(&mut handle, 2);
                assert_eq!(queue.len(), 2);

                assert_eq!(queue.dequeue(&mut handle), Some(1));
                assert_eq!(queue.dequeue(&mut handle), Some(2));
                assert_eq!(queue.dequeue(&mut handle), None);
                assert!(queue.is_empty());
            }
        }
    }

    #[test]
    fn elimination_is_never_enabled() {
        let config = Config::new(2, 10).with_optimizations(Optimizations::ALL);
        let queue = LockedQueue::new(&config);
        assert_eq!(queue.optimizations(), Optimizations::COMBINING);
    }
}
