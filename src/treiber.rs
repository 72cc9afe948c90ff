//! Treiber's lock-free stack with an elimination array as its backoff.

use crate::arena::{Link, NodeId};
use crate::config::Config;
use crate::ebr::{Collector, Local};
use crate::elimination::EliminationArray;
use crate::structure::{Structure, Value};
use crate::CachePadded;
use core::ptr;
use core::sync::atomic::Ordering;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Per-thread state for a [`TreiberStack`].
pub struct StackHandle<'s> {
    local: Local<'s>,
    rng: SmallRng,
}

impl<'s> StackHandle<'s> {
    fn new(local: Local<'s>) -> Self {
        let rng = SmallRng::seed_from_u64(local.slot() as u64 + 1);
        Self { local, rng }
    }

    pub fn thread(&self) -> usize {
        self.local.slot()
    }

    pub fn local(&mut self) -> &mut Local<'s> {
        &mut self.local
    }
}

/// A lock-free LIFO stack.
///
/// Pushes and pops race on a single `top` link. A thread that loses the race tries to
/// meet a complementary operation in the elimination array before it retries, which
/// takes pressure off `top` exactly when it is contended. Popped nodes are retired to
/// the stack's epoch collector and recycled once no thread can still be reading them.
pub struct TreiberStack {
    top: CachePadded<Link>,
    collector: Collector,
    elimination: Option<EliminationArray>,
}

impl TreiberStack {
    pub fn new(config: &Config) -> Self {
        Self::build(config, Some(config.build_elimination()))
    }

    /// A plain Treiber stack that simply retries a failed exchange on `top`.
    pub fn without_elimination(config: &Config) -> Self {
        Self::build(config, None)
    }

    fn build(config: &Config, elimination: Option<EliminationArray>) -> Self {
        tracing::debug!(
            threads = config.threads,
            elimination = ?elimination.as_ref().map(EliminationArray::len),
            "creating treiber stack"
        );

        Self {
            top: CachePadded::new(Link::null()),
            collector: Collector::with_capacity(
                config.threads,
                config.node_capacity(),
                config.reclaim,
            ),
            elimination,
        }
    }

    /// Register `thread` with the stack.
    ///
    /// # Panics
    ///
    /// Panics if `thread` is out of range or already has a live handle.
    pub fn handle(&self, thread: usize) -> StackHandle<'_> {
        StackHandle::new(self.collector.register(thread))
    }

    pub fn push(&self, handle: &mut StackHandle<'_>, value: Value) {
        self.check_handle(handle);

        let mut shield = handle.local.pin();
        let id = shield.alloc(value);
        let node = shield.node(id);

        loop {
            let top = self.top.load(Ordering::SeqCst);
            node.set_next(top);

            if self
                .top
                .compare_exchange(top, Some(id), Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return;
            }

            if let Some(elimination) = &self.elimination {
                if elimination.try_push(value, &mut handle.rng) {
                    shield.recycle(id);
                    return;
                }
            }
        }
    }

    pub fn pop(&self, handle: &mut StackHandle<'_>) -> Option<Value> {
        self.check_handle(handle);

        let mut shield = handle.local.pin();

        loop {
            let top = self.top.load(Ordering::SeqCst)?;
            let node = shield.node(top);
            let next = node.next();

            if self
                .top
                .compare_exchange(Some(top), next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                let value = node.value();
                shield.retire(top);
                return Some(value);
            }

            if let Some(elimination) = &self.elimination {
                if let Some(value) = elimination.try_pop(&mut handle.rng) {
                    return Some(value);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.load(Ordering::SeqCst).is_none()
    }

    pub fn has_elimination(&self) -> bool {
        self.elimination.is_some()
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// The node currently on top, mostly useful to tests.
    pub fn top(&self) -> Option<NodeId> {
        self.top.load(Ordering::SeqCst)
    }

    #[inline]
    fn check_handle(&self, handle: &StackHandle<'_>) {
        debug_assert!(
            ptr::eq(handle.local.collector(), &self.collector),
            "handle belongs to a different stack"
        );
    }
}

impl Structure for TreiberStack {
    type Handle<'a> = StackHandle<'a>;

    fn name(&self) -> &'static str {
        if self.has_elimination() {
            "treiber-elimination"
        } else {
            "treiber"
        }
    }

    fn handle(&self, thread: usize) -> StackHandle<'_> {
        TreiberStack::handle(self, thread)
    }

    fn insert(&self, handle: &mut StackHandle<'_>, value: Value) {
        self.push(handle, value);
    }

    fn remove(&self, handle: &mut StackHandle<'_>) -> Option<Value> {
        self.pop(handle)
    }
}
