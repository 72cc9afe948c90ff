use super::{bag::RetireList, epoch::Epoch, shield::Shield, Collector, FREE_LIMIT};
use crate::arena::NodeId;
use core::sync::atomic::Ordering;

/// A thread's registration with a [`Collector`].
///
/// Owns the thread's reservation slot, its retire list and the free list of reclaimed
/// nodes it will hand out again. A `Local` is tied to one thread at a time but may be
/// moved between threads while it is not pinned.
pub struct Local<'c> {
    collector: &'c Collector,
    slot: usize,
    retired: RetireList,
    free: Vec<NodeId>,
    operations: u32,
}

impl<'c> Local<'c> {
    pub(crate) fn new(
        collector: &'c Collector,
        slot: usize,
        retired: Option<RetireList>,
    ) -> Self {
        Self {
            collector,
            slot,
            retired: retired.unwrap_or_else(RetireList::new),
            free: Vec::new(),
            operations: 0,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn collector(&self) -> &'c Collector {
        self.collector
    }

    /// Publish a reservation and enter a protected region.
    pub fn pin(&mut self) -> Shield<'_, 'c> {
        Shield::new(self)
    }

    /// Sweep the retire list now and return how many nodes became reusable.
    pub fn reclaim(&mut self) -> usize {
        if self.retired.is_empty() {
            return 0;
        }

        let bound = self.collector.min_reservation();
        let arena = self.collector.arena();
        let free = &mut self.free;

        let freed = self.retired.reclaim(bound, |id| {
            arena.release(id);
            free.push(id);
        });

        if self.free.len() > FREE_LIMIT {
            self.collector.donate(self.free.drain(FREE_LIMIT / 2..));
        }

        tracing::trace!(
            slot = self.slot,
            ?bound,
            freed,
            pending = self.retired.len(),
            "swept retire list"
        );

        freed
    }

    /// Number of retired nodes still waiting for their grace period.
    pub fn retired(&self) -> usize {
        self.retired.len()
    }

    /// Number of reclaimed nodes ready to be handed out again.
    pub fn recyclable(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn publish(&self) {
        let epoch = self.collector.epoch.load(Ordering::SeqCst);
        self.collector
            .reservation(self.slot)
            .store(epoch, Ordering::SeqCst);
    }

    pub(crate) fn unpin(&mut self) {
        self.collector
            .reservation(self.slot)
            .store(Epoch::QUIESCENT, Ordering::Release);

        self.operations = self.operations.wrapping_add(1);
        let config = self.collector.config();

        if self.slot == config.coordinator && self.operations % config.advance_interval.max(1) == 0
        {
            self.collector.advance();
        }

        if self.operations % config.reclaim_interval.max(1) == 0 {
            self.reclaim();
        }
    }

    pub(crate) fn retire(&mut self, id: NodeId) {
        let epoch = self.collector.epoch.load(Ordering::SeqCst);
        self.retired.push(epoch, id);
    }

    pub(crate) fn take_free(&mut self) -> Option<NodeId> {
        if self.free.is_empty() && !self.collector.refill(&mut self.free) {
            return None;
        }

        self.free.pop()
    }

    pub(crate) fn give_back(&mut self, id: NodeId) {
        self.collector.arena().release(id);
        self.free.push(id);
    }
}

impl<'c> Drop for Local<'c> {
    fn drop(&mut self) {
        self.reclaim();

        let free = std::mem::take(&mut self.free);
        let retired = std::mem::replace(&mut self.retired, RetireList::new());
        self.collector.unregister(self.slot, free, retired);
    }
}
