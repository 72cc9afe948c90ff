use super::Local;
use crate::arena::{Arena, NodeId, NodeRef};

/// Proof that the owning thread has a published reservation.
///
/// While a shield is alive no node reachable at the time it was created will be
/// reclaimed. Dropping it clears the reservation and runs the periodic maintenance of
/// the owning [`Local`].
pub struct Shield<'l, 'c> {
    local: &'l mut Local<'c>,
}

impl<'l, 'c> Shield<'l, 'c> {
    pub(crate) fn new(local: &'l mut Local<'c>) -> Self {
        local.publish();
        Self { local }
    }

    pub fn arena(&self) -> &'c Arena {
        self.local.collector().arena()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> NodeRef<'c> {
        self.arena().get(id)
    }

    /// Initialize a private node, reusing a reclaimed index when one is available.
    pub fn alloc(&mut self, value: i64) -> NodeId {
        let recycled = self.local.take_free();
        self.arena().alloc(recycled, value)
    }

    /// Hand back a node that was never published.
    pub fn recycle(&mut self, id: NodeId) {
        self.local.give_back(id);
    }

    /// Defer reuse of a node that has just been unlinked from a shared structure.
    pub fn retire(&mut self, id: NodeId) {
        self.local.retire(id);
    }
}

impl<'l, 'c> Drop for Shield<'l, 'c> {
    #[inline]
    fn drop(&mut self) {
        self.local.unpin();
    }
}
