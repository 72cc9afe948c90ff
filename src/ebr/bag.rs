use super::epoch::Epoch;
use crate::arena::NodeId;
use std::collections::VecDeque;
use tinyvec::ArrayVec;

const BAG_SIZE: usize = 32;

/// Nodes retired during the same epoch.
pub(crate) struct Bag {
    epoch: Epoch,
    nodes: ArrayVec<[NodeId; BAG_SIZE]>,
}

impl Bag {
    fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            nodes: ArrayVec::new(),
        }
    }

    fn accepts(&self, epoch: Epoch) -> bool {
        self.epoch == epoch && self.nodes.len() < BAG_SIZE
    }
}

/// A thread's retired nodes, in retirement order. Only the owning thread touches it.
pub(crate) struct RetireList {
    bags: VecDeque<Bag>,
    len: usize,
}

impl RetireList {
    pub(crate) fn new() -> Self {
        Self {
            bags: VecDeque::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn push(&mut self, epoch: Epoch, node: NodeId) {
        match self.bags.back_mut() {
            Some(bag) if bag.accepts(epoch) => bag.nodes.push(node),
            _ => {
                let mut bag = Bag::new(epoch);
                bag.nodes.push(node);
                self.bags.push_back(bag);
            }
        }

        self.len += 1;
    }

    /// Hand every node retired strictly before `bound` to `free` and return how many there were.
    pub(crate) fn reclaim<F>(&mut self, bound: Epoch, mut free: F) -> usize
    where
        F: FnMut(NodeId),
    {
        let mut freed = 0;

        self.bags.retain(|bag| {
            if bag.epoch < bound {
                bag.nodes.iter().copied().for_each(&mut free);
                freed += bag.nodes.len();
                false
            } else {
                true
            }
        });

        self.len -= freed;
        freed
    }

    /// Move every entry of `other` into this list.
    pub(crate) fn append(&mut self, other: &mut RetireList) {
        self.len += other.len;
        other.len = 0;
        self.bags.append(&mut other.bags);
    }
}
