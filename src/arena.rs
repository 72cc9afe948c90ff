//! Index addressed node storage for the lock-free structures.
//!
//! Nodes are never handed back to the allocator while a structure is alive. A node that
//! has been retired and passed its grace period goes onto the free list of the thread
//! that reclaimed it and is reused by that thread's next allocation. Links are 32-bit
//! indices, so a compare-and-swap on a link is a single word operation, and every node
//! field is an atomic, which keeps this module free of `unsafe`.

use crate::CachePadded;
use core::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use once_cell::sync::OnceCell;

#[cfg(debug_assertions)]
use core::sync::atomic::AtomicBool;

/// log2 of the size of the first segment.
const BASE_SHIFT: u32 = 6;

/// Segment `k` holds `64 << k` nodes. 26 segments span just under the u32 index space.
const SEGMENTS: usize = 26;

const NIL: u32 = u32::MAX;

/// One past the largest index the segments can address.
const MAX_NODES: u32 = (((1_u64 << SEGMENTS) - 1) << BASE_SHIFT) as u32;

/// The address of a node inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// An atomic, nullable reference to a node.
pub(crate) struct Link {
    raw: AtomicU32,
}

impl Link {
    pub(crate) const fn null() -> Self {
        Self {
            raw: AtomicU32::new(NIL),
        }
    }

    pub(crate) fn new(id: Option<NodeId>) -> Self {
        Self {
            raw: AtomicU32::new(encode(id)),
        }
    }

    #[inline]
    pub(crate) fn load(&self, order: Ordering) -> Option<NodeId> {
        decode(self.raw.load(order))
    }

    #[inline]
    pub(crate) fn store(&self, id: Option<NodeId>, order: Ordering) {
        self.raw.store(encode(id), order);
    }

    #[inline]
    pub(crate) fn compare_exchange(
        &self,
        current: Option<NodeId>,
        new: Option<NodeId>,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Option<NodeId>, Option<NodeId>> {
        self.raw
            .compare_exchange(encode(current), encode(new), success, failure)
            .map(decode)
            .map_err(decode)
    }
}

#[inline]
fn encode(id: Option<NodeId>) -> u32 {
    id.map_or(NIL, |id| id.0)
}

#[inline]
fn decode(raw: u32) -> Option<NodeId> {
    if raw == NIL {
        None
    } else {
        Some(NodeId(raw))
    }
}

pub(crate) struct Node {
    value: AtomicI64,
    next: Link,

    /// Cleared when the node is freed.
    #[cfg(debug_assertions)]
    live: AtomicBool,

    /// Bumped every time the node is freed, so a [`NodeRef`] taken earlier can tell that
    /// its index has been freed since, even once it is handed out again.
    #[cfg(debug_assertions)]
    generation: AtomicU32,
}

impl Node {
    fn vacant() -> Self {
        Self {
            value: AtomicI64::new(0),
            next: Link::null(),
            #[cfg(debug_assertions)]
            live: AtomicBool::new(false),
            #[cfg(debug_assertions)]
            generation: AtomicU32::new(0),
        }
    }
}

/// A node looked up by index.
///
/// In debug builds every read asserts that the node has not been freed since the lookup,
/// so a node dereferenced past its grace period fails loudly whether or not its index
/// has been reused in the meantime.
#[derive(Clone, Copy)]
pub(crate) struct NodeRef<'a> {
    node: &'a Node,
    #[cfg(debug_assertions)]
    generation: u32,
}

impl<'a> NodeRef<'a> {
    fn new(node: &'a Node) -> Self {
        Self {
            node,
            #[cfg(debug_assertions)]
            generation: node.generation.load(Ordering::Acquire),
        }
    }

    #[inline]
    fn check(&self) {
        #[cfg(debug_assertions)]
        {
            assert!(
                self.node.live.load(Ordering::Acquire),
                "read through a node that has already been reclaimed"
            );
            assert!(
                self.node.generation.load(Ordering::Acquire) == self.generation,
                "read through a node that was reclaimed and reused after it was looked up"
            );
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> i64 {
        self.check();
        self.node.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<NodeId> {
        self.check();
        self.node.next.load(Ordering::Acquire)
    }

    /// Only valid while the node is private to the calling thread.
    #[inline]
    pub(crate) fn set_next(&self, next: Option<NodeId>) {
        self.node.next.store(next, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn link(&self) -> &'a Link {
        self.check();
        &self.node.next
    }
}

pub struct Arena {
    segments: [OnceCell<Box<[Node]>>; SEGMENTS],
    next_fresh: CachePadded<AtomicU32>,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            segments: Default::default(),
            next_fresh: CachePadded::new(AtomicU32::new(0)),
        }
    }

    /// Create an arena that can hand out `capacity` fresh nodes without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let arena = Self::new();

        if capacity > 0 {
            let last = capacity.min(MAX_NODES as usize) - 1;
            let (segment, _) = locate(last as u32);

            for k in 0..=segment {
                arena.segment(k);
            }
        }

        arena
    }

    /// Initialize a node and return its address. The node is private to the caller
    /// until it is published through a link.
    pub(crate) fn alloc(&self, recycled: Option<NodeId>, value: i64) -> NodeId {
        let id = recycled.unwrap_or_else(|| self.fresh());
        let node = self.slot(id);

        node.value.store(value, Ordering::Relaxed);
        node.next.store(None, Ordering::Relaxed);

        #[cfg(debug_assertions)]
        node.live.store(true, Ordering::Release);

        id
    }

    /// Mark a node as free. Its index must not be reachable from any thread anymore.
    pub(crate) fn release(&self, id: NodeId) {
        let _node = self.slot(id);

        #[cfg(debug_assertions)]
        {
            _node.live.store(false, Ordering::Release);
            _node.generation.fetch_add(1, Ordering::Release);
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self.slot(id))
    }

    /// The number of distinct nodes ever handed out.
    pub fn allocated(&self) -> usize {
        self.next_fresh.load(Ordering::Relaxed) as usize
    }

    /// The number of node slots backed by memory.
    pub fn capacity(&self) -> usize {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.get().is_some())
            .map(|(k, _)| segment_len(k))
            .sum()
    }

    fn fresh(&self) -> NodeId {
        let raw = self.next_fresh.fetch_add(1, Ordering::Relaxed);
        assert!(raw < MAX_NODES, "node arena exhausted");
        NodeId(raw)
    }

    #[inline]
    fn slot(&self, id: NodeId) -> &Node {
        let (segment, offset) = locate(id.0);
        &self.segment(segment)[offset]
    }

    fn segment(&self, k: usize) -> &[Node] {
        self.segments[k].get_or_init(|| (0..segment_len(k)).map(|_| Node::vacant()).collect())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

fn segment_len(k: usize) -> usize {
    1 << (BASE_SHIFT as usize + k)
}

/// Map an index to its segment and the offset inside that segment.
#[inline]
fn locate(index: u32) -> (usize, usize) {
    let bucket = (index as u64 >> BASE_SHIFT) + 1;
    let segment = 63 - bucket.leading_zeros() as usize;
    let start = ((1_u64 << segment) - 1) << BASE_SHIFT;
    (segment, (index as u64 - start) as usize)
}
