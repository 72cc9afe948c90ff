//! Epoch based reclamation for the arena backed lock-free structures.
//!
//! Each participating thread owns a slot in the reservation table. Pinning publishes the
//! current global epoch into that slot and unpinning resets it to [`Epoch::QUIESCENT`].
//! Unlinked nodes are retired together with the epoch observed at retirement and become
//! reusable once every reservation is strictly newer.

mod bag;
mod epoch;
mod local;
mod shield;

pub use epoch::Epoch;
pub use local::Local;
pub use shield::Shield;

use crate::arena::{Arena, NodeId};
use crate::CachePadded;
use bag::RetireList;
use core::sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering};
use epoch::AtomicEpoch;
use parking_lot::Mutex;

/// How often threads sweep their retire lists and advance the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimConfig {
    /// Operations between two sweeps of a thread's retire list.
    pub reclaim_interval: u32,

    /// Operations of the coordinator between two epoch advances.
    pub advance_interval: u32,

    /// The only slot allowed to advance the global epoch.
    pub coordinator: usize,
}

impl ReclaimConfig {
    pub fn with_reclaim_interval(mut self, reclaim_interval: u32) -> Self {
        self.reclaim_interval = reclaim_interval.max(1);
        self
    }

    pub fn with_advance_interval(mut self, advance_interval: u32) -> Self {
        self.advance_interval = advance_interval.max(1);
        self
    }

    pub fn with_coordinator(mut self, coordinator: usize) -> Self {
        self.coordinator = coordinator;
        self
    }
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            reclaim_interval: 500,
            advance_interval: 100,
            coordinator: 0,
        }
    }
}

/// A thread keeps at most this many reclaimed nodes to itself. The rest go to the
/// shared spare pool.
const FREE_LIMIT: usize = 256;

/// Nodes a thread with an empty free list takes from the spare pool at once.
const REFILL: usize = 64;

/// The shared half of the reclaimer: the global epoch, one reservation per thread and
/// the node arena the reclaimed indices point into.
pub struct Collector {
    arena: Arena,
    epoch: CachePadded<AtomicEpoch>,
    reservations: Box<[CachePadded<AtomicEpoch>]>,
    claimed: Box<[AtomicBool]>,

    /// Retire lists of dropped locals, adopted by the next registration of the same slot.
    orphans: Box<[Mutex<Option<RetireList>>]>,

    spare: Mutex<Vec<NodeId>>,
    spare_len: AtomicUsize,
    config: ReclaimConfig,
}

impl Collector {
    pub fn new(threads: usize, config: ReclaimConfig) -> Self {
        Self::with_capacity(threads, 0, config)
    }

    /// Like [`Collector::new`], with the arena pre-sized for `capacity` nodes.
    pub fn with_capacity(threads: usize, capacity: usize, config: ReclaimConfig) -> Self {
        assert!(threads > 0, "a collector needs at least one thread slot");
        assert!(
            config.coordinator < threads,
            "coordinator {} out of range for {} slots",
            config.coordinator,
            threads
        );

        tracing::debug!(threads, capacity, ?config, "creating epoch collector");

        Self {
            arena: Arena::with_capacity(capacity),
            epoch: CachePadded::new(AtomicEpoch::new(Epoch::ZERO)),
            reservations: (0..threads)
                .map(|_| CachePadded::new(AtomicEpoch::new(Epoch::QUIESCENT)))
                .collect(),
            claimed: (0..threads).map(|_| AtomicBool::new(false)).collect(),
            orphans: (0..threads).map(|_| Mutex::new(None)).collect(),
            spare: Mutex::new(Vec::new()),
            spare_len: AtomicUsize::new(0),
            config,
        }
    }

    pub fn threads(&self) -> usize {
        self.reservations.len()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &ReclaimConfig {
        &self.config
    }

    /// Claim the reservation slot of `thread`.
    ///
    /// # Panics
    ///
    /// Panics if `thread` is out of range or the slot is already held by a live [`Local`].
    pub fn register(&self, thread: usize) -> Local<'_> {
        assert!(
            thread < self.threads(),
            "thread index {} out of range for {} slots",
            thread,
            self.threads()
        );

        let taken = self.claimed[thread].swap(true, Ordering::Acquire);
        assert!(!taken, "reservation slot {} is already registered", thread);

        let retired = self.orphans[thread].lock().take();
        Local::new(self, thread, retired)
    }

    /// Nodes sitting in the shared spare pool.
    pub fn spare(&self) -> usize {
        self.spare_len.load(Ordering::Relaxed)
    }

    fn reservation(&self, slot: usize) -> &AtomicEpoch {
        &self.reservations[slot]
    }

    /// The oldest epoch any thread may still be reading under.
    fn min_reservation(&self) -> Epoch {
        fence(Ordering::SeqCst);

        self.reservations
            .iter()
            .map(|reservation| reservation.load(Ordering::SeqCst))
            .min()
            .unwrap_or(Epoch::QUIESCENT)
    }

    fn advance(&self) -> Epoch {
        let epoch = self.epoch.advance();
        tracing::trace!(?epoch, "advanced global epoch");
        epoch
    }

    fn donate<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut spare = self.spare.lock();
        spare.extend(nodes);
        self.spare_len.store(spare.len(), Ordering::Relaxed);
    }

    /// Move a batch of spare nodes into `free`. Returns false if the pool was empty.
    fn refill(&self, free: &mut Vec<NodeId>) -> bool {
        if self.spare_len.load(Ordering::Relaxed) == 0 {
            return false;
        }

        let mut spare = self.spare.lock();
        let keep = spare.len().saturating_sub(REFILL);
        free.extend(spare.drain(keep..));
        self.spare_len.store(spare.len(), Ordering::Relaxed);
        !free.is_empty()
    }

    fn unregister(&self, slot: usize, free: Vec<NodeId>, mut retired: RetireList) {
        if !free.is_empty() {
            self.donate(free);
        }

        {
            let mut orphans = self.orphans[slot].lock();

            match orphans.as_mut() {
                Some(list) => list.append(&mut retired),
                None => *orphans = Some(retired),
            }
        }

        self.claimed[slot].store(false, Ordering::Release);
    }
}
