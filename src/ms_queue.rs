//! The Michael-Scott lock-free queue.

use crate::arena::{Link, NodeId};
use crate::config::Config;
use crate::ebr::{Collector, Local};
use crate::structure::{Structure, Value};
use crate::CachePadded;
use core::ptr;
use core::sync::atomic::Ordering;

/// Per-thread state for an [`MsQueue`].
pub struct QueueHandle<'q> {
    local: Local<'q>,
}

impl<'q> QueueHandle<'q> {
    pub fn thread(&self) -> usize {
        self.local.slot()
    }

    pub fn local(&mut self) -> &mut Local<'q> {
        &mut self.local
    }
}

/// A lock-free FIFO queue.
///
/// `head` always points at a dummy node whose successor holds the oldest value, and
/// `tail` points at the last or second to last node. Any thread that finds `tail`
/// lagging swings it forward before doing anything else.
pub struct MsQueue {
    head: CachePadded<Link>,
    tail: CachePadded<Link>,
    collector: Collector,
}

impl MsQueue {
    pub fn new(config: &Config) -> Self {
        tracing::debug!(threads = config.threads, "creating michael-scott queue");

        let collector = Collector::with_capacity(
            config.threads,
            config.node_capacity(),
            config.reclaim,
        );

        let dummy = collector.arena().alloc(None, 0);

        Self {
            head: CachePadded::new(Link::new(Some(dummy))),
            tail: CachePadded::new(Link::new(Some(dummy))),
            collector,
        }
    }

    /// Register `thread` with the queue.
    ///
    /// # Panics
    ///
    /// Panics if `thread` is out of range or already has a live handle.
    pub fn handle(&self, thread: usize) -> QueueHandle<'_> {
        QueueHandle {
            local: self.collector.register(thread),
        }
    }

    pub fn enqueue(&self, handle: &mut QueueHandle<'_>, value: Value) {
        self.check_handle(handle);

        let mut shield = handle.local.pin();
        let id = shield.alloc(value);

        loop {
            let tail = sentinel(&self.tail);
            let tail_node = shield.node(tail);
            let next = tail_node.next();

            if Some(tail) != self.tail.load(Ordering::SeqCst) {
                continue;
            }

            match next {
                None => {
                    if tail_node
                        .link()
                        .compare_exchange(None, Some(id), Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        let _ = self.tail.compare_exchange(
                            Some(tail),
                            Some(id),
                            Ordering::SeqCst,
                            Ordering::SeqCst,
                        );
                        return;
                    }
                }
                Some(next) => {
                    let _ = self.tail.compare_exchange(
                        Some(tail),
                        Some(next),
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                }
            }
        }
    }

    pub fn dequeue(&self, handle: &mut QueueHandle<'_>) -> Option<Value> {
        self.check_handle(handle);

        let mut shield = handle.local.pin();

        loop {
            let head = sentinel(&self.head);
            let tail = sentinel(&self.tail);
            let next = shield.node(head).next();

            if Some(head) != self.head.load(Ordering::SeqCst) {
                continue;
            }

            let next = match next {
                Some(next) => next,
                None if head == tail => return None,
                None => continue,
            };

            if head == tail {
                let _ = self.tail.compare_exchange(
                    Some(tail),
                    Some(next),
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                continue;
            }

            // The successor may be dequeued and retired as soon as head moves past it.
            let value = shield.node(next).value();

            if self
                .head
                .compare_exchange(Some(head), Some(next), Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                shield.retire(head);
                return Some(value);
            }
        }
    }

    /// Only meaningful while no other thread is operating on the queue.
    pub fn is_empty(&self) -> bool {
        let head = sentinel(&self.head);
        self.collector.arena().get(head).next().is_none()
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    #[inline]
    fn check_handle(&self, handle: &QueueHandle<'_>) {
        debug_assert!(
            ptr::eq(handle.local.collector(), &self.collector),
            "handle belongs to a different queue"
        );
    }
}

#[inline]
fn sentinel(link: &Link) -> NodeId {
    match link.load(Ordering::SeqCst) {
        Some(id) => id,
        None => unreachable!("queue head and tail always point at a node"),
    }
}

impl Structure for MsQueue {
    type Handle<'a> = QueueHandle<'a>;

    fn name(&self) -> &'static str {
        "michael-scott"
    }

    fn handle(&self, thread: usize) -> QueueHandle<'_> {
        MsQueue::handle(self, thread)
    }

    fn insert(&self, handle: &mut QueueHandle<'_>, value: Value) {
        self.enqueue(handle, value);
    }

    fn remove(&self, handle: &mut QueueHandle<'_>) -> Option<Value> {
        self.dequeue(handle)
    }
}
