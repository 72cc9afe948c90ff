use crate::combining::Operation;
use core::ptr;

/// A single-threaded container the locked structures wrap.
pub trait Sequential: Send {
    fn insert(&mut self, value: i64);
    fn remove(&mut self) -> Option<i64>;

    fn apply(&mut self, op: Operation) -> Option<i64> {
        match op {
            Operation::Insert(value) => {
                self.insert(value);
                None
            }
            Operation::Remove => self.remove(),
        }
    }
}

struct Node {
    value: i64,
    next: Option<Box<Node>>,
}

/// Unlink nodes one by one so a long list does not recurse on drop.
fn drop_chain(mut head: Option<Box<Node>>) {
    while let Some(mut node) = head {
        head = node.next.take();
    }
}

#[derive(Default)]
pub struct LinkedStack {
    top: Option<Box<Node>>,
    len: usize,
}

impl LinkedStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }
}

impl Sequential for LinkedStack {
    fn insert(&mut self, value: i64) {
        let next = self.top.take();
        self.top = Some(Box::new(Node { value, next }));
        self.len += 1;
    }

    fn remove(&mut self) -> Option<i64> {
        let node = self.top.take()?;
        self.top = node.next;
        self.len -= 1;
        Some(node.value)
    }
}

impl Drop for LinkedStack {
    fn drop(&mut self) {
        drop_chain(self.top.take());
    }
}

/// FIFO list with an owned head and a raw pointer to the last node.
pub struct LinkedQueue {
    head: Option<Box<Node>>,
    tail: *mut Node,
    len: usize,
}

// The tail pointer only ever points into the list owned by `head`.
unsafe impl Send for LinkedQueue {}

impl LinkedQueue {
    pub fn new() -> Self {
        Self {
            head: None,
            tail: ptr::null_mut(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl Default for LinkedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequential for LinkedQueue {
    fn insert(&mut self, value: i64) {
        let mut node = Box::new(Node { value, next: None });
        let raw: *mut Node = &mut *node;

        if self.tail.is_null() {
            self.head = Some(node);
        } else {
            unsafe {
                (*self.tail).next = Some(node);
            }
        }

        self.tail = raw;
        self.len += 1;
    }

    fn remove(&mut self) -> Option<i64> {
        let node = self.head.take()?;
        self.head = node.next;

        if self.head.is_none() {
            self.tail = ptr::null_mut();
        }

        self.len -= 1;
        Some(node.value)
    }
}

impl Drop for LinkedQueue {
    fn drop(&mut self) {
        self.tail = ptr::null_mut();
        drop_chain(self.head.take());
    }
}
