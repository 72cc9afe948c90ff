use super::{LocalSense, RawBarrier};
use std::sync::Barrier;

/// The standard library barrier, which parks waiting threads.
pub struct OsBarrier {
    inner: Barrier,
    parties: usize,
}

impl OsBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: Barrier::new(parties),
            parties,
        }
    }
}

impl RawBarrier for OsBarrier {
    fn wait(&self, _sense: &mut LocalSense) -> bool {
        self.inner.wait().is_leader()
    }

    fn parties(&self) -> usize {
        self.parties
    }
}
