use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// A value of the global epoch clock.
///
/// Epochs only ever grow. The largest value is reserved to mark a reservation slot
/// whose thread is not inside an operation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch {
    data: u64,
}

impl Epoch {
    pub const ZERO: Self = Self::from_raw(0);
    pub const QUIESCENT: Self = Self::from_raw(u64::MAX);

    const fn from_raw(data: u64) -> Self {
        Self { data }
    }

    pub fn into_raw(self) -> u64 {
        self.data
    }

    pub fn is_quiescent(self) -> bool {
        self == Self::QUIESCENT
    }

    pub fn next(self) -> Self {
        debug_assert!(self.data < u64::MAX - 1);
        Self::from_raw(self.data + 1)
    }
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_quiescent() {
            f.write_str("Epoch(quiescent)")
        } else {
            write!(f, "Epoch({})", self.data)
        }
    }
}

pub(crate) struct AtomicEpoch {
    raw: AtomicU64,
}

impl AtomicEpoch {
    pub(crate) fn new(epoch: Epoch) -> Self {
        Self {
            raw: AtomicU64::new(epoch.into_raw()),
        }
    }

    pub(crate) fn load(&self, order: Ordering) -> Epoch {
        Epoch::from_raw(self.raw.load(order))
    }

    pub(crate) fn store(&self, epoch: Epoch, order: Ordering) {
        self.raw.store(epoch.into_raw(), order);
    }

    /// Step the clock forward by one and return the new epoch.
    pub(crate) fn advance(&self) -> Epoch {
        let previous = self.raw.fetch_add(1, Ordering::SeqCst);
        Epoch::from_raw(previous).next()
    }
}
