//! Mutual exclusion with four interchangeable algorithms.
//!
//! Every algorithm implements [`RawLock`]. [`Lock`] picks one of them once at construction
//! time from a [`LockKind`] and dispatches through the trait from then on, so call sites never
//! branch on the variant. [`Mutex`] layers a guarded value with an RAII guard on top of any
//! raw lock.

mod mutex;
mod os;
mod tas;
mod ticket;
mod ttas;

pub use mutex::{Mutex, MutexGuard};
pub use os::OsLock;
pub use tas::TasLock;
pub use ticket::TicketLock;
pub use ttas::TtasLock;

use crate::backoff::SpinConfig;
use crate::error::{fatal, ConfigError};
use std::fmt;
use std::str::FromStr;

/// The interface shared by every lock algorithm.
pub trait RawLock: Send + Sync {
    /// Block until the calling thread owns the lock.
    fn acquire(&self);

    /// Take the lock if it is free right now. Never waits.
    fn try_acquire(&self) -> bool;

    /// Hand the lock back.
    ///
    /// # Safety
    /// The calling thread must currently hold the lock, through a successful
    /// [`acquire`](RawLock::acquire) or [`try_acquire`](RawLock::try_acquire).
    unsafe fn release(&self);
}

/// Selects a lock algorithm by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKind {
    /// Test-and-set.
    Tas,
    /// Test-and-test-and-set.
    Ttas,
    /// FIFO ticket lock.
    Ticket,
    /// Platform mutex that may park the thread.
    Os,
}

impl LockKind {
    pub const ALL: [LockKind; 4] = [LockKind::Tas, LockKind::Ttas, LockKind::Ticket, LockKind::Os];

    pub fn name(self) -> &'static str {
        match self {
            LockKind::Tas => "tas",
            LockKind::Ttas => "ttas",
            LockKind::Ticket => "ticket",
            LockKind::Os => "pthread",
        }
    }

    /// Whether waiters are served in arrival order.
    pub fn is_fair(self) -> bool {
        matches!(self, LockKind::Ticket)
    }
}

impl FromStr for LockKind {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "tas" => Ok(LockKind::Tas),
            "ttas" => Ok(LockKind::Ttas),
            "ticket" => Ok(LockKind::Ticket),
            "pthread" | "os" | "mutex" => Ok(LockKind::Os),
            other => Err(ConfigError::UnknownLock(other.to_owned())),
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for LockKind {
    fn default() -> Self {
        LockKind::Ticket
    }
}

/// A lock whose algorithm was chosen at construction.
pub struct Lock {
    kind: LockKind,
    raw: Box<dyn RawLock>,
}

impl Lock {
    pub fn new(kind: LockKind) -> Self {
        Self::with_spin(kind, SpinConfig::default())
    }

    pub fn with_spin(kind: LockKind, spin: SpinConfig) -> Self {
        let raw: Box<dyn RawLock> = match kind {
            LockKind::Tas => Box::new(TasLock::with_spin(spin)),
            LockKind::Ttas => Box::new(TtasLock::with_spin(spin)),
            LockKind::Ticket => Box::new(TicketLock::with_spin(spin)),
            LockKind::Os => Box::new(OsLock::new()),
        };

        Self { kind, raw }
    }

    /// Build a lock from its variant name. An unknown name aborts the process.
    pub fn from_name(name: &str) -> Self {
        match name.parse() {
            Ok(kind) => Self::new(kind),
            Err(error) => fatal(error),
        }
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }
}

impl RawLock for Lock {
    #[inline]
    fn acquire(&self) {
        self.raw.acquire();
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.raw.try_acquire()
    }

    #[inline]
    unsafe fn release(&self) {
        self.raw.release();
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new(LockKind::default())
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock").field("kind", &self.kind).finish()
    }
}
