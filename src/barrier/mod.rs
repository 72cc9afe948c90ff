//! Rendezvous points for a fixed number of threads.
//!
//! [`RawBarrier`] is implemented by a sense-reversing spin barrier and by the platform
//! barrier. [`Barrier`] selects one at construction time from a [`BarrierKind`].

mod os;
mod sense;

pub use os::OsBarrier;
pub use sense::SenseBarrier;

use crate::backoff::SpinConfig;
use crate::error::{fatal, ConfigError};
use std::fmt;
use std::str::FromStr;

/// The private flag each thread flips every time it waits on a sense-reversing barrier.
///
/// It lives with the thread, never in the barrier, so one barrier can serve any
/// set of threads without thread-local storage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocalSense(bool);

impl LocalSense {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the sense and return the new value.
    #[inline]
    pub(crate) fn flip(&mut self) -> bool {
        self.0 = !self.0;
        self.0
    }
}

/// The interface shared by every barrier algorithm.
pub trait RawBarrier: Send + Sync {
    /// Block until `parties` threads have called `wait` for the current episode.
    /// Returns true on exactly one thread per episode.
    fn wait(&self, sense: &mut LocalSense) -> bool;

    /// The number of threads that make up an episode.
    fn parties(&self) -> usize;
}

/// Selects a barrier algorithm by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarrierKind {
    /// Sense-reversing spin barrier.
    Sense,
    /// Platform barrier.
    Os,
}

impl BarrierKind {
    pub const ALL: [BarrierKind; 2] = [BarrierKind::Sense, BarrierKind::Os];

    pub fn name(self) -> &'static str {
        match self {
            BarrierKind::Sense => "sense",
            BarrierKind::Os => "pthread",
        }
    }
}

impl FromStr for BarrierKind {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "sense" => Ok(BarrierKind::Sense),
            "pthread" | "os" => Ok(BarrierKind::Os),
            other => Err(ConfigError::UnknownBarrier(other.to_owned())),
        }
    }
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for BarrierKind {
    fn default() -> Self {
        BarrierKind::Sense
    }
}

/// A barrier whose algorithm was chosen at construction.
pub struct Barrier {
    kind: BarrierKind,
    raw: Box<dyn RawBarrier>,
}

impl Barrier {
    pub fn new(kind: BarrierKind, parties: usize) -> Self {
        Self::with_spin(kind, parties, SpinConfig::default())
    }

    pub fn with_spin(kind: BarrierKind, parties: usize, spin: SpinConfig) -> Self {
        assert!(parties > 0, "a barrier needs at least one party");

        let raw: Box<dyn RawBarrier> = match kind {
            BarrierKind::Sense => Box::new(SenseBarrier::with_spin(parties, spin)),
            BarrierKind::Os => Box::new(OsBarrier::new(parties)),
        };

        Self { kind, raw }
    }

    /// Build a barrier from its variant name. An unknown name aborts the process.
    pub fn from_name(name: &str, parties: usize) -> Self {
        match name.parse() {
            Ok(kind) => Self::new(kind, parties),
            Err(error) => fatal(error),
        }
    }

    pub fn kind(&self) -> BarrierKind {
        self.kind
    }
}

impl RawBarrier for Barrier {
    #[inline]
    fn wait(&self, sense: &mut LocalSense) -> bool {
        self.raw.wait(sense)
    }

    fn parties(&self) -> usize {
        self.raw.parties()
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("kind", &self.kind)
            .field("parties", &self.parties())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Barrier, BarrierKind, LocalSense, RawBarrier};
    use crate::error::ConfigError;

    #[test]
    fn parses_every_variant_name() {
        for kind in BarrierKind::ALL {
            assert_eq!(kind.name().parse::<BarrierKind>(), Ok(kind));
        }

        assert_eq!(
            "tournament".parse::<BarrierKind>(),
            Err(ConfigError::UnknownBarrier("tournament".into()))
        );
    }

    #[test]
    fn single_party_never_blocks() {
        for kind in BarrierKind::ALL {
            let barrier = Barrier::new(kind, 1);
            let mut sense = LocalSense::new();

            for _ in 0..3 {
                assert!(barrier.wait(&mut sense));
            }
        }
    }
}
