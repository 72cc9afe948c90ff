use crate::backoff::SpinConfig;
use crate::barrier::{Barrier, BarrierKind};
use crate::ebr::ReclaimConfig;
use crate::elimination::EliminationArray;
use crate::error::{fatal, ConfigError};
use crate::lock::{Lock, LockKind};

/// Which contention reducing paths the locked structures take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Optimizations {
    pub combining: bool,
    pub elimination: bool,
}

impl Optimizations {
    pub const NONE: Self = Self::new(false, false);
    pub const COMBINING: Self = Self::new(true, false);
    pub const ELIMINATION: Self = Self::new(false, true);
    pub const ALL: Self = Self::new(true, true);

    pub const fn new(combining: bool, elimination: bool) -> Self {
        Self {
            combining,
            elimination,
        }
    }

    pub fn is_none(self) -> bool {
        !self.combining && !self.elimination
    }
}

/// Everything a structure or a benchmark run needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub threads: usize,
    pub iterations: usize,
    pub lock: LockKind,
    pub barrier: BarrierKind,
    pub optimizations: Optimizations,

    /// Backoff of the spin locks, the spin barrier and the combining wait.
    pub spin: SpinConfig,

    /// How long a thread parks in an elimination slot before giving up.
    pub elimination_delay: SpinConfig,

    /// Overrides [`EliminationArray::default_len`].
    pub elimination_slots: Option<usize>,

    pub reclaim: ReclaimConfig,
}

impl Config {
    pub fn new(threads: usize, iterations: usize) -> Self {
        Self {
            threads,
            iterations,
            ..Self::default()
        }
    }

    /// Build a configuration from variant names, aborting on an unknown name.
    pub fn from_names(lock: &str, barrier: &str, threads: usize, iterations: usize) -> Self {
        match Self::parse(lock, barrier, threads, iterations) {
            Ok(config) => config,
            Err(error) => fatal(error),
        }
    }

    /// Like [`Config::from_names`] but hands the error back.
    pub fn parse(
        lock: &str,
        barrier: &str,
        threads: usize,
        iterations: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self::new(threads, iterations)
            .with_lock(lock.parse()?)
            .with_barrier(barrier.parse()?);

        config.validate()?;
        Ok(config)
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_lock(mut self, lock: LockKind) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_barrier(mut self, barrier: BarrierKind) -> Self {
        self.barrier = barrier;
        self
    }

    pub fn with_optimizations(mut self, optimizations: Optimizations) -> Self {
        self.optimizations = optimizations;
        self
    }

    pub fn with_spin(mut self, spin: SpinConfig) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_elimination_delay(mut self, delay: SpinConfig) -> Self {
        self.elimination_delay = delay;
        self
    }

    pub fn with_elimination_slots(mut self, slots: usize) -> Self {
        self.elimination_slots = Some(slots);
        self
    }

    pub fn with_reclaim(mut self, reclaim: ReclaimConfig) -> Self {
        self.reclaim = reclaim;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }

        if self.reclaim.coordinator >= self.threads {
            return Err(ConfigError::CoordinatorOutOfRange {
                coordinator: self.reclaim.coordinator,
                threads: self.threads,
            });
        }

        Ok(())
    }

    pub fn elimination_len(&self) -> usize {
        self.elimination_slots
            .unwrap_or_else(|| EliminationArray::default_len(self.threads, self.iterations))
    }

    /// Nodes a push/pop run over the lock-free structures touches before recycling kicks in.
    pub fn node_capacity(&self) -> usize {
        self.threads.saturating_mul(self.iterations).saturating_add(1)
    }

    pub fn build_lock(&self) -> Lock {
        Lock::with_spin(self.lock, self.spin)
    }

    pub fn build_barrier(&self) -> Barrier {
        Barrier::with_spin(self.barrier, self.threads, self.spin)
    }

    pub fn build_elimination(&self) -> EliminationArray {
        EliminationArray::new(self.elimination_len(), self.elimination_delay)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            iterations: 1000,
            lock: LockKind::default(),
            barrier: BarrierKind::default(),
            optimizations: Optimizations::NONE,
            spin: SpinConfig::default(),
            elimination_delay: SpinConfig::default(),
            elimination_slots: None,
            reclaim: ReclaimConfig::default(),
        }
    }
}
