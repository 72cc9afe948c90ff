// LICENSE NOTICE: The progression used here follows the crossbeam backoff under the MIT license.

use core::cell::Cell;
use core::hint;

/// The largest step a backoff spins `2^step` hints for.
const MAX_SPIN_SHIFT: u32 = 63;

/// Bounds for the busy waits in this crate.
///
/// Every spinning loop (lock acquisition, barrier release, elimination delay, combining wait)
/// draws its wait times from a [`Backoff`] built from one of these, so tests can shrink or
/// stretch them without touching the algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinConfig {
    /// Steps up to this value spin `2^step` hints. Past it, `snooze` yields the thread.
    pub spin_limit: u32,
    /// Once the step counter passes this value the backoff reports completion.
    pub yield_limit: u32,
}

impl SpinConfig {
    /// `spin_limit` is capped at 63.
    pub const fn new(spin_limit: u32, yield_limit: u32) -> Self {
        Self {
            spin_limit: if spin_limit > MAX_SPIN_SHIFT {
                MAX_SPIN_SHIFT
            } else {
                spin_limit
            },
            yield_limit,
        }
    }

    /// Spin briefly and yield early. Useful when threads outnumber cores.
    pub const fn eager_yield() -> Self {
        Self::new(2, 4)
    }

    pub fn backoff(self) -> Backoff {
        Backoff::with_config(self)
    }
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self::new(6, 10)
    }
}

/// A `Backoff` instance allows a thread to wait for an increasing amount of time
/// on failure in order to reduce contention in lock-free algorithms.
#[derive(Debug)]
pub struct Backoff {
    step: Cell<u32>,
    config: SpinConfig,
}

impl Backoff {
    /// Create a instance with an internal counter starting at 0.
    pub fn new() -> Self {
        Self::with_config(SpinConfig::default())
    }

    pub fn with_config(config: SpinConfig) -> Self {
        Self {
            step: Cell::new(0),
            config,
        }
    }

    /// Reset the internal counter and thus the progression of wait times.
    pub fn reset(&self) {
        self.step.set(0);
    }

    /// Spin some time based on the internal counter and then increment it.
    pub fn spin(&self) {
        let shift = self.step.get().min(self.config.spin_limit).min(MAX_SPIN_SHIFT);

        for _ in 0..1_u64 << shift {
            hint::spin_loop();
        }

        if self.step.get() <= self.config.spin_limit {
            self.step.set(self.step.get() + 1);
        }
    }

    /// Wait some time based on the internal counter and then increment it.
    /// Once the spin budget is spent this yields the thread instead of burning the core.
    pub fn snooze(&self) {
        if self.step.get() <= self.config.spin_limit {
            for _ in 0..1_u64 << self.step.get().min(MAX_SPIN_SHIFT) {
                hint::spin_loop();
            }
        } else {
            std::thread::yield_now();
        }

        if self.step.get() <= self.config.yield_limit {
            self.step.set(self.step.get() + 1);
        }
    }

    /// If this method returns true, we've been waiting for long enough that the caller
    /// should give up on the current strategy and fall back to another one.
    pub fn is_completed(&self) -> bool {
        self.step.get() > self.config.yield_limit
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
