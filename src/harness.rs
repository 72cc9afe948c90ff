//! Drives a [`Structure`] from several threads the way the contention benchmarks do.
//!
//! Every thread registers with the structure, meets the others at a barrier, inserts its
//! share of values, removes until it sees the structure empty and meets the others
//! again. Thread 0 times the span between the two barrier episodes.

use crate::barrier::{Barrier, LocalSense, RawBarrier};
use crate::config::Config;
use crate::error::fatal;
use crate::structure::{Structure, Value};
use std::panic;
use std::thread;
use std::time::{Duration, Instant};

/// The per-thread context of a run.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    sense: LocalSense,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            sense: LocalSense::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the other workers. Returns true on one worker per episode.
    pub fn wait(&mut self, barrier: &Barrier) -> bool {
        barrier.wait(&mut self.sense)
    }

    /// The value the `i`th insert of this worker uses. Unique across a run.
    pub fn value(&self, iterations: usize, i: usize) -> Value {
        (self.id * iterations + i) as Value
    }

    fn push_pop<S: Structure>(
        &mut self,
        structure: &S,
        barrier: &Barrier,
        iterations: usize,
    ) -> (Vec<Value>, Option<Duration>) {
        let mut handle = structure.handle(self.id);

        self.wait(barrier);
        let start = Instant::now();

        for i in 0..iterations {
            structure.insert(&mut handle, self.value(iterations, i));
        }

        let mut removed = Vec::with_capacity(iterations);

        while let Some(value) = structure.remove(&mut handle) {
            removed.push(value);
        }

        self.wait(barrier);

        let elapsed = (self.id == 0).then(|| start.elapsed());
        (removed, elapsed)
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Time thread 0 spent between the two barrier episodes.
    pub elapsed: Duration,

    /// Values removed, per thread.
    pub removed: Vec<Vec<Value>>,

    /// Values inserted across all threads.
    pub inserted: usize,
}

impl RunReport {
    pub fn total_removed(&self) -> usize {
        self.removed.iter().map(Vec::len).sum()
    }

    /// Every removed value, sorted.
    pub fn sorted_removed(&self) -> Vec<Value> {
        let mut all: Vec<Value> = self.removed.iter().flatten().copied().collect();
        all.sort_unstable();
        all
    }

    /// Whether the removed values are exactly the inserted ones.
    pub fn is_conserved(&self) -> bool {
        let sorted = self.sorted_removed();
        sorted.len() == self.inserted && sorted.iter().zip(0..).all(|(&v, i)| v == i)
    }
}

/// Run the push-then-pop workload of `config` over `structure`.
///
/// The structure must accept handles for `config.threads` threads and none of them may
/// be held elsewhere during the run. An invalid configuration aborts the process.
pub fn run_push_pop<S: Structure>(structure: &S, config: &Config) -> RunReport {
    if let Err(error) = config.validate() {
        fatal(error);
    }

    let barrier = config.build_barrier();
    let iterations = config.iterations;

    tracing::debug!(
        structure = structure.name(),
        threads = config.threads,
        iterations,
        barrier = %config.barrier,
        "starting push/pop run"
    );

    let outcomes: Vec<(Vec<Value>, Option<Duration>)> = thread::scope(|scope| {
        let workers: Vec<_> = (0..config.threads)
            .map(|id| {
                let barrier = &barrier;
                scope.spawn(move || Worker::new(id).push_pop(structure, barrier, iterations))
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    });

    let mut elapsed = Duration::ZERO;
    let mut removed = Vec::with_capacity(outcomes.len());

    for (values, timed) in outcomes {
        if let Some(timed) = timed {
            elapsed = timed;
        }

        removed.push(values);
    }

    let report = RunReport {
        elapsed,
        removed,
        inserted: config.threads * iterations,
    };

    tracing::debug!(
        structure = structure.name(),
        elapsed_us = report.elapsed.as_micros() as u64,
        removed = report.total_removed(),
        "finished push/pop run"
    );

    report
}
