//! Lost updates from unsynchronized read-modify-write increments.
//!
//! `counter += 1` is a read, an add and a write. When several threads run
//! that sequence on the same cell without a lock or an atomic, increments
//! that interleave overwrite each other and are lost.

use std::{cell::UnsafeCell, ptr, thread};

use tracing::debug;

/// Number of worker threads per trial.
pub const NUM_WORKERS: usize = 10;
/// Increments performed by each worker.
pub const ITERATIONS: u64 = 100_000;
/// Number of trials.
pub const NUM_TRIALS: usize = 5;

/// A counter shared between threads with no synchronization at all.
pub struct UnsyncCounter {
    value: UnsafeCell<u64>,
}

/// Deliberately unsound: concurrent increments race on `value`. Volatile
/// accesses keep every read and write in the generated code, so the race
/// shows up as lost updates rather than being folded away.
unsafe impl Sync for UnsyncCounter {}

impl UnsyncCounter {
    pub fn new() -> Self {
        Self {
            value: UnsafeCell::new(0),
        }
    }

    /// Non-atomic `value += 1`.
    #[inline(never)]
    pub fn increment(&self) {
        let cell = self.value.get();
        unsafe {
            let current = ptr::read_volatile(cell);
            ptr::write_volatile(cell, current.wrapping_add(1));
        }
    }

    pub fn get(&self) -> u64 {
        unsafe { ptr::read_volatile(self.value.get()) }
    }

    pub fn reset(&self) {
        unsafe { ptr::write_volatile(self.value.get(), 0) }
    }
}

impl Default for UnsyncCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    pub trial: usize,
    pub final_value: u64,
    pub expected: u64,
}

impl TrialOutcome {
    pub fn lost(&self) -> u64 {
        self.expected.saturating_sub(self.final_value)
    }

    pub fn loss_percent(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        self.lost() as f64 / self.expected as f64 * 100.0
    }
}

/// Reset `counter`, run `workers` threads of `iterations` increments each
/// and join them.
pub fn run_trial(
    counter: &UnsyncCounter,
    trial: usize,
    workers: usize,
    iterations: u64,
) -> TrialOutcome {
    counter.reset();
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                for _ in 0..iterations {
                    counter.increment();
                }
            });
        }
    });

    let outcome = TrialOutcome {
        trial,
        final_value: counter.get(),
        expected: workers as u64 * iterations,
    };
    debug!("Trial {} finished: {:?}", trial, outcome);
    outcome
}

/// Run `trials` trials on one counter.
pub fn run_trials(trials: usize, workers: usize, iterations: u64) -> Vec<TrialOutcome> {
    let counter = UnsyncCounter::new();
    (0..trials)
        .map(|trial| run_trial(&counter, trial, workers, iterations))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_worker_loses_nothing() {
        let counter = UnsyncCounter::new();
        let outcome = run_trial(&counter, 0, 1, 10_000);
        assert_eq!(outcome.final_value, 10_000);
        assert_eq!(outcome.lost(), 0);
        assert_eq!(outcome.loss_percent(), 0.0);
    }

    #[test]
    fn test_final_value_bounded() {
        let workers = 4;
        let iterations = 50_000;
        for outcome in run_trials(3, workers, iterations) {
            assert_eq!(outcome.expected, workers as u64 * iterations);
            assert!(outcome.final_value <= outcome.expected);
            assert_eq!(outcome.lost(), outcome.expected - outcome.final_value);
            assert!((0.0..=100.0).contains(&outcome.loss_percent()));
        }
    }

    #[test]
    fn test_counter_reset_between_trials() {
        let counter = UnsyncCounter::new();
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
        let outcome = run_trial(&counter, 1, 2, 10);
        assert!(outcome.final_value <= 20);
        assert!(outcome.final_value >= 1);
    }

    #[test]
    fn test_loss_percent() {
        let outcome = TrialOutcome {
            trial: 0,
            final_value: 750,
            expected: 1_000,
        };
        assert_eq!(outcome.lost(), 250);
        assert_eq!(outcome.loss_percent(), 25.0);
    }
}
