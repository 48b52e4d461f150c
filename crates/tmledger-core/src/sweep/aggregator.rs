//! Shared sweep counters and the list of pending status changes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::probe::{Classification, ProbeOutcome};

/// Lock-free per-classification counters.
#[derive(Debug, Default)]
pub struct SweepCounters {
    checked: AtomicUsize,
    banned: AtomicUsize,
    invalid_password: AtomicUsize,
    unsupported: AtomicUsize,
    errors: AtomicUsize,
}

/// Point-in-time copy of [`SweepCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Accounts processed, eligible or not.
    pub checked: usize,
    /// Accounts found banned.
    pub banned: usize,
    /// Accounts whose mailbox password was rejected.
    pub invalid_password: usize,
    /// Accounts on a domain the provider does not serve.
    pub unsupported: usize,
    /// Probes that failed on transport or protocol errors.
    pub errors: usize,
}

impl SweepCounters {
    /// Counts one outcome and returns the new `checked` total.
    pub fn record(&self, classification: Classification) -> usize {
        match classification {
            Classification::Banned => {
                self.banned.fetch_add(1, Ordering::Relaxed);
            }
            Classification::InvalidPassword => {
                self.invalid_password.fetch_add(1, Ordering::Relaxed);
            }
            Classification::UnsupportedDomain => {
                self.unsupported.fetch_add(1, Ordering::Relaxed);
            }
            Classification::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
            Classification::Ok => {}
        }
        self.checked.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Reads every counter.
    ///
    /// Only exact once all workers have stopped.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            checked: self.checked.load(Ordering::Relaxed),
            banned: self.banned.load(Ordering::Relaxed),
            invalid_password: self.invalid_password.load(Ordering::Relaxed),
            unsupported: self.unsupported.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Collects probe outcomes from all workers.
///
/// Counters are atomics; outcomes that change an account's status are
/// appended under a mutex that is held only for the push.
#[derive(Debug, Default)]
pub struct SweepAggregator {
    counters: SweepCounters,
    changes: Mutex<Vec<ProbeOutcome>>,
}

impl SweepAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome and returns how many accounts are done so far.
    pub fn record(&self, outcome: ProbeOutcome) -> usize {
        let done = self.counters.record(outcome.classification);
        if outcome.classification.status_change().is_some() {
            self.changes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(outcome);
        }
        done
    }

    /// Current counter values.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Takes the collected status changes, leaving the list empty.
    pub fn take_changes(&self) -> Vec<ProbeOutcome> {
        std::mem::take(&mut *self.changes.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
