//! Throughput and ETA reporting.

use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Report every this many completed accounts, and on the last one.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

const MIN_ELAPSED_SECS: f64 = 0.1;
const MIN_SPEED: f64 = 0.1;

/// One progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Accounts processed so far.
    pub done: usize,
    /// Accounts in the sweep.
    pub total: usize,
    /// Accounts per second since the sweep started.
    pub speed: f64,
    /// Estimated seconds until the sweep ends.
    pub eta_secs: f64,
}

impl ProgressSnapshot {
    /// Computes speed and ETA.
    ///
    /// Elapsed time is floored at 0.1s and speed at 0.1 acc/s so neither
    /// figure divides by zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(done: usize, total: usize, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64().max(MIN_ELAPSED_SECS);
        let speed = done as f64 / secs;
        let remaining = total.saturating_sub(done) as f64;
        Self {
            done,
            total,
            speed,
            eta_secs: remaining / speed.max(MIN_SPEED),
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {:.1} acc/s | ~{:.1}s left",
            self.done, self.total, self.speed, self.eta_secs
        )
    }
}

/// Decides when to emit a report and builds it.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    started: Instant,
    total: usize,
    every: usize,
}

impl Progress {
    /// Starts the clock for a sweep over `total` accounts.
    #[must_use]
    pub fn start(total: usize, every: usize) -> Self {
        Self {
            started: Instant::now(),
            total,
            every,
        }
    }

    /// True on every `every`-th completion and on the last one.
    #[must_use]
    pub const fn should_report(&self, done: usize) -> bool {
        done == self.total || (self.every > 0 && done % self.every == 0)
    }

    /// Snapshot for `done` completed accounts.
    #[must_use]
    pub fn snapshot(&self, done: usize) -> ProgressSnapshot {
        ProgressSnapshot::compute(done, self.total, self.started.elapsed())
    }

    /// Time since the sweep started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Receives progress reports from sweep workers.
///
/// Called concurrently from several workers; lines may interleave.
pub trait ProgressSink: Send + Sync + 'static {
    /// Called once before any account is probed.
    fn started(&self, _total: usize, _eligible: usize, _workers: usize) {}

    /// Handles one report.
    fn report(&self, snapshot: &ProgressSnapshot);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _snapshot: &ProgressSnapshot) {}
}

/// Rewrites a single console line with each report.
pub struct ConsoleProgress {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleProgress {
    /// Reports to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Reports to any writer.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleProgress").finish_non_exhaustive()
    }
}

impl ProgressSink for ConsoleProgress {
    fn started(&self, total: usize, eligible: usize, workers: usize) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(out, "Accounts: {total} total, {eligible} to check.");
        let _ = writeln!(out, "Using {workers} workers...");
        let _ = out.flush();
    }

    fn report(&self, snapshot: &ProgressSnapshot) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Console output is best effort.
        let _ = write!(out, "\r  {snapshot}    ");
        let _ = out.flush();
    }
}
