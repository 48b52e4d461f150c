//! Bounded worker pool that drains the work queue.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::aggregator::SweepAggregator;
use super::probe::{Classification, DEFAULT_PROBE_TIMEOUT, ProbeOutcome, probe};
use super::progress::{DEFAULT_PROGRESS_EVERY, NoProgress, Progress, ProgressSink};
use super::queue::WorkQueue;
use crate::account::Account;
use crate::provider::MailProvider;

/// Smallest pool used when there is work to do.
pub const MIN_WORKERS: usize = 8;

/// Default upper bound on concurrent workers.
pub const DEFAULT_MAX_WORKERS: usize = 60;

/// Number of workers for `eligible` accounts.
///
/// One worker per three accounts, at least [`MIN_WORKERS`], at most
/// `max_workers`, and never more than `eligible`.
#[must_use]
pub fn pool_size(eligible: usize, max_workers: usize) -> usize {
    (eligible / 3)
        .max(MIN_WORKERS)
        .min(max_workers.max(1))
        .min(eligible)
}

/// Tunables for one sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Timeout for each network call of a probe.
    pub probe_timeout: Duration,
    /// Upper bound passed to [`pool_size`].
    pub max_workers: usize,
    /// Fixed pool size, bypassing [`pool_size`].
    pub workers: Option<usize>,
    /// Report progress every this many accounts.
    pub progress_every: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_workers: DEFAULT_MAX_WORKERS,
            workers: None,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl SweepOptions {
    /// Sets the probe timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the worker cap.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Uses exactly `workers` workers.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the progress cadence.
    #[must_use]
    pub const fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }
}

/// Totals from one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Accounts in the ledger.
    pub total: usize,
    /// Accounts that were actually probed over the network.
    pub eligible: usize,
    /// Workers spawned.
    pub workers: usize,
    /// Accounts processed.
    pub checked: usize,
    /// Accounts found banned.
    pub banned: usize,
    /// Accounts with a rejected mailbox password.
    pub invalid_password: usize,
    /// Accounts on unsupported domains.
    pub unsupported: usize,
    /// Probes that failed.
    pub errors: usize,
    /// Wall-clock duration.
    pub elapsed: Duration,
    /// Outcomes that change an account's status, in completion order.
    pub outcomes: Vec<ProbeOutcome>,
}

impl SweepReport {
    /// Accounts per second over the whole sweep.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn speed(&self) -> f64 {
        self.total as f64 / self.elapsed.as_secs_f64().max(0.1)
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Done in {:.1}s ({:.1} acc/s)",
            self.elapsed.as_secs_f64(),
            self.speed()
        )?;
        writeln!(f, "  Total accounts: {}", self.total)?;
        writeln!(f, "  Checked: {}", self.checked)?;
        writeln!(f, "  Banned: {}", self.banned)?;
        writeln!(f, "  Invalid password: {}", self.invalid_password)?;
        write!(f, "  Unsupported (non-mail.tm): {}", self.unsupported)?;
        if self.errors > 0 {
            write!(f, "\n  Errors: {}", self.errors)?;
        }
        Ok(())
    }
}

/// Runs probes over a ledger snapshot with a fixed pool of tokio tasks.
pub struct Sweep<P> {
    provider: Arc<P>,
    options: SweepOptions,
    sink: Arc<dyn ProgressSink>,
}

impl<P: MailProvider> Sweep<P> {
    /// Creates a sweep that reports no progress.
    #[must_use]
    pub fn new(provider: Arc<P>, options: SweepOptions) -> Self {
        Self {
            provider,
            options,
            sink: Arc::new(NoProgress),
        }
    }

    /// Sends progress reports to `sink`.
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Probes every account once and returns the totals.
    ///
    /// Every index in `0..accounts.len()` is claimed by exactly one worker.
    /// Ineligible accounts are claimed too and count as checked without any
    /// network call. Returns once every worker has finished.
    pub async fn run(&self, accounts: &[Account]) -> SweepReport {
        let total = accounts.len();
        let eligible = accounts.iter().filter(|a| a.is_eligible()).count();
        if total == 0 {
            return SweepReport::default();
        }

        let workers = self
            .options
            .workers
            .unwrap_or_else(|| pool_size(eligible, self.options.max_workers))
            .clamp(1, total);
        debug!("Ban check: {total} accounts, {eligible} eligible, {workers} workers");
        self.sink.started(total, eligible, workers);

        let accounts: Arc<[Account]> = Arc::from(accounts);
        let queue = Arc::new(WorkQueue::new(total));
        let aggregator = Arc::new(SweepAggregator::new());
        let progress = Progress::start(total, self.options.progress_every);
        let timeout = self.options.probe_timeout;

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let provider = Arc::clone(&self.provider);
            let accounts = Arc::clone(&accounts);
            let queue = Arc::clone(&queue);
            let aggregator = Arc::clone(&aggregator);
            let sink = Arc::clone(&self.sink);

            tasks.spawn(async move {
                let mut handled = 0usize;
                while let Some(index) = queue.claim() {
                    let Some(account) = accounts.get(index) else {
                        break;
                    };
                    let outcome = probe(provider.as_ref(), index, account, timeout).await;
                    if outcome.classification == Classification::Error {
                        debug!("Probe of {} failed: {}", account.email, outcome.reason);
                    }
                    let done = aggregator.record(outcome);
                    if progress.should_report(done) {
                        sink.report(&progress.snapshot(done));
                    }
                    handled += 1;
                }
                (worker, handled)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((worker, handled)) => debug!("Worker {worker} handled {handled} accounts"),
                Err(e) => warn!("Ban check worker stopped unexpectedly: {e}"),
            }
        }
        if queue.claimed() < queue.total() {
            warn!(
                "Ban check ended with {} of {} accounts unclaimed",
                queue.total() - queue.claimed(),
                queue.total()
            );
        }

        let counters = aggregator.counters();
        SweepReport {
            total,
            eligible,
            workers,
            checked: counters.checked,
            banned: counters.banned,
            invalid_password: counters.invalid_password,
            unsupported: counters.unsupported,
            errors: counters.errors,
            elapsed: progress.elapsed(),
            outcomes: aggregator.take_changes(),
        }
    }
}
