//! Ban check - concurrent login-and-scan sweep over the ledger.
//!
//! This module provides:
//! - **Probe**: log into one mailbox and classify it from its inbox
//! - **Work queue**: a shared atomic cursor handing out account indices
//! - **Worker pool**: a fixed set of tokio tasks draining the queue
//! - **Aggregator**: atomic counters plus the list of status changes
//! - **Progress**: periodic throughput/ETA snapshots
//! - **Reconcile**: applies status changes once every worker has finished
//!
//! # Flow
//!
//! 1. The ledger is loaded once and the eligible accounts are counted
//! 2. The pool is sized from that count (see [`pool_size`])
//! 3. Workers claim indices until the queue is exhausted; every index in
//!    `0..total` is claimed exactly once
//! 4. After all workers join, status changes are applied and the ledger is
//!    rewritten in full
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tmledger_core::{Ledger, SweepOptions, ConsoleProgress, run_ban_check};
//! use tmledger_api::ApiClient;
//!
//! let provider = Arc::new(ApiClient::mail_tm()?);
//! let ledger = Ledger::new("accounts.txt");
//! let outcome = run_ban_check(
//!     provider,
//!     &ledger,
//!     SweepOptions::default(),
//!     Arc::new(ConsoleProgress::stdout()),
//! )
//! .await?;
//! ```

mod aggregator;
mod pool;
mod probe;
mod progress;
mod queue;
mod reconcile;

pub use aggregator::{CounterSnapshot, SweepAggregator, SweepCounters};
pub use pool::{
    DEFAULT_MAX_WORKERS, MIN_WORKERS, Sweep, SweepOptions, SweepReport, pool_size,
};
pub use probe::{
    BAN_PHRASES, Classification, DEFAULT_PROBE_TIMEOUT, ProbeOutcome, REASON_ACCESS_DEACTIVATED,
    REASON_WRONG_CREDENTIALS, SENDER_MARKER, find_ban_indicator, probe,
};
pub use progress::{
    ConsoleProgress, DEFAULT_PROGRESS_EVERY, NoProgress, Progress, ProgressSink, ProgressSnapshot,
};
pub use queue::WorkQueue;
pub use reconcile::{BanCheck, reconcile, run_ban_check};
