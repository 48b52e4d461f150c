//! # tmledger-core
//!
//! Core logic for `tmledger`, a mail.tm account ledger.
//!
//! This crate provides:
//! - Account model and the plain-text ledger file
//! - Account validation
//! - The [`MailProvider`] seam over the mail.tm API
//! - **Ban check** - a concurrent sweep that logs into every saved mailbox
//!   and marks accounts whose inbox shows a suspension notice
//! - Account creation and inbox services
//! - Configuration loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
mod error;
pub mod provider;
pub mod service;
pub mod sweep;

pub use account::{
    Account, AccountStatus, Ledger, LedgerContents, LedgerStats, ValidationError,
    ValidationResult, validate_account,
};
pub use config::Config;
pub use error::{Error, Result};
pub use provider::{InboxMessage, MailProvider, ProviderError};
pub use service::{
    BatchSummary, CreatedAccount, Inbox, batch_create, create_account, extract_codes,
    generate_local_part, generate_password, open_inbox, read_message,
};
pub use sweep::{
    BanCheck, Classification, ConsoleProgress, NoProgress, ProbeOutcome, ProgressSink,
    ProgressSnapshot, Sweep, SweepOptions, SweepReport, pool_size, probe, reconcile,
    run_ban_check,
};
