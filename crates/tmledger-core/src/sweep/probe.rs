//! Per-account login-and-scan probe.

use std::time::Duration;

use crate::account::{Account, AccountStatus};
use crate::provider::{InboxMessage, MailProvider, ProviderError};

/// Timeout for each network call made by a probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Only messages whose sender contains this marker are scanned.
pub const SENDER_MARKER: &str = "openai";

/// Lowercase subject phrases that indicate a suspended account.
pub const BAN_PHRASES: [&str; 8] = [
    "access deactivated",
    "deactivated",
    "account suspended",
    "account disabled",
    "account has been disabled",
    "account has been deactivated",
    "suspended",
    "violation",
];

/// Reason recorded when the mailbox rejects the password.
pub const REASON_WRONG_CREDENTIALS: &str = "wrong_credentials";

/// Reason recorded when a suspension notice is found.
pub const REASON_ACCESS_DEACTIVATED: &str = "access_deactivated";

/// Result class of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Logged in, no suspension notice (or the account was skipped).
    Ok,
    /// A suspension notice was found.
    Banned,
    /// The mailbox rejected the saved password.
    InvalidPassword,
    /// Domain not served by the provider. Counted, never produced today.
    UnsupportedDomain,
    /// Network or protocol failure; the account is left untouched.
    Error,
}

impl Classification {
    /// The status this classification moves an account to, if any.
    #[must_use]
    pub const fn status_change(self) -> Option<AccountStatus> {
        match self {
            Self::Banned => Some(AccountStatus::Banned),
            Self::InvalidPassword => Some(AccountStatus::InvalidPassword),
            Self::Ok | Self::UnsupportedDomain | Self::Error => None,
        }
    }
}

/// Outcome of probing one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Position of the account in the ledger.
    pub account_index: usize,
    /// Result class.
    pub classification: Classification,
    /// Diagnostic text; empty for [`Classification::Ok`].
    pub reason: String,
}

impl ProbeOutcome {
    /// Creates an outcome.
    #[must_use]
    pub fn new(
        account_index: usize,
        classification: Classification,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            account_index,
            classification,
            reason: reason.into(),
        }
    }

    /// An `Ok` outcome with no reason.
    #[must_use]
    pub const fn ok(account_index: usize) -> Self {
        Self {
            account_index,
            classification: Classification::Ok,
            reason: String::new(),
        }
    }
}

/// Returns the first ban phrase found in a message from the marked sender.
///
/// Messages are scanned in the given order and scanning stops at the first
/// hit. Sender and subject are compared case-insensitively.
#[must_use]
pub fn find_ban_indicator(messages: &[InboxMessage]) -> Option<&'static str> {
    messages
        .iter()
        .filter(|message| message.sender.to_lowercase().contains(SENDER_MARKER))
        .find_map(|message| {
            let subject = message.subject.to_lowercase();
            BAN_PHRASES
                .iter()
                .copied()
                .find(|phrase| subject.contains(phrase))
        })
}

/// Logs into one account and classifies it from its inbox.
///
/// Accounts with no email, no mailbox password, or an already settled
/// status return `Ok` without any network call. Touches no shared state.
pub async fn probe<P: MailProvider>(
    provider: &P,
    index: usize,
    account: &Account,
    timeout: Duration,
) -> ProbeOutcome {
    if !account.is_eligible() {
        return ProbeOutcome::ok(index);
    }

    let token = match provider
        .authenticate(&account.email, &account.mail_password, timeout)
        .await
    {
        Ok(token) => token,
        Err(ProviderError::InvalidCredentials) => {
            return ProbeOutcome::new(
                index,
                Classification::InvalidPassword,
                REASON_WRONG_CREDENTIALS,
            );
        }
        Err(ProviderError::Transport(reason)) => {
            return ProbeOutcome::new(index, Classification::Error, reason);
        }
    };

    let messages = match provider.list_messages(&token, timeout).await {
        Ok(messages) => messages,
        Err(err) => return ProbeOutcome::new(index, Classification::Error, err.to_string()),
    };

    match find_ban_indicator(&messages) {
        Some(_) => ProbeOutcome::new(index, Classification::Banned, REASON_ACCESS_DEACTIVATED),
        None => ProbeOutcome::ok(index),
    }
}
