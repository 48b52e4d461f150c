//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tmledger_core::{Account, InboxMessage, MailProvider, ProviderError};

/// Sender used by suspension notices.
pub const OPENAI_SENDER: &str = "OpenAI Team <noreply@openai.com>";

struct Mailbox {
    password: String,
    messages: Vec<InboxMessage>,
}

/// In-memory mail service that records every call.
#[derive(Default)]
pub struct MockProvider {
    mailboxes: HashMap<String, Mailbox>,
    unreachable: HashSet<String>,
    delay: Duration,
    auth_calls: Mutex<HashMap<String, usize>>,
    list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mailbox.
    pub fn mailbox(mut self, email: &str, password: &str, messages: Vec<InboxMessage>) -> Self {
        self.mailboxes.insert(
            email.to_string(),
            Mailbox {
                password: password.to_string(),
                messages,
            },
        );
        self
    }

    /// Makes logins for `email` fail with a transport error.
    pub fn unreachable(mut self, email: &str) -> Self {
        self.unreachable.insert(email.to_string());
        self
    }

    /// Sleeps this long inside every call.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn auth_calls(&self, email: &str) -> usize {
        self.auth_calls.lock().unwrap().get(email).copied().unwrap_or(0)
    }

    pub fn total_auth_calls(&self) -> usize {
        self.auth_calls.lock().unwrap().values().sum()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn busy(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MailProvider for MockProvider {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        _timeout: Duration,
    ) -> Result<String, ProviderError> {
        *self
            .auth_calls
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_default() += 1;
        self.busy().await;

        if self.unreachable.contains(email) {
            return Err(ProviderError::Transport("Request timed out".to_string()));
        }
        match self.mailboxes.get(email) {
            Some(mailbox) if mailbox.password == password => Ok(format!("token-{email}")),
            _ => Err(ProviderError::InvalidCredentials),
        }
    }

    async fn list_messages(
        &self,
        token: &str,
        _timeout: Duration,
    ) -> Result<Vec<InboxMessage>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.busy().await;

        let email = token.trim_start_matches("token-");
        self.mailboxes
            .get(email)
            .map(|mailbox| mailbox.messages.clone())
            .ok_or_else(|| ProviderError::Transport("HTTP 401 Unauthorized".to_string()))
    }
}

pub fn suspension_notice() -> InboxMessage {
    InboxMessage::new(OPENAI_SENDER, "Your account has been suspended")
}

pub fn welcome() -> InboxMessage {
    InboxMessage::new(OPENAI_SENDER, "Welcome to ChatGPT")
}

/// Builds `n` accounts with a mix of outcomes and a provider serving them.
///
/// Index `i` is banned when `i % 5 == 0`, has a wrong password when
/// `i % 7 == 3`, is already banned in the ledger when `i % 11 == 4`, and is
/// clean otherwise.
pub fn mixed_fleet(n: usize, delay: Duration) -> (Vec<Account>, MockProvider) {
    let mut provider = MockProvider::new().with_delay(delay);
    let mut accounts = Vec::with_capacity(n);
    for i in 0..n {
        let email = format!("user{i}@alpha.tm");
        let account = Account::new(&email, format!("pw{i}"));
        let (account, server_password, inbox) = if i % 11 == 4 {
            (
                account.with_status(tmledger_core::AccountStatus::Banned),
                format!("pw{i}"),
                vec![],
            )
        } else if i % 5 == 0 {
            (account, format!("pw{i}"), vec![welcome(), suspension_notice()])
        } else if i % 7 == 3 {
            (account, format!("changed{i}"), vec![])
        } else {
            (account, format!("pw{i}"), vec![welcome()])
        };
        provider = provider.mailbox(&email, &server_password, inbox);
        accounts.push(account);
    }
    (accounts, provider)
}
