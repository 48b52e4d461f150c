//! Reading a mailbox.

use std::sync::LazyLock;

use regex::Regex;
use tmledger_api::{ApiClient, MessageDetail, MessageSummary};
use tracing::debug;

use crate::Result;

#[allow(clippy::expect_used)]
static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{6}\b").expect("valid code pattern"));

/// A logged-in mailbox and its first page of messages.
#[derive(Debug, Clone)]
pub struct Inbox {
    /// Bearer token for follow-up requests.
    pub token: String,
    /// Messages, newest first as returned by the API.
    pub messages: Vec<MessageSummary>,
}

impl Inbox {
    /// Message at a 1-based position, as shown to the user.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&MessageSummary> {
        position.checked_sub(1).and_then(|i| self.messages.get(i))
    }
}

/// Logs into a mailbox and lists its messages.
///
/// # Errors
///
/// Returns an API error if login or listing fails; wrong credentials show
/// up as [`tmledger_api::Error::InvalidCredentials`].
pub async fn open_inbox(api: &ApiClient, email: &str, password: &str) -> Result<Inbox> {
    let token = api.token(email.trim(), password).await?.token;
    let messages = api.messages(&token).await?;
    debug!("Inbox {} has {} messages", email.trim(), messages.len());
    Ok(Inbox { token, messages })
}

/// Fetches one message with its body.
///
/// # Errors
///
/// Returns an API error if the message cannot be loaded.
pub async fn read_message(api: &ApiClient, token: &str, id: &str) -> Result<MessageDetail> {
    Ok(api.message(token, id).await?)
}

/// All standalone six-digit codes in `text`, in order of appearance.
#[must_use]
pub fn extract_codes(text: &str) -> Vec<&str> {
    CODE_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}
