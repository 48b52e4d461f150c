//! Mailbox provider abstraction.
//!
//! The ban check only needs two calls from the mail service: log in, and
//! list the inbox. [`MailProvider`] captures exactly that so the sweep can
//! run against the real API or an in-memory fake.

use std::future::Future;
use std::time::Duration;

use tmledger_api::ApiClient;

/// Errors a provider call can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The mailbox rejected the address/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Any transport or protocol failure.
    #[error("{0}")]
    Transport(String),
}

/// Sender and subject of one inbox message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxMessage {
    /// Sender address.
    pub sender: String,
    /// Subject line.
    pub subject: String,
}

impl InboxMessage {
    /// Creates an inbox message.
    #[must_use]
    pub fn new(sender: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
        }
    }
}

/// Login and inbox listing, as used by the ban check.
pub trait MailProvider: Send + Sync + 'static {
    /// Logs in and returns a bearer token.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Lists inbox messages, in the order the service returns them.
    fn list_messages(
        &self,
        token: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<InboxMessage>, ProviderError>> + Send;
}

impl From<tmledger_api::Error> for ProviderError {
    fn from(err: tmledger_api::Error) -> Self {
        if err.is_invalid_credentials() {
            Self::InvalidCredentials
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl MailProvider for ApiClient {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let token = self.token_with_timeout(email, password, timeout).await?;
        Ok(token.token)
    }

    async fn list_messages(
        &self,
        token: &str,
        timeout: Duration,
    ) -> Result<Vec<InboxMessage>, ProviderError> {
        let messages = self.messages_with_timeout(token, timeout).await?;
        Ok(messages
            .into_iter()
            .map(|m| InboxMessage {
                sender: m.from.address,
                subject: m.subject,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_mapping() {
        assert_eq!(
            ProviderError::from(tmledger_api::Error::InvalidCredentials),
            ProviderError::InvalidCredentials
        );
        assert_eq!(
            ProviderError::from(tmledger_api::Error::Timeout),
            ProviderError::Transport("Request timed out".to_string())
        );
    }

    #[test]
    fn transport_display_is_message() {
        let err = ProviderError::Transport("HTTP 500 Internal Server Error".into());
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
    }
}
