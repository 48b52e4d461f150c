//! # tmledger-api
//!
//! Async client for the [mail.tm](https://mail.tm) disposable mailbox API.
//!
//! ## Features
//!
//! - **Domains**: list the domains new mailboxes can be registered on
//! - **Accounts**: register a mailbox with an address and password
//! - **Tokens**: exchange credentials for a bearer token
//! - **Messages**: list the inbox and read single messages
//!
//! Every request carries a per-request timeout. The token call reports a
//! rejected login as [`Error::InvalidCredentials`] so callers can tell a
//! wrong password apart from a network problem.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tmledger_api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::mail_tm()?;
//!
//!     let domains = client.domains().await?;
//!     let address = format!("someone@{}", domains[0].domain);
//!     client.create_account(&address, "hunter2hunter2").await?;
//!
//!     let token = client.token(&address, "hunter2hunter2").await?;
//!     for message in client.messages(&token.token).await? {
//!         println!("{} | {}", message.from.address, message.subject);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use types::{Address, Domain, MessageDetail, MessageSummary, Token};
