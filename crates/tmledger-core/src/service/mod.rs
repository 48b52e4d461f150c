//! Account creation and inbox services.
//!
//! Thin workflows over [`tmledger_api::ApiClient`] that keep the ledger in
//! step with the mailboxes created on mail.tm.

pub mod accounts;
pub mod inbox;

pub use accounts::{
    BatchSummary, CreatedAccount, batch_create, create_account, generate_local_part,
    generate_password, pick_domain,
};
pub use inbox::{Inbox, extract_codes, open_inbox, read_message};
