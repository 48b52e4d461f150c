//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::account::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// mail.tm API call failed.
    #[error("API error: {0}")]
    Api(#[from] tmledger_api::Error),

    /// The ledger file exists but could not be read.
    #[error("Cannot read ledger {path:?}: {source}")]
    LedgerRead {
        /// Ledger location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The ledger file could not be written.
    #[error("Cannot write ledger {path:?}: {source}")]
    LedgerWrite {
        /// Ledger location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Account failed validation.
    #[error("Invalid account: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
