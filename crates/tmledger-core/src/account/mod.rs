//! Account management module.
//!
//! Provides the account model, the plain-text ledger file and validation.

mod ledger;
mod model;
mod validation;

pub use ledger::{Ledger, LedgerContents, LedgerStats, ParsedLine, parse_line};
pub use model::{Account, AccountStatus};
pub use validation::{ValidationError, ValidationResult, validate_account};
