//! Account validation.

use super::model::Account;

/// Validation error for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Neither password is set.
    EmptyPassword,
    /// A password contains a character the ledger uses as a separator.
    ReservedCharacter,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptyPassword => "A password is required",
            Self::ReservedCharacter => "Passwords cannot contain ';', ' / ' or line breaks",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::EmptyPassword | Self::ReservedCharacter => "password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an account before it is registered or written to the ledger.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_account(account: &Account) -> ValidationResult {
    let mut errors = Vec::new();

    if account.email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !is_valid_email(&account.email) {
        errors.push(ValidationError::InvalidEmail);
    }

    if account.login_password.is_empty() && account.mail_password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    } else if [&account.login_password, &account.mail_password]
        .iter()
        .any(|p| has_reserved(p))
    {
        errors.push(ValidationError::ReservedCharacter);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_reserved(password: &str) -> bool {
    password.contains(';') || password.contains(" / ") || password.contains(['\n', '\r'])
}

/// Basic email validation.
///
/// Checks for a non-empty local part, a single @ and a dotted domain.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
