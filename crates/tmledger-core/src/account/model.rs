//! Account model types.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle status of a saved account.
///
/// Status text this tool does not know is kept verbatim in
/// [`AccountStatus::Other`] so a ledger rewrite preserves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountStatus {
    /// Mailbox exists, nothing registered with it yet.
    #[default]
    NotRegistered,
    /// Used to register a provider account.
    Registered,
    /// Registered account with a paid plan.
    Plus,
    /// The provider suspended the account.
    Banned,
    /// The mailbox rejected the saved password.
    InvalidPassword,
    /// Any other status text, as written in the ledger.
    Other(String),
}

impl AccountStatus {
    /// All statuses, in ledger order.
    pub const ALL: [Self; 5] = [
        Self::NotRegistered,
        Self::Registered,
        Self::Plus,
        Self::Banned,
        Self::InvalidPassword,
    ];

    /// Ledger spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotRegistered => "not_registered",
            Self::Registered => "registered",
            Self::Plus => "plus",
            Self::Banned => "banned",
            Self::InvalidPassword => "invalid_password",
            Self::Other(raw) => raw,
        }
    }

    /// Parses a ledger status field.
    ///
    /// Matching is exact. An empty field means
    /// [`AccountStatus::NotRegistered`]; anything unrecognised becomes
    /// [`AccountStatus::Other`] with the trimmed text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::NotRegistered;
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .unwrap_or_else(|| {
                debug!("Keeping unrecognised account status {raw:?}");
                Self::Other(raw.to_string())
            })
    }

    /// Short tag shown next to an account in listings.
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::NotRegistered => String::new(),
            Self::Registered => "[REG]".into(),
            Self::Plus => "[PLUS]".into(),
            Self::Banned => "[BANNED]".into(),
            Self::InvalidPassword => "[BAD PASS]".into(),
            Self::Other(raw) => format!("[{raw}]"),
        }
    }

    /// Banned and invalid-password accounts are never probed again.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Banned | Self::InvalidPassword)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AccountStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<AccountStatus> for String {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// A saved mail.tm account.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Mailbox address.
    pub email: String,
    /// Password used for the provider login registered with this mailbox.
    pub login_password: String,
    /// Password of the mailbox itself; used against mail.tm.
    pub mail_password: String,
    /// Current status.
    pub status: AccountStatus,
}

impl Account {
    /// Creates an account that uses one password for both roles.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            email: email.into(),
            login_password: password.clone(),
            mail_password: password,
            status: AccountStatus::NotRegistered,
        }
    }

    /// Sets separate login and mailbox passwords.
    #[must_use]
    pub fn with_passwords(
        mut self,
        login_password: impl Into<String>,
        mail_password: impl Into<String>,
    ) -> Self {
        self.login_password = login_password.into();
        self.mail_password = mail_password.into();
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the ban check should log into this account.
    ///
    /// Requires an email and a mailbox password, and a status that is not
    /// already settled.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        !self.email.is_empty() && !self.mail_password.is_empty() && !self.status.is_settled()
    }

    /// Domain part of the address, lowercased.
    #[must_use]
    pub fn domain(&self) -> Option<String> {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim().to_lowercase())
            .filter(|domain| !domain.is_empty())
    }

    /// Password field as written to the ledger.
    ///
    /// `login;mail` when both are set and differ, otherwise the one that is set.
    #[must_use]
    pub fn serialized_passwords(&self) -> String {
        let login = self.login_password.trim();
        let mail = self.mail_password.trim();
        if !login.is_empty() && !mail.is_empty() && login != mail {
            format!("{login};{mail}")
        } else if !mail.is_empty() {
            mail.to_string()
        } else {
            login.to_string()
        }
    }

    /// Canonical ledger line (without the trailing newline).
    #[must_use]
    pub fn to_ledger_line(&self) -> String {
        format!(
            "{} / {} / {}",
            self.email,
            self.serialized_passwords(),
            self.status
        )
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("login_password", &"<redacted>")
            .field("mail_password", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    mod status_tests {
        use super::*;

        #[test]
        fn default_is_not_registered() {
            assert_eq!(AccountStatus::default(), AccountStatus::NotRegistered);
        }

        #[test]
        fn parse_known() {
            for status in AccountStatus::ALL {
                assert_eq!(AccountStatus::parse(status.as_str()), status);
            }
            assert_eq!(AccountStatus::parse(" banned "), AccountStatus::Banned);
        }

        #[test]
        fn parse_is_case_sensitive() {
            let status = AccountStatus::parse("Banned");
            assert_eq!(status, AccountStatus::Other("Banned".into()));
            assert!(!status.is_settled());
        }

        #[test]
        fn parse_keeps_unknown_text() {
            assert_eq!(
                AccountStatus::parse(" team "),
                AccountStatus::Other("team".into())
            );
            assert_eq!(AccountStatus::parse("team").as_str(), "team");
            assert_eq!(AccountStatus::parse(""), AccountStatus::NotRegistered);
        }

        #[test]
        fn settled() {
            assert!(AccountStatus::Banned.is_settled());
            assert!(AccountStatus::InvalidPassword.is_settled());
            assert!(!AccountStatus::Plus.is_settled());
            assert!(!AccountStatus::Registered.is_settled());
            assert!(!AccountStatus::NotRegistered.is_settled());
        }

        #[test]
        fn tags() {
            assert_eq!(AccountStatus::Registered.tag(), "[REG]");
            assert_eq!(AccountStatus::InvalidPassword.tag(), "[BAD PASS]");
            assert_eq!(AccountStatus::NotRegistered.tag(), "");
            assert_eq!(AccountStatus::Other("team".into()).tag(), "[team]");
        }

        #[test]
        fn serde_uses_ledger_spelling() {
            let json = serde_json::to_string(&AccountStatus::InvalidPassword).unwrap();
            assert_eq!(json, "\"invalid_password\"");

            let other: AccountStatus = serde_json::from_str("\"team\"").unwrap();
            assert_eq!(other, AccountStatus::Other("team".into()));
            assert_eq!(serde_json::to_string(&other).unwrap(), "\"team\"");
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn new_uses_one_password() {
            let account = Account::new("a@b.tm", "pw");
            assert_eq!(account.login_password, "pw");
            assert_eq!(account.mail_password, "pw");
            assert_eq!(account.status, AccountStatus::NotRegistered);
        }

        #[test]
        fn eligibility() {
            assert!(Account::new("a@b.tm", "pw").is_eligible());
            assert!(!Account::new("", "pw").is_eligible());
            assert!(
                !Account::new("a@b.tm", "pw")
                    .with_passwords("login", "")
                    .is_eligible()
            );
            assert!(
                !Account::new("a@b.tm", "pw")
                    .with_status(AccountStatus::Banned)
                    .is_eligible()
            );
            assert!(
                !Account::new("a@b.tm", "pw")
                    .with_status(AccountStatus::InvalidPassword)
                    .is_eligible()
            );
            assert!(
                Account::new("a@b.tm", "pw")
                    .with_status(AccountStatus::Plus)
                    .is_eligible()
            );
        }

        #[test]
        fn domain() {
            assert_eq!(Account::new("x@Alpha.TM", "p").domain().as_deref(), Some("alpha.tm"));
            assert!(Account::new("no-at-sign", "p").domain().is_none());
            assert!(Account::new("x@", "p").domain().is_none());
        }

        #[test]
        fn serialized_passwords() {
            let same = Account::new("a@b.tm", "pw");
            assert_eq!(same.serialized_passwords(), "pw");

            let split = same.clone().with_passwords("login", "mail");
            assert_eq!(split.serialized_passwords(), "login;mail");

            let only_login = same.clone().with_passwords("login", "");
            assert_eq!(only_login.serialized_passwords(), "login");
        }

        #[test]
        fn ledger_line() {
            let account = Account::new("a@b.tm", "pw")
                .with_passwords("login", "mail")
                .with_status(AccountStatus::Plus);
            assert_eq!(account.to_ledger_line(), "a@b.tm / login;mail / plus");

            let custom = Account::new("a@b.tm", "pw").with_status(AccountStatus::parse("team"));
            assert_eq!(custom.to_ledger_line(), "a@b.tm / pw / team");
        }

        #[test]
        fn debug_redacts_passwords() {
            let account = Account::new("a@b.tm", "hunter2");
            let debug = format!("{account:?}");
            assert!(debug.contains("a@b.tm"));
            assert!(!debug.contains("hunter2"));
        }
    }
}
