//! Plain-text account ledger.
//!
//! One account per line: `email / passwords / status`, where `passwords` is
//! either a single password or `login;mail`. Two older layouts are still
//! read, `email:passwords` and `email<TAB>passwords`; files containing them
//! are flagged so the caller can rewrite them in the canonical layout.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::model::{Account, AccountStatus};
use crate::{Error, Result};

const FIELD_SEPARATOR: &str = " / ";

/// A successfully parsed ledger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// The account described by the line.
    pub account: Account,
    /// Whether the line used one of the legacy layouts.
    pub legacy: bool,
}

/// Parses one ledger line.
///
/// Returns `None` for blank lines, lines without an email and lines with
/// no password at all.
#[must_use]
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut account = Account::default();
    let legacy;

    if let Some((email, rest)) = line.split_once(FIELD_SEPARATOR) {
        account.email = email.trim().to_string();
        let passwords = match rest.split_once(FIELD_SEPARATOR) {
            Some((passwords, status)) => {
                if !status.trim().is_empty() {
                    account.status = AccountStatus::parse(status);
                }
                passwords
            }
            None => rest,
        };
        parse_passwords(passwords, &mut account)?;
        legacy = false;
    } else if let Some((email, passwords)) = line.split_once(':').or_else(|| line.split_once('\t'))
    {
        account.email = email.trim().to_string();
        parse_passwords(passwords, &mut account)?;
        legacy = true;
    } else {
        return None;
    }

    if account.email.is_empty() {
        return None;
    }
    Some(ParsedLine { account, legacy })
}

/// Fills both passwords from a `login;mail` or single-password field.
fn parse_passwords(source: &str, account: &mut Account) -> Option<()> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    let (login, mail) = match source.split_once(';') {
        Some((login, mail)) => (login.trim(), mail.trim()),
        None => (source, source),
    };
    let (login, mail) = match (login.is_empty(), mail.is_empty()) {
        (true, true) => return None,
        (true, false) => (mail, mail),
        (false, true) => (login, login),
        (false, false) => (login, mail),
    };

    account.login_password = login.to_string();
    account.mail_password = mail.to_string();
    Some(())
}

/// Accounts read from a ledger file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerContents {
    /// Accounts in file order.
    pub accounts: Vec<Account>,
    /// Whether any line used a legacy layout.
    pub needs_rewrite: bool,
    /// Number of non-blank lines that could not be parsed.
    pub skipped: usize,
}

impl LedgerContents {
    /// Parses a whole ledger file.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut contents = Self::default();
        for line in text.lines() {
            match parse_line(line) {
                Some(parsed) => {
                    contents.needs_rewrite |= parsed.legacy;
                    contents.accounts.push(parsed.account);
                }
                None if !line.trim().is_empty() => {
                    contents.skipped += 1;
                    warn!("Skipping unreadable ledger line");
                }
                None => {}
            }
        }
        contents
    }
}

/// File-backed account ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Creates a ledger stored at the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all accounts, in file order.
    ///
    /// A missing file reads as an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LedgerRead`] if the file exists but cannot be read.
    pub async fn load(&self) -> Result<LedgerContents> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Ledger {:?} does not exist yet", self.path);
                return Ok(LedgerContents::default());
            }
            Err(source) => {
                return Err(Error::LedgerRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let contents = LedgerContents::parse(&text);
        debug!(
            "Loaded {} accounts from {:?}",
            contents.accounts.len(),
            self.path
        );
        Ok(contents)
    }

    /// Reads all accounts and rewrites the file if it used a legacy layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or rewritten.
    pub async fn load_canonical(&self) -> Result<Vec<Account>> {
        let contents = self.load().await?;
        if contents.needs_rewrite {
            self.save(&contents.accounts).await?;
            info!("Legacy account format converted to canonical format");
        }
        Ok(contents.accounts)
    }

    /// Replaces the whole file with the given accounts.
    ///
    /// Writes a sibling temporary file first and renames it over the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LedgerWrite`] if writing or renaming fails.
    pub async fn save(&self, accounts: &[Account]) -> Result<()> {
        let mut text = String::new();
        for account in accounts {
            text.push_str(&account.to_ledger_line());
            text.push('\n');
        }

        let tmp = self.temp_path();
        let write = async {
            tokio::fs::write(&tmp, text.as_bytes()).await?;
            tokio::fs::rename(&tmp, &self.path).await
        };
        write.await.map_err(|source| Error::LedgerWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved {} accounts to {:?}", accounts.len(), self.path);
        Ok(())
    }

    /// Appends one account to the end of the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LedgerWrite`] if the file cannot be opened or written.
    pub async fn append(&self, account: &Account) -> Result<()> {
        let line = format!("{}\n", account.to_ledger_line());
        let write = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        };
        write.await.map_err(|source| Error::LedgerWrite {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes a timestamped snapshot of the ledger into `dir`.
    ///
    /// Returns the snapshot path, or `None` when the ledger is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or the snapshot written.
    pub async fn backup(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let contents = self.load().await?;
        if contents.accounts.is_empty() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(dir).await?;
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("accounts");
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let snapshot = Self::new(dir.join(format!("{stem}_{timestamp}.txt")));
        snapshot.save(&contents.accounts).await?;

        info!("Ledger snapshot written to {:?}", snapshot.path);
        Ok(Some(snapshot.path))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Summary counts over a set of accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Number of accounts.
    pub total: usize,
    /// Accounts per status text.
    pub by_status: BTreeMap<String, usize>,
    /// Accounts whose login and mailbox passwords differ.
    pub split_passwords: usize,
    /// Accounts per domain.
    pub by_domain: BTreeMap<String, usize>,
}

impl LedgerStats {
    /// Computes statistics over the given accounts.
    #[must_use]
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let mut stats = Self {
            total: accounts.len(),
            by_status: AccountStatus::ALL
                .into_iter()
                .map(|status| (status.as_str().to_string(), 0))
                .collect(),
            ..Self::default()
        };

        for account in accounts {
            *stats
                .by_status
                .entry(account.status.as_str().to_string())
                .or_default() += 1;
            if let Some(domain) = account.domain() {
                *stats.by_domain.entry(domain).or_default() += 1;
            }
            if !account.login_password.is_empty()
                && !account.mail_password.is_empty()
                && account.login_password != account.mail_password
            {
                stats.split_passwords += 1;
            }
        }
        stats
    }

    /// Count for one status.
    #[must_use]
    pub fn count(&self, status: &AccountStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Most used domains, largest first, ties by name.
    #[must_use]
    pub fn top_domains(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .by_domain
            .iter()
            .map(|(domain, count)| (domain.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn canonical_line() {
            let parsed = parse_line("user@alpha.tm / secret / registered").unwrap();
            assert!(!parsed.legacy);
            assert_eq!(parsed.account.email, "user@alpha.tm");
            assert_eq!(parsed.account.login_password, "secret");
            assert_eq!(parsed.account.mail_password, "secret");
            assert_eq!(parsed.account.status, AccountStatus::Registered);
        }

        #[test]
        fn canonical_split_passwords() {
            let parsed = parse_line("user@alpha.tm / openai-pw;mail-pw / plus").unwrap();
            assert_eq!(parsed.account.login_password, "openai-pw");
            assert_eq!(parsed.account.mail_password, "mail-pw");
        }

        #[test]
        fn canonical_without_status() {
            let parsed = parse_line("user@alpha.tm / secret").unwrap();
            assert_eq!(parsed.account.status, AccountStatus::NotRegistered);
            assert!(!parsed.legacy);
        }

        #[test]
        fn canonical_empty_status() {
            let parsed = parse_line("user@alpha.tm / secret /  ").unwrap();
            assert_eq!(parsed.account.status, AccountStatus::NotRegistered);
        }

        #[test]
        fn half_empty_passwords_copy_other_side() {
            let parsed = parse_line("user@alpha.tm / ;mail-only / banned").unwrap();
            assert_eq!(parsed.account.login_password, "mail-only");
            assert_eq!(parsed.account.mail_password, "mail-only");

            let parsed = parse_line("user@alpha.tm / login-only; / banned").unwrap();
            assert_eq!(parsed.account.mail_password, "login-only");
        }

        #[test]
        fn legacy_colon() {
            let parsed = parse_line("user@alpha.tm:secret").unwrap();
            assert!(parsed.legacy);
            assert_eq!(parsed.account.mail_password, "secret");
        }

        #[test]
        fn legacy_tab() {
            let parsed = parse_line("user@alpha.tm\tlogin;mail").unwrap();
            assert!(parsed.legacy);
            assert_eq!(parsed.account.login_password, "login");
            assert_eq!(parsed.account.mail_password, "mail");
        }

        #[test]
        fn rejects_garbage() {
            assert!(parse_line("").is_none());
            assert!(parse_line("   ").is_none());
            assert!(parse_line("just-some-text").is_none());
            assert!(parse_line(":secret").is_none());
            assert!(parse_line("user@alpha.tm / ; / plus").is_none());
            assert!(parse_line("user@alpha.tm:").is_none());
        }

        #[test]
        fn contents_counts_skipped_and_legacy() {
            let text = "a@x.tm / pw / plus\n\nnonsense\nb@x.tm:pw2\n";
            let contents = LedgerContents::parse(text);
            assert_eq!(contents.accounts.len(), 2);
            assert_eq!(contents.skipped, 1);
            assert!(contents.needs_rewrite);
        }
    }

    mod file_tests {
        use super::*;

        #[tokio::test]
        async fn missing_file_is_empty() {
            let dir = tempfile::tempdir().unwrap();
            let ledger = Ledger::new(dir.path().join("accounts.txt"));
            let contents = ledger.load().await.unwrap();
            assert!(contents.accounts.is_empty());
            assert!(!contents.needs_rewrite);
        }

        #[tokio::test]
        async fn unreadable_path_is_error() {
            let dir = tempfile::tempdir().unwrap();
            // A directory cannot be read as a file.
            let ledger = Ledger::new(dir.path());
            assert!(matches!(
                ledger.load().await,
                Err(Error::LedgerRead { .. })
            ));
        }

        #[tokio::test]
        async fn save_then_load_preserves_order_and_fields() {
            let dir = tempfile::tempdir().unwrap();
            let ledger = Ledger::new(dir.path().join("accounts.txt"));
            let accounts = vec![
                Account::new("b@x.tm", "pw").with_status(AccountStatus::Banned),
                Account::new("a@x.tm", "pw").with_passwords("login", "mail"),
            ];
            ledger.save(&accounts).await.unwrap();

            let text = std::fs::read_to_string(ledger.path()).unwrap();
            assert_eq!(
                text,
                "b@x.tm / pw / banned\na@x.tm / login;mail / not_registered\n"
            );
            assert_eq!(ledger.load().await.unwrap().accounts, accounts);
            assert!(!dir.path().join("accounts.txt.tmp").exists());
        }

        #[tokio::test]
        async fn save_overwrites() {
            let dir = tempfile::tempdir().unwrap();
            let ledger = Ledger::new(dir.path().join("accounts.txt"));
            ledger
                .save(&[Account::new("a@x.tm", "pw"), Account::new("b@x.tm", "pw")])
                .await
                .unwrap();
            ledger.save(&[Account::new("c@x.tm", "pw")]).await.unwrap();

            let accounts = ledger.load().await.unwrap().accounts;
            assert_eq!(accounts.len(), 1);
            assert_eq!(accounts[0].email, "c@x.tm");
        }

        #[tokio::test]
        async fn append_adds_line() {
            let dir = tempfile::tempdir().unwrap();
            let ledger = Ledger::new(dir.path().join("accounts.txt"));
            ledger.append(&Account::new("a@x.tm", "pw")).await.unwrap();
            ledger.append(&Account::new("b@x.tm", "pw2")).await.unwrap();

            let accounts = ledger.load().await.unwrap().accounts;
            assert_eq!(accounts.len(), 2);
            assert_eq!(accounts[1].mail_password, "pw2");
        }

        #[tokio::test]
        async fn load_canonical_rewrites_legacy() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("accounts.txt");
            std::fs::write(&path, "a@x.tm:pw\nb@x.tm / pw2 / plus\n").unwrap();

            let ledger = Ledger::new(&path);
            let accounts = ledger.load_canonical().await.unwrap();
            assert_eq!(accounts.len(), 2);

            let text = std::fs::read_to_string(&path).unwrap();
            assert_eq!(text, "a@x.tm / pw / not_registered\nb@x.tm / pw2 / plus\n");
            assert!(!ledger.load().await.unwrap().needs_rewrite);
        }

        #[tokio::test]
        async fn backup_writes_snapshot() {
            let dir = tempfile::tempdir().unwrap();
            let ledger = Ledger::new(dir.path().join("accounts.txt"));
            ledger.save(&[Account::new("a@x.tm", "pw")]).await.unwrap();

            let backups = dir.path().join("backups");
            let snapshot = ledger.backup(&backups).await.unwrap().expect("snapshot");
            assert!(snapshot.starts_with(&backups));
            let name = snapshot.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("accounts_"));
            assert!(
                std::path::Path::new(name)
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
            );
            assert_eq!(Ledger::new(&snapshot).load().await.unwrap().accounts.len(), 1);
        }

        #[tokio::test]
        async fn backup_of_empty_ledger_is_none() {
            let dir = tempfile::tempdir().unwrap();
            let ledger = Ledger::new(dir.path().join("accounts.txt"));
            assert!(ledger.backup(&dir.path().join("b")).await.unwrap().is_none());
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn counts() {
            let accounts = vec![
                Account::new("a@alpha.tm", "pw").with_status(AccountStatus::Banned),
                Account::new("b@alpha.tm", "pw").with_passwords("x", "y"),
                Account::new("c@beta.tm", "pw").with_status(AccountStatus::Plus),
            ];
            let stats = LedgerStats::from_accounts(&accounts);
            assert_eq!(stats.total, 3);
            assert_eq!(stats.count(&AccountStatus::Banned), 1);
            assert_eq!(stats.count(&AccountStatus::NotRegistered), 1);
            assert_eq!(stats.count(&AccountStatus::InvalidPassword), 0);
            assert_eq!(stats.split_passwords, 1);
            assert_eq!(stats.top_domains(5), vec![("alpha.tm", 2), ("beta.tm", 1)]);
            assert_eq!(stats.top_domains(1).len(), 1);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn field() -> impl Strategy<Value = String> {
            "[A-Za-z0-9._-]{1,16}"
        }

        proptest! {
            #[test]
            fn canonical_line_reparses(
                local in field(),
                login in field(),
                mail in field(),
                idx in 0usize..5,
            ) {
                let account = Account::new(format!("{local}@x.tm"), "")
                    .with_passwords(login, mail)
                    .with_status(AccountStatus::ALL[idx].clone());
                let parsed = parse_line(&account.to_ledger_line()).unwrap();
                prop_assert!(!parsed.legacy);
                prop_assert_eq!(parsed.account, account);
            }

            #[test]
            fn parse_never_panics(line in "\\PC{0,64}") {
                let _ = parse_line(&line);
            }
        }
    }
}
