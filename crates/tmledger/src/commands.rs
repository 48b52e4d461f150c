//! Command handlers shared by the subcommands and the menu.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tmledger_api::{ApiClient, MessageSummary};
use tmledger_core::{
    Account, AccountStatus, BanCheck, Config, ConsoleProgress, Error, Ledger, LedgerStats,
    SweepOptions, batch_create, create_account, extract_codes, open_inbox, read_message,
    run_ban_check,
};
use tracing::info;

/// Number of domains listed by the create flow.
pub const SHOWN_DOMAINS: usize = 10;

/// Resolved settings plus the handles every command needs.
#[derive(Debug, Clone)]
pub struct App {
    config: Config,
    api: ApiClient,
    ledger: Ledger,
}

impl App {
    /// Builds the API client and ledger from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config.api_url)?.with_timeout(config.request_timeout());
        let ledger = Ledger::new(config.ledger_path.clone());
        Ok(Self {
            config,
            api,
            ledger,
        })
    }

    /// The mail.tm client.
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Prints the available domains.
    pub async fn domains(&self) -> Result<()> {
        match self.api.domains().await {
            Ok(domains) => {
                println!("\nAvailable domains:");
                for (i, domain) in domains.iter().enumerate() {
                    let inactive = if domain.is_active { "" } else { " (inactive)" };
                    println!("  {}. {}{inactive}", i + 1, domain.domain);
                }
            }
            Err(e) => eprintln!("Cannot fetch domains: {e}"),
        }
        Ok(())
    }

    /// Creates one mailbox and prints its credentials.
    pub async fn create(
        &self,
        domain: Option<&str>,
        local: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        match create_account(&self.api, &self.ledger, domain, local, password).await {
            Ok(created) => {
                println!(
                    "Account created and appended to {}.",
                    self.ledger.path().display()
                );
                println!("Email: {}", created.email());
                println!("Password: {}", created.password());
                Ok(())
            }
            Err(e) => soft_fail("Create failed", e),
        }
    }

    /// Creates `count` mailboxes, printing one line per attempt.
    pub async fn batch(&self, count: usize, domain: Option<&str>) -> Result<()> {
        println!("Creating {count} accounts...");
        let result = batch_create(&self.api, &self.ledger, count, domain, |position, outcome| {
            match outcome {
                Ok(created) => println!("  [{position}/{count}] {} OK", created.email()),
                Err((address, error)) => {
                    println!("  [{position}/{count}] {address} FAIL: {error}");
                }
            }
        })
        .await;

        match result {
            Ok(summary) => {
                println!(
                    "\nCreated: {}, Failed: {}",
                    summary.created.len(),
                    summary.failed.len()
                );
                Ok(())
            }
            Err(e) => soft_fail("Cannot fetch domains", e),
        }
    }

    /// Logs into a mailbox, lists it and optionally prints one message.
    pub async fn inbox(&self, email: &str, password: &str, open: Option<usize>) -> Result<()> {
        let inbox = match open_inbox(&self.api, email, password).await {
            Ok(inbox) => inbox,
            Err(e) => return soft_fail("Login failed", e),
        };
        print_messages(&inbox.messages);

        if let Some(position) = open {
            match inbox.get(position) {
                Some(summary) => self.show_message(&inbox.token, summary).await,
                None => eprintln!("No message #{position}"),
            }
        }
        Ok(())
    }

    /// Fetches and prints one message with any six-digit codes found.
    pub async fn show_message(&self, token: &str, summary: &MessageSummary) {
        let detail = match read_message(&self.api, token, &summary.id).await {
            Ok(detail) => detail,
            Err(e) => {
                eprintln!("Cannot load message: {e}");
                return;
            }
        };

        let from = if detail.from.address.is_empty() {
            &summary.from
        } else {
            &detail.from
        };
        let subject = if detail.subject.is_empty() {
            &summary.subject
        } else {
            &detail.subject
        };
        println!("\nFrom: {from}");
        println!("Subject: {subject}");
        println!("----------------------------------------");
        match detail.body() {
            Some(body) => {
                println!("{body}");
                let codes = extract_codes(&body);
                if !codes.is_empty() {
                    println!("Detected 6-digit codes: {}", codes.join(", "));
                }
            }
            None => println!("(empty message body)"),
        }
    }

    /// Loads the ledger, rewriting legacy lines, and prints it.
    pub async fn list(&self) -> Result<()> {
        let accounts = self.ledger.load_canonical().await?;
        if accounts.is_empty() {
            println!("No accounts in {}", self.ledger.path().display());
            return Ok(());
        }
        print!("{}", format_accounts(&accounts));
        Ok(())
    }

    /// Prints status and domain statistics.
    pub async fn stats(&self) -> Result<()> {
        let accounts = self.ledger.load_canonical().await?;
        let stats = LedgerStats::from_accounts(&accounts);
        print!("{}", format_stats(&stats, self.ledger.path()));
        Ok(())
    }

    /// Writes a timestamped ledger copy.
    pub async fn backup(&self, dir: Option<&Path>) -> Result<()> {
        let dir = dir.map_or_else(|| self.config.backup_dir.clone(), Path::to_path_buf);
        match self.ledger.backup(&dir).await? {
            Some(path) => println!("Backup written to {}", path.display()),
            None => println!("Nothing to back up: {} is empty", self.ledger.path().display()),
        }
        Ok(())
    }

    /// Ban-check options from config, with an optional worker cap override.
    pub fn sweep_options(&self, max_workers: Option<usize>) -> SweepOptions {
        let options = self.config.sweep_options();
        match max_workers {
            Some(max) => options.with_max_workers(max),
            None => options,
        }
    }

    /// Runs one ban-check sweep and prints its summary.
    pub async fn ban_check_once(&self, options: SweepOptions) -> Result<()> {
        println!("Running ban check on {}...", self.ledger.path().display());
        let outcome = run_ban_check(
            Arc::new(self.api.clone()),
            &self.ledger,
            options,
            Arc::new(ConsoleProgress::stdout()),
        )
        .await?;

        match outcome {
            BanCheck::NothingToCheck { total } => {
                println!("Accounts: {total} total, 0 to check.");
                println!("Nothing to check.");
            }
            BanCheck::Completed(report) => {
                println!("\n\n{report}");
                println!("  File saved: {}", self.ledger.path().display());
            }
        }
        Ok(())
    }

    /// Repeats the ban check every `interval` until Ctrl-C.
    ///
    /// An interrupted sweep is dropped before reconciliation, so the ledger
    /// keeps its previous contents.
    pub async fn ban_check_loop(&self, options: SweepOptions, interval: Duration) -> Result<()> {
        loop {
            tokio::select! {
                result = self.ban_check_once(options.clone()) => result?,
                _ = tokio::signal::ctrl_c() => {
                    println!("\nInterrupted; ledger left unchanged.");
                    return Ok(());
                }
            }

            let next = chrono::Local::now()
                + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
            println!(
                "Next check at {} (Ctrl-C to stop)",
                next.format("%H:%M:%S")
            );
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Ban check loop stopped");
                    return Ok(());
                }
            }
        }
    }
}

/// Prints a failure and carries on, except for ledger I/O failures.
fn soft_fail(context: &str, err: Error) -> Result<()> {
    match err {
        Error::LedgerRead { .. } | Error::LedgerWrite { .. } => Err(err.into()),
        other => {
            eprintln!("{context}: {other}");
            Ok(())
        }
    }
}

/// Numbered inbox listing: sender, subject and local receive time.
pub fn print_messages(messages: &[MessageSummary]) {
    if messages.is_empty() {
        println!("Inbox is empty.");
        return;
    }
    println!("\nInbox messages ({}):", messages.len());
    for (i, message) in messages.iter().enumerate() {
        let received = message
            .created_at
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:>2}. {} | {} | {received}",
            i + 1,
            message.from.address,
            message.subject
        );
    }
}

/// Numbered account listing with status tags.
pub fn format_accounts(accounts: &[Account]) -> String {
    use std::fmt::Write;

    let mut out = format!("\nAccounts ({}):\n", accounts.len());
    for (i, account) in accounts.iter().enumerate() {
        let tag = account.status.tag();
        let _ = if tag.is_empty() {
            writeln!(out, "{:>3}. {}", i + 1, account.email)
        } else {
            writeln!(out, "{:>3}. {} {tag}", i + 1, account.email)
        };
    }
    out
}

/// Analytics report: status counts, split passwords and top domains.
pub fn format_stats(stats: &LedgerStats, path: &Path) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "Ledger: {}", path.display());
    let _ = writeln!(out, "Total accounts: {}", stats.total);
    for status in AccountStatus::ALL {
        let _ = writeln!(out, "  {status}: {}", stats.count(&status));
    }
    for (status, count) in &stats.by_status {
        if matches!(AccountStatus::parse(status), AccountStatus::Other(_)) {
            let _ = writeln!(out, "  {status}: {count}");
        }
    }
    let _ = writeln!(out, "Split passwords (login;mail): {}", stats.split_passwords);
    let _ = writeln!(out, "Top domains:");
    let top = stats.top_domains(5);
    if top.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (i, (domain, count)) in top.iter().enumerate() {
        let _ = writeln!(out, " {}. {domain} - {count}", i + 1);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn account_listing_tags() {
        let accounts = vec![
            Account::new("a@x.tm", "pw"),
            Account::new("b@x.tm", "pw").with_status(AccountStatus::Banned),
            Account::new("c@x.tm", "pw").with_status(AccountStatus::InvalidPassword),
            Account::new("d@x.tm", "pw").with_status(AccountStatus::parse("team")),
        ];
        let text = format_accounts(&accounts);
        assert!(text.contains("Accounts (4):"));
        assert!(text.contains("  4. d@x.tm [team]\n"));
        assert!(text.contains("  1. a@x.tm\n"));
        assert!(text.contains("  2. b@x.tm [BANNED]\n"));
        assert!(text.contains("  3. c@x.tm [BAD PASS]\n"));
    }

    #[test]
    fn stats_report() {
        let accounts = vec![
            Account::new("a@alpha.tm", "pw").with_status(AccountStatus::Plus),
            Account::new("b@alpha.tm", "pw").with_passwords("x", "y"),
            Account::new("c@beta.tm", "pw"),
            Account::new("d@beta.tm", "pw").with_status(AccountStatus::parse("team")),
        ];
        let stats = LedgerStats::from_accounts(&accounts);
        let text = format_stats(&stats, Path::new("accounts.txt"));
        assert!(text.contains("Total accounts: 4\n"));
        assert!(text.contains("  plus: 1\n"));
        assert!(text.contains("  team: 1\n"));
        assert!(text.contains("  not_registered: 2\n"));
        assert!(text.contains("Split passwords (login;mail): 1\n"));
        assert!(text.contains(" 1. alpha.tm - 2\n"));
        assert!(text.contains(" 2. beta.tm - 2\n"));
    }

    #[test]
    fn empty_stats_report() {
        let text = format_stats(&LedgerStats::from_accounts(&[]), Path::new("a.txt"));
        assert!(text.contains("Total accounts: 0\n"));
        assert!(text.contains("  (none)\n"));
    }

    #[test]
    fn ledger_errors_are_fatal() {
        let err = Error::LedgerWrite {
            path: PathBuf::from("a.txt"),
            source: std::io::Error::other("disk full"),
        };
        assert!(soft_fail("Create failed", err).is_err());
        assert!(soft_fail("Create failed", Error::Config("x".into())).is_ok());
    }

    #[tokio::test]
    async fn backup_of_missing_ledger_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            ledger_path: dir.path().join("accounts.txt"),
            backup_dir: dir.path().join("backups"),
            ..Config::default()
        };
        let app = App::new(config).unwrap();
        app.backup(None).await.unwrap();
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn worker_cap_override() {
        let app = App::new(Config::default()).unwrap();
        assert_eq!(app.sweep_options(None).max_workers, 60);
        assert_eq!(app.sweep_options(Some(4)).max_workers, 4);
    }
}
