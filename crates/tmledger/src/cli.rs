//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Longest pause allowed between looped ban checks: one week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Create, read and ban-check mail.tm mailboxes kept in a plain-text ledger.
#[derive(Parser, Debug)]
#[command(name = "tmledger", author, version, about)]
pub struct Cli {
    /// Account ledger file (overrides the config file)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Config file (default: <config dir>/tmledger/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// mail.tm API base URL (overrides the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log filter, e.g. `info` or `tmledger_core=debug`
    #[arg(long, global = true, env = "TMLEDGER_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands; the interactive menu runs when none is given.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive numbered menu
    Menu,

    /// List the domains mailboxes can be created on
    Domains,

    /// Create one mailbox and save it to the ledger
    Create {
        /// Domain (random active domain if omitted)
        #[arg(long)]
        domain: Option<String>,
        /// Local part (random if omitted)
        #[arg(long)]
        local: Option<String>,
        /// Password (random if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create several mailboxes
    Batch {
        /// Number of mailboxes
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=100))]
        count: u16,
        /// Domain for every mailbox (random per mailbox if omitted)
        #[arg(long)]
        domain: Option<String>,
    },

    /// Log into a mailbox and list its messages
    Inbox {
        /// Mailbox address
        #[arg(long)]
        email: String,
        /// Mailbox password
        #[arg(long)]
        password: String,
        /// Also print the message at this 1-based position
        #[arg(long)]
        open: Option<usize>,
    },

    /// List saved accounts
    List,

    /// Status and domain breakdown of the ledger
    Stats,

    /// Write a timestamped copy of the ledger
    Backup {
        /// Target directory (default from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Log into every saved mailbox and mark banned or broken accounts
    BanCheck {
        /// Run one sweep and exit
        #[arg(long)]
        once: bool,
        /// Minutes between sweeps (at most one week)
        #[arg(
            long,
            default_value_t = 30,
            value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES)
        )]
        interval: u64,
        /// Upper bound on concurrent logins
        #[arg(long)]
        max_workers: Option<usize>,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["tmledger"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn ban_check_defaults() {
        let cli = Cli::try_parse_from(["tmledger", "ban-check"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::BanCheck {
                once: false,
                interval: 30,
                max_workers: None,
            })
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tmledger",
            "ban-check",
            "--once",
            "--max-workers",
            "12",
            "--ledger",
            "fleet.txt",
        ])
        .unwrap();
        assert_eq!(cli.ledger, Some(PathBuf::from("fleet.txt")));
        assert!(matches!(
            cli.command,
            Some(Command::BanCheck {
                once: true,
                max_workers: Some(12),
                ..
            })
        ));
    }

    #[test]
    fn batch_count_is_bounded() {
        assert!(Cli::try_parse_from(["tmledger", "batch", "--count", "0"]).is_err());
        assert!(Cli::try_parse_from(["tmledger", "batch", "--count", "101"]).is_err());
        let cli = Cli::try_parse_from(["tmledger", "batch", "--count", "5"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Batch {
                count: 5,
                domain: None,
            })
        );
    }

    #[test]
    fn interval_is_bounded() {
        let too_long = (MAX_INTERVAL_MINUTES + 1).to_string();
        assert!(Cli::try_parse_from(["tmledger", "ban-check", "--interval", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["tmledger", "ban-check", "--interval", too_long.as_str()])
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["tmledger", "ban-check", "--interval", "18446744073709551615"])
                .is_err()
        );
        let cli = Cli::try_parse_from(["tmledger", "ban-check", "--interval", "10080"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::BanCheck { interval: 10_080, .. })
        ));
    }
}
