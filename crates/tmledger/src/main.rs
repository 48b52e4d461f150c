//! `tmledger` - mail.tm account ledger
//!
//! Creates mailboxes, reads their inboxes and sweeps the saved accounts for
//! suspension notices.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod menu;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tmledger_core::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use commands::App;

const DEFAULT_LOG_FILTER: &str = "tmledger=info,tmledger_core=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so menu and progress output stay readable
    let filter = cli.log_level.as_deref().map_or_else(
        || {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
        },
        tracing_subscriber::EnvFilter::new,
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    apply_flags(&mut config, &cli);
    info!("Using ledger {:?}", config.ledger_path);

    let app = App::new(config)?;
    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => menu::run(&app).await,
        Command::Domains => app.domains().await,
        Command::Create {
            domain,
            local,
            password,
        } => {
            app.create(domain.as_deref(), local.as_deref(), password.as_deref())
                .await
        }
        Command::Batch { count, domain } => app.batch(usize::from(count), domain.as_deref()).await,
        Command::Inbox {
            email,
            password,
            open,
        } => app.inbox(&email, &password, open).await,
        Command::List => app.list().await,
        Command::Stats => app.stats().await,
        Command::Backup { dir } => app.backup(dir.as_deref()).await,
        Command::BanCheck {
            once,
            interval,
            max_workers,
        } => {
            let options = app.sweep_options(max_workers);
            if once {
                app.ban_check_once(options).await
            } else {
                app.ban_check_loop(options, loop_interval(interval)).await
            }
        }
    }
}

/// Pause between looped ban checks.
const fn loop_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Command-line flags win over the config file and environment.
fn apply_flags(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.ledger {
        config.ledger_path.clone_from(path);
    }
    if let Some(url) = &cli.api_url {
        config.api_url.clone_from(url);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "tmledger",
            "--ledger",
            "fleet.txt",
            "--api-url",
            "http://127.0.0.1:9000",
            "list",
        ])
        .unwrap();
        let mut config = Config::default();
        apply_flags(&mut config, &cli);
        assert_eq!(config.ledger_path, PathBuf::from("fleet.txt"));
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn interval_in_minutes() {
        assert_eq!(loop_interval(30), Duration::from_secs(1800));
        assert_eq!(loop_interval(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["tmledger", "list"]).unwrap();
        let mut config = Config::default();
        apply_flags(&mut config, &cli);
        assert_eq!(config, Config::default());
    }
}
