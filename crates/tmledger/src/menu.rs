//! Interactive numbered menu.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::commands::{App, SHOWN_DOMAINS, print_messages};

const MENU: &str = "
=== tmledger (mail.tm) ===
1. Create account (interactive)
2. Batch create accounts
3. Login + read inbox
4. List accounts
5. Ban check
6. Exit";

/// Line-oriented prompt over an input stream.
pub struct Prompt<R> {
    lines: Lines<R>,
}

impl Prompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Prints `label` and reads one trimmed line; `None` at end of input.
    pub async fn line(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    /// Reads a non-empty line, asking again on empty input.
    pub async fn required(&mut self, label: &str) -> Result<Option<String>> {
        loop {
            match self.line(label).await? {
                Some(line) if line.is_empty() => {}
                other => return Ok(other),
            }
        }
    }

    /// Reads a number in `min..=max`; empty input gives `default`.
    pub async fn number(
        &mut self,
        label: &str,
        min: usize,
        max: usize,
        default: usize,
    ) -> Result<Option<usize>> {
        loop {
            let Some(line) = self.line(label).await? else {
                return Ok(None);
            };
            match parse_choice(&line, min, max, default) {
                Some(value) => return Ok(Some(value)),
                None => println!("Enter a number from {min} to {max}."),
            }
        }
    }
}

fn parse_choice(line: &str, min: usize, max: usize, default: usize) -> Option<usize> {
    if line.is_empty() {
        return Some(default);
    }
    line.parse()
        .ok()
        .filter(|value| (min..=max).contains(value))
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Runs the menu until the user exits or input ends.
pub async fn run(app: &App) -> Result<()> {
    let mut prompt = Prompt::stdin();
    loop {
        println!("{MENU}");
        let Some(choice) = prompt.number("Choose [1-6]: ", 1, 6, 6).await? else {
            return Ok(());
        };
        debug!("Menu choice {choice}");

        match choice {
            1 => create(app, &mut prompt).await?,
            2 => {
                let Some(count) = prompt
                    .number("How many accounts to create [1-100]: ", 1, 100, 1)
                    .await?
                else {
                    return Ok(());
                };
                app.batch(count, None).await?;
            }
            3 => inbox(app, &mut prompt).await?,
            4 => app.list().await?,
            5 => app.ban_check_once(app.sweep_options(None)).await?,
            _ => return Ok(()),
        }
    }
}

async fn create<R: AsyncBufRead + Unpin>(app: &App, prompt: &mut Prompt<R>) -> Result<()> {
    let domains = match app.api().domains().await {
        Ok(domains) => domains,
        Err(e) => {
            eprintln!("Cannot fetch domains: {e}");
            return Ok(());
        }
    };

    if domains.is_empty() {
        eprintln!("No domains available.");
        return Ok(());
    }

    println!("\nAvailable domains:");
    let shown = domains.len().min(SHOWN_DOMAINS);
    for (i, domain) in domains.iter().take(shown).enumerate() {
        println!("  {}. {}", i + 1, domain.domain);
    }
    let Some(index) = prompt
        .number("Choose domain index [default 1]: ", 1, shown, 1)
        .await?
    else {
        return Ok(());
    };
    let Some(domain) = domains.get(index - 1).map(|d| d.domain.clone()) else {
        return Ok(());
    };

    let local = optional(prompt.line("Local part (empty = auto): ").await?);
    let password = optional(prompt.line("Password (empty = auto): ").await?);
    app.create(Some(&domain), local.as_deref(), password.as_deref())
        .await
}

async fn inbox<R: AsyncBufRead + Unpin>(app: &App, prompt: &mut Prompt<R>) -> Result<()> {
    let Some(email) = prompt.required("Email: ").await? else {
        return Ok(());
    };
    let Some(password) = prompt.required("Password: ").await? else {
        return Ok(());
    };

    let inbox = match tmledger_core::open_inbox(app.api(), &email, &password).await {
        Ok(inbox) => inbox,
        Err(e) => {
            eprintln!("Login failed: {e}");
            return Ok(());
        }
    };
    print_messages(&inbox.messages);
    if inbox.messages.is_empty() {
        return Ok(());
    }

    loop {
        let Some(position) = prompt
            .number("\nOpen message # (0 = back): ", 0, inbox.messages.len(), 0)
            .await?
        else {
            return Ok(());
        };
        let Some(summary) = inbox.get(position) else {
            return Ok(());
        };
        app.show_message(&inbox.token, summary).await;
    }
}
