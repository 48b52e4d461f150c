//! Mailbox creation.

use rand::Rng;
use rand::seq::SliceRandom;
use tmledger_api::{ApiClient, Domain};
use tracing::{info, warn};

use crate::account::{Account, Ledger, validate_account};
use crate::{Error, Result};

const LOCAL_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const PASSWORD_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const LOCAL_LEN: usize = 12;
const PASSWORD_LEN: usize = 14;

fn random_string(len: usize, charset: &[u8]) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(charset[rng.gen_range(0..charset.len())]))
        .collect()
}

/// Random 12-character local part from `[a-z0-9]`.
#[must_use]
pub fn generate_local_part() -> String {
    random_string(LOCAL_LEN, LOCAL_CHARSET)
}

/// Random 14-character password from `[A-Za-z0-9]`.
#[must_use]
pub fn generate_password() -> String {
    random_string(PASSWORD_LEN, PASSWORD_CHARSET)
}

/// Picks a random active domain, falling back to any domain.
#[must_use]
pub fn pick_domain(domains: &[Domain]) -> Option<&Domain> {
    let active: Vec<&Domain> = domains.iter().filter(|d| d.is_active).collect();
    let mut rng = rand::thread_rng();
    active
        .choose(&mut rng)
        .copied()
        .or_else(|| domains.choose(&mut rng))
}

/// A mailbox that was created and saved.
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    /// The account as appended to the ledger.
    pub account: Account,
}

impl CreatedAccount {
    /// Full address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.account.email
    }

    /// Mailbox password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.account.mail_password
    }
}

/// Creates one mailbox and appends it to the ledger.
///
/// Without `domain`, a random active domain is fetched from the API. Missing
/// local part and password are generated.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an unusable address or password, an
/// API error if the mailbox cannot be created, or a write error if the
/// ledger cannot be appended to.
pub async fn create_account(
    api: &ApiClient,
    ledger: &Ledger,
    domain: Option<&str>,
    local: Option<&str>,
    password: Option<&str>,
) -> Result<CreatedAccount> {
    let domain = match domain.map(str::trim).filter(|d| !d.is_empty()) {
        Some(domain) => domain.to_string(),
        None => {
            let domains = api.domains().await?;
            pick_domain(&domains)
                .map(|d| d.domain.clone())
                .ok_or_else(|| {
                    tmledger_api::Error::InvalidResponse("no domains returned".to_string())
                })?
        }
    };
    let local = local
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(generate_local_part, str::to_lowercase);
    let password = password
        .filter(|p| !p.is_empty())
        .map_or_else(generate_password, ToString::to_string);

    let account = Account::new(format!("{local}@{domain}"), password);
    validate_account(&account).map_err(Error::Validation)?;

    api.create_account(&account.email, &account.mail_password)
        .await?;
    ledger.append(&account).await?;

    info!("Created mailbox {}", account.email);
    Ok(CreatedAccount { account })
}

/// Result of [`batch_create`].
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Mailboxes created and saved, in creation order.
    pub created: Vec<CreatedAccount>,
    /// Failed attempts as `(address, error)`.
    pub failed: Vec<(String, String)>,
}

impl BatchSummary {
    /// Number of attempts.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.created.len() + self.failed.len()
    }
}

/// Creates `count` mailboxes one after another.
///
/// Each mailbox gets a random domain unless `domain` is given. A failed
/// attempt is logged and recorded; the batch carries on. `on_result` is
/// called after every attempt with its 1-based position and outcome.
///
/// # Errors
///
/// Returns an error only if the domain list cannot be fetched.
pub async fn batch_create<F>(
    api: &ApiClient,
    ledger: &Ledger,
    count: usize,
    domain: Option<&str>,
    mut on_result: F,
) -> Result<BatchSummary>
where
    F: FnMut(usize, std::result::Result<&CreatedAccount, (&str, &str)>),
{
    let domains = match domain.map(str::trim).filter(|d| !d.is_empty()) {
        Some(domain) => vec![domain.to_string()],
        None => {
            let fetched = api.domains().await?;
            let active: Vec<String> = fetched
                .iter()
                .filter(|d| d.is_active)
                .map(|d| d.domain.clone())
                .collect();
            if active.is_empty() {
                fetched.into_iter().map(|d| d.domain).collect()
            } else {
                active
            }
        }
    };

    let mut summary = BatchSummary::default();
    for position in 1..=count {
        let domain = domains
            .choose(&mut rand::thread_rng())
            .map_or("", String::as_str);
        let local = generate_local_part();
        match create_account(api, ledger, Some(domain), Some(&local), None).await {
            Ok(created) => {
                on_result(position, Ok(&created));
                summary.created.push(created);
            }
            Err(e) => {
                let address = format!("{local}@{domain}");
                let message = e.to_string();
                warn!("Batch create {position}/{count} failed for {address}: {message}");
                on_result(position, Err((address.as_str(), message.as_str())));
                summary.failed.push((address, message));
            }
        }
    }

    info!(
        "Batch create finished: {} created, {} failed",
        summary.created.len(),
        summary.failed.len()
    );
    Ok(summary)
}
