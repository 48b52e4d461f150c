//! Applies sweep results to the ledger.

use std::sync::Arc;

use tracing::{info, warn};

use super::pool::{Sweep, SweepOptions, SweepReport};
use super::probe::ProbeOutcome;
use super::progress::ProgressSink;
use crate::Result;
use crate::account::{Account, Ledger};
use crate::provider::MailProvider;

/// Applies status changes to `accounts` and returns how many were applied.
///
/// Outcomes without a status change, and outcomes whose index is out of
/// range, are ignored.
pub fn reconcile(accounts: &mut [Account], outcomes: &[ProbeOutcome]) -> usize {
    let mut applied = 0;
    for outcome in outcomes {
        let Some(status) = outcome.classification.status_change() else {
            continue;
        };
        match accounts.get_mut(outcome.account_index) {
            Some(account) => {
                account.status = status;
                applied += 1;
            }
            None => warn!(
                "Ignoring outcome for account #{} outside the ledger",
                outcome.account_index
            ),
        }
    }
    applied
}

/// Result of [`run_ban_check`].
#[derive(Debug, Clone)]
pub enum BanCheck {
    /// No account was eligible; the ledger was left untouched.
    NothingToCheck {
        /// Accounts in the ledger.
        total: usize,
    },
    /// The sweep ran and the ledger was rewritten.
    Completed(SweepReport),
}

/// Loads the ledger, sweeps it, applies the results and saves it.
///
/// The ledger is read once before the sweep and written once after every
/// worker has finished. Account order and all fields other than `status`
/// are preserved.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written.
pub async fn run_ban_check<P: MailProvider>(
    provider: Arc<P>,
    ledger: &Ledger,
    options: SweepOptions,
    sink: Arc<dyn ProgressSink>,
) -> Result<BanCheck> {
    let mut accounts = ledger.load_canonical().await?;
    let total = accounts.len();
    let eligible = accounts.iter().filter(|a| a.is_eligible()).count();
    if eligible == 0 {
        info!("Ban check: no accounts to check ({total} in ledger)");
        return Ok(BanCheck::NothingToCheck { total });
    }

    let report = Sweep::new(provider, options)
        .with_progress(sink)
        .run(&accounts)
        .await;

    let applied = reconcile(&mut accounts, &report.outcomes);
    ledger.save(&accounts).await?;

    info!(
        "Ban check finished: {} checked, {} banned, {} invalid password, {} errors, {applied} updated",
        report.checked, report.banned, report.invalid_password, report.errors
    );
    Ok(BanCheck::Completed(report))
}
