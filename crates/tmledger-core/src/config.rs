//! Application configuration.
//!
//! Settings live in a JSON file, by default
//! `<config dir>/tmledger/config.json`. Missing fields take their defaults,
//! and a missing default file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sweep::{DEFAULT_MAX_WORKERS, DEFAULT_PROGRESS_EVERY, SweepOptions};
use crate::{Error, Result};

/// Environment variable overriding [`Config::api_url`].
pub const ENV_API_URL: &str = "TMLEDGER_API_URL";

/// Environment variable overriding [`Config::ledger_path`].
pub const ENV_LEDGER: &str = "TMLEDGER_LEDGER";

const APP_DIR: &str = "tmledger";
const CONFIG_FILE: &str = "config.json";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the mail.tm API.
    pub api_url: String,
    /// Account ledger file.
    pub ledger_path: PathBuf,
    /// Directory for ledger snapshots.
    pub backup_dir: PathBuf,
    /// Timeout for interactive API calls.
    pub request_timeout_secs: u64,
    /// Timeout for each ban-check network call.
    pub probe_timeout_secs: u64,
    /// Upper bound on ban-check workers.
    pub max_workers: usize,
    /// Ban-check progress cadence.
    pub progress_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: tmledger_api::DEFAULT_BASE_URL.to_string(),
            ledger_path: PathBuf::from("accounts.txt"),
            backup_dir: PathBuf::from("backups"),
            request_timeout_secs: tmledger_api::DEFAULT_TIMEOUT.as_secs(),
            probe_timeout_secs: 5,
            max_workers: DEFAULT_MAX_WORKERS,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads settings and applies environment overrides.
    ///
    /// With `path`, that file must exist. Without it, the default location
    /// is used when present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path).await?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads one config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Writes the settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(path) = lookup(ENV_LEDGER).filter(|v| !v.trim().is_empty()) {
            self.ledger_path = PathBuf::from(path);
        }
    }

    /// Timeout for interactive API calls.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timeout for each ban-check network call.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Ban-check options derived from these settings.
    #[must_use]
    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions::default()
            .with_probe_timeout(self.probe_timeout())
            .with_max_workers(self.max_workers)
            .with_progress_every(self.progress_every)
    }
}
