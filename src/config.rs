//! Settings file and environment handling.
//!
//! Settings come from an optional TOML file, overlaid with `BLOCKWATCH_*`
//! environment variables. Command-line flags are applied on top by the
//! binary.
//!
//! ```toml
//! history_len = 30
//! stale_after = "1m"
//! refresh = "500ms"
//! command = "drbdsetup events2 --timestamps --statistics"
//! poll_command = "drbdsetup events2 --timestamps --statistics --now"
//! log_file = "/var/log/blockwatch.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::data::DEFAULT_HISTORY_LEN;

/// Environment variable prefix, e.g. `BLOCKWATCH_STALE_AFTER=10s`.
pub const ENV_PREFIX: &str = "BLOCKWATCH";

pub const DEFAULT_COMMAND: &str = "drbdsetup events2 --timestamps --statistics";
pub const DEFAULT_POLL_COMMAND: &str = "drbdsetup events2 --timestamps --statistics --now";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Samples kept per rate history.
    pub history_len: usize,
    /// Connections without events for this long are flagged stale.
    pub stale_after: String,
    /// How often the display refreshes and statistics are re-polled.
    pub refresh: String,
    /// Long-running event stream command.
    pub command: String,
    /// Statistics dump re-run every refresh; empty disables polling.
    pub poll_command: String,
    /// Log destination while the TUI owns the terminal.
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            stale_after: "30s".to_string(),
            refresh: "1s".to_string(),
            command: DEFAULT_COMMAND.to_string(),
            poll_command: DEFAULT_POLL_COMMAND.to_string(),
            log_file: PathBuf::from("blockwatch.log"),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read settings")?;

        let settings: Settings = config.try_deserialize().context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would only fail later.
    pub fn validate(&self) -> Result<()> {
        if self.history_len == 0 {
            anyhow::bail!("history_len must be at least 1");
        }
        self.stale_after()?;
        self.refresh()?;
        Ok(())
    }

    pub fn stale_after(&self) -> Result<TimeDelta> {
        let d = parse_duration(&self.stale_after)
            .with_context(|| format!("Invalid stale_after: {}", self.stale_after))?;
        TimeDelta::from_std(d).context("stale_after out of range")
    }

    pub fn refresh(&self) -> Result<Duration> {
        let d = parse_duration(&self.refresh)
            .with_context(|| format!("Invalid refresh: {}", self.refresh))?;
        if d.is_zero() {
            anyhow::bail!("refresh must be greater than zero");
        }
        Ok(d)
    }

    /// The statistics poll command, if enabled.
    pub fn poll_command(&self) -> Option<&str> {
        let cmd = self.poll_command.trim();
        (!cmd.is_empty()).then_some(cmd)
    }
}
