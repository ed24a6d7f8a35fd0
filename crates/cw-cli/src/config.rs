//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cw_core::IgnoreList;
use cw_store::{DataDir, IgnoreFile};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the aggregate, views, and logs.
    pub data_dir: PathBuf,
    /// Twitch application client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// User access token with `moderator:read:chatters`.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Channel login to watch.
    #[serde(default)]
    pub channel: Option<String>,
    /// Broadcaster id; looked up from `channel` when absent.
    #[serde(default)]
    pub broadcaster_id: Option<String>,
    pub poll_interval_secs: u64,
    pub retry_delay_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Leaderboard length in `live.json` and `cw top`.
    pub top_n: usize,
    /// Accounts ignored in addition to the built-in bot list.
    #[serde(default)]
    pub ignored_users: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("client_id", &self.client_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("channel", &self.channel)
            .field("broadcaster_id", &self.broadcaster_id)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("top_n", &self.top_n)
            .field("ignored_users", &self.ignored_users)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from("chatwatch")),
            client_id: None,
            access_token: None,
            channel: None,
            broadcaster_id: None,
            poll_interval_secs: 10,
            retry_delay_secs: 20,
            fetch_timeout_secs: 10,
            top_n: 10,
            ignored_users: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `~/.config/chatwatch/config.toml`,
    /// the given file, then `CW_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("CW_"));

        figment.extract()
    }

    pub fn data(&self) -> DataDir {
        DataDir::new(&self.data_dir)
    }

    /// Built-in bots, `ignored_users`, and the entries of `ignore.json`.
    pub fn ignore_list(&self) -> Result<IgnoreList> {
        let file = IgnoreFile::new(self.data().ignore());
        let from_file = file
            .load()
            .with_context(|| format!("failed to read {}", file.path().display()))?;

        let mut ignore = IgnoreList::with_defaults();
        ignore.extend(&self.ignored_users);
        ignore.extend(from_file);
        Ok(ignore)
    }
}

/// Returns the platform-specific config directory for chatwatch.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chatwatch"))
}

/// Returns the platform-specific data directory for chatwatch.
///
/// On Linux: `~/.local/share/chatwatch`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("chatwatch"))
}
