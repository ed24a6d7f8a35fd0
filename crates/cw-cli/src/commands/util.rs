//! Shared utilities for CLI commands.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cw_core::{Aggregate, AggregateStore};
use cw_helix::{Client, HelixError};
use cw_store::AggregateFile;

use crate::Config;

/// Loads the stored aggregate (missing or malformed files read as empty).
pub fn load_aggregate(config: &Config) -> Result<Aggregate> {
    let store = AggregateFile::new(config.data().stats());
    store
        .load()
        .with_context(|| format!("failed to read {}", store.path().display()))
}

/// Reads an event log; a missing file reads as empty when `optional`.
pub fn read_log(path: &Path, optional: bool) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if optional && e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "log file does not exist yet");
            Ok(String::new())
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Builds a Helix client from the configured credentials.
pub fn helix_client(config: &Config) -> Result<Client> {
    let client_id = required(config.client_id.as_deref(), "client_id", "CW_CLIENT_ID")?;
    let access_token = required(
        config.access_token.as_deref(),
        "access_token",
        "CW_ACCESS_TOKEN",
    )?;
    Client::with_timeout(
        client_id,
        access_token,
        Duration::from_secs(config.fetch_timeout_secs.max(1)),
    )
    .context("failed to create Helix client")
}

fn required<'a>(value: Option<&'a str>, key: &str, env: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing {key} (set {env} or {key} in config.toml)"))
}

/// Adds a refresh hint to token rejections.
pub fn helix_error(err: HelixError, action: &str) -> anyhow::Error {
    if matches!(err, HelixError::Unauthorized { .. }) {
        anyhow::Error::new(err).context(format!(
            "{action}: the access token was rejected; refresh it and update CW_ACCESS_TOKEN"
        ))
    } else {
        anyhow::Error::new(err).context(action.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_are_reported() {
        let config = Config {
            client_id: Some("client".to_string()),
            access_token: Some("  ".to_string()),
            ..Config::default()
        };
        let err = helix_client(&config).unwrap_err();
        assert!(err.to_string().contains("CW_ACCESS_TOKEN"));
    }

    #[test]
    fn optional_log_reads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.txt");
        assert_eq!(read_log(&path, true).unwrap(), "");
        assert!(read_log(&path, false).is_err());
    }

    #[test]
    fn unauthorized_gets_refresh_hint() {
        let err = helix_error(
            HelixError::Unauthorized {
                message: "Invalid OAuth token".to_string(),
            },
            "failed to look up channel",
        );
        assert!(format!("{err:#}").contains("refresh"));
    }
}
