//! Status command for showing configuration and stored totals.

use std::fs;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use cw_core::{ViewerSnapshot, format_hms};
use cw_store::{LiveLock, StoreError, run_logs};

use super::util::load_aggregate;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let data = config.data();
    let aggregate = load_aggregate(config)?;
    let ignore = config.ignore_list()?;

    writeln!(writer, "chatwatch status")?;
    writeln!(writer, "Data directory: {}", data.root().display())?;

    let channel = config.channel.as_deref().unwrap_or("(not set)");
    match config.broadcaster_id.as_deref() {
        Some(id) => writeln!(writer, "Channel: {channel} (id {id})")?,
        None => writeln!(writer, "Channel: {channel}")?,
    }
    let token = if config.access_token.as_deref().is_some_and(|t| !t.trim().is_empty()) {
        "set"
    } else {
        "missing"
    };
    writeln!(writer, "Access token: {token}")?;
    writeln!(writer, "Watcher: {}", watcher_state(config))?;

    writeln!(writer, "Viewers recorded: {}", aggregate.len())?;
    writeln!(
        writer,
        "Total watch time: {}",
        format_hms(aggregate.total_watch_time())
    )?;
    writeln!(writer, "Open sessions: {}", aggregate.open_entries().count())?;
    writeln!(writer, "Ignored accounts: {}", ignore.len())?;
    writeln!(writer, "Run logs pending archive: {}", run_logs(&data)?.len())?;

    match last_update(config) {
        Some(at) => writeln!(writer, "Live view updated: {}", at.to_rfc3339())?,
        None => writeln!(writer, "Live view updated: never")?,
    }
    Ok(())
}

fn watcher_state(config: &Config) -> &'static str {
    let data = config.data();
    if !data.root().exists() {
        return "not running";
    }
    match LiveLock::acquire(data.lock()) {
        Ok(_) => "not running",
        Err(StoreError::Locked { .. }) => "running",
        Err(e) => {
            tracing::debug!(error = %e, "could not probe watcher lock");
            "unknown"
        }
    }
}

fn last_update(config: &Config) -> Option<DateTime<Utc>> {
    let content = fs::read_to_string(config.data().live()).ok()?;
    let view: ViewerSnapshot = serde_json::from_str(&content).ok()?;
    Some(view.updated_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use cw_core::{Aggregate, AggregateStore, IgnoreList, Identity, UserRecord};
    use cw_store::{AggregateFile, write_json_atomic};
    use insta::assert_snapshot;

    #[test]
    fn status_reports_totals() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            channel: Some("somechannel".to_string()),
            access_token: Some("secret".to_string()),
            ..Config::default()
        };
        let data = config.data();
        data.ensure().unwrap();

        let at = Utc.with_ymd_and_hms(2025, 1, 29, 12, 0, 0).unwrap();
        let mut aggregate = Aggregate::new();
        let mut alice = UserRecord::first_visit(at);
        alice.total_watch_time = Duration::minutes(90);
        alice.entry_time = None;
        aggregate.insert(Identity::new("alice").unwrap(), alice);
        aggregate.insert(Identity::new("bob").unwrap(), UserRecord::first_visit(at));
        AggregateFile::new(data.stats()).save(&aggregate).unwrap();

        let present = [Identity::new("bob").unwrap()];
        let view = ViewerSnapshot::build(&present, &aggregate, &IgnoreList::with_defaults(), 5, at);
        write_json_atomic(&data.live(), &view).unwrap();
        fs::write(data.logs_dir().join("chatters_log_2025-01-29_12-00-00.txt"), "x").unwrap();

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&temp.path().display().to_string(), "[TEMP]");
        assert_snapshot!(output, @r"
        chatwatch status
        Data directory: [TEMP]
        Channel: somechannel
        Access token: set
        Watcher: not running
        Viewers recorded: 2
        Total watch time: 01:30:00
        Open sessions: 1
        Ignored accounts: 8
        Run logs pending archive: 1
        Live view updated: 2025-01-29T12:00:00+00:00
        ");
    }

    #[test]
    fn status_detects_running_watcher() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let _held = LiveLock::acquire(config.data().lock()).unwrap();
        assert_eq!(watcher_state(&config), "running");
    }
}
