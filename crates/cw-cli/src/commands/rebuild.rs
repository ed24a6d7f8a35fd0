//! Regenerate the aggregate by replaying an event log.

use std::convert::Infallible;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use cw_core::{Aggregate, AggregateStore, IgnoreList, Ledger, ReplaySummary, parse_log, replay};
use cw_store::{AggregateFile, LiveLock};

use super::util::read_log;
use crate::Config;

/// Keeps the replayed aggregate in memory only; it is saved once at the end.
#[derive(Debug)]
struct Unsaved;

impl AggregateStore for Unsaved {
    type Error = Infallible;

    fn load(&self) -> Result<Aggregate, Infallible> {
        Ok(Aggregate::new())
    }

    fn save(&self, _aggregate: &Aggregate) -> Result<(), Infallible> {
        Ok(())
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    log: Option<&Path>,
    force_close: bool,
) -> Result<()> {
    let data = config.data();
    data.ensure()
        .with_context(|| format!("failed to create {}", data.root().display()))?;
    let ignore = config.ignore_list()?;

    let _lock = LiveLock::acquire(data.lock())
        .context("cannot rebuild while `cw watch` is running")?;

    let (log_path, optional) = match log {
        Some(path) => (path.to_path_buf(), false),
        None => (data.alltime_log(), true),
    };
    let text = read_log(&log_path, optional)?;

    let (aggregate, summary) = rebuild(&text, ignore, force_close);
    let store = AggregateFile::new(data.stats());
    store
        .save(&aggregate)
        .with_context(|| format!("failed to write {}", store.path().display()))?;

    writeln!(
        writer,
        "Replayed {} arrival(s) and {} departure(s) from {} ({} skipped)",
        summary.arrivals,
        summary.departures,
        log_path.display(),
        summary.skipped
    )?;
    if summary.force_closed > 0 {
        writeln!(writer, "Closed {} open session(s) at the current time", summary.force_closed)?;
    }
    writeln!(
        writer,
        "Wrote {} viewer(s) to {}",
        aggregate.len(),
        store.path().display()
    )?;
    Ok(())
}

fn rebuild(text: &str, ignore: IgnoreList, force_close: bool) -> (Aggregate, ReplaySummary) {
    let mut ledger = Ledger::from_aggregate(Unsaved, Aggregate::new(), ignore);
    let summary = replay(&mut ledger, parse_log(text), force_close.then(Utc::now));
    if ledger.clock_anomalies() > 0 {
        tracing::warn!(
            count = ledger.clock_anomalies(),
            "log contains sessions that ended before they started"
        );
    }
    (ledger.into_aggregate(), summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const LOG: &str = "\
[2025-01-29 12:00:00] [JOIN] User 'alice' joined the chat
[2025-01-29 12:05:30] [LEAVE] User 'alice' left the chat
[2025-01-29 12:10:00] [JOIN] User 'alice' joined the chat
[2025-01-29 12:20:00] [LEAVE] User 'alice' left the chat
[2025-01-29 12:11:00] [JOIN] User 'bob' joined the chat
";

    #[test]
    fn replay_counts_every_session() {
        let (aggregate, summary) = rebuild(LOG, IgnoreList::with_defaults(), false);
        assert_eq!(summary.arrivals, 3);
        assert_eq!(summary.departures, 2);

        let alice = aggregate.get("alice").unwrap();
        assert_eq!(alice.visits, 2);
        assert_eq!(alice.total_watch_time, Duration::seconds(330 + 600));
        assert!(aggregate.get("bob").unwrap().is_open());
    }

    #[test]
    fn force_close_leaves_nothing_open() {
        let (aggregate, summary) = rebuild(LOG, IgnoreList::with_defaults(), true);
        assert_eq!(summary.force_closed, 1);
        assert_eq!(aggregate.open_entries().count(), 0);
    }

    #[test]
    fn run_replaces_aggregate_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let log = temp.path().join("log.txt");
        std::fs::write(&log, LOG).unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, Some(&log), false).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Replayed 3 arrival(s) and 2 departure(s)"));
        assert!(output.contains("Wrote 2 viewer(s)"));

        let stored = AggregateFile::new(config.data().stats()).load().unwrap();
        assert_eq!(stored.get("alice").unwrap().visits, 2);
    }
}
