//! Per-viewer report sorted by last visit.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use cw_core::{Aggregate, IgnoreList, RECENCY_HEADERS, recency_rows, render_table};
use cw_store::{DataDir, write_atomic};

use super::util::load_aggregate;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let aggregate = load_aggregate(config)?;
    let ignore = config.ignore_list()?;
    let data = config.data();

    let table = render_report(&aggregate, &ignore, &Local);
    let path = save_report(&data, &table)?;

    write!(writer, "{table}")?;
    writeln!(writer, "Report written to {}", path.display())?;
    Ok(())
}

/// The aggregate as a table, timestamps rendered in `tz`.
pub fn render_report<Tz>(aggregate: &Aggregate, ignore: &IgnoreList, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    render_table(&RECENCY_HEADERS, &recency_rows(aggregate, ignore, tz))
}

/// Replaces `report.txt` with `table`.
pub fn save_report(data: &DataDir, table: &str) -> Result<PathBuf> {
    let path = data.report();
    write_atomic(&path, table.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use cw_core::{AggregateStore, Identity, UserRecord};
    use cw_store::AggregateFile;
    use insta::assert_snapshot;

    #[test]
    fn report_by_recency() {
        let mut aggregate = Aggregate::new();
        let start = Utc.with_ymd_and_hms(2025, 1, 29, 12, 0, 0).unwrap();
        let mut alice = UserRecord::first_visit(start);
        alice.touch(start + Duration::minutes(5));
        alice.total_watch_time = Duration::minutes(5);
        alice.entry_time = None;
        aggregate.insert(Identity::new("alice").unwrap(), alice);
        aggregate.insert(
            Identity::new("bob").unwrap(),
            UserRecord::first_visit(start + Duration::minutes(20)),
        );

        let table = render_report(&aggregate, &IgnoreList::with_defaults(), &Utc);
        assert_snapshot!(table, @r"
        +-------+--------+---------------------+---------------------+------------+
        | Nick  | Visits | First seen          | Last seen           | Watch time |
        +-------+--------+---------------------+---------------------+------------+
        | bob   | 1      | 2025-01-29 12:20:00 | 2025-01-29 12:20:00 | 00:00:00   |
        | alice | 1      | 2025-01-29 12:00:00 | 2025-01-29 12:05:00 | 00:05:00   |
        +-------+--------+---------------------+---------------------+------------+
        ");
    }

    #[test]
    fn run_writes_report_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let mut aggregate = Aggregate::new();
        aggregate.insert(
            Identity::new("alice").unwrap(),
            UserRecord::first_visit(Utc::now()),
        );
        AggregateFile::new(config.data().stats())
            .save(&aggregate)
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let saved = std::fs::read_to_string(config.data().report()).unwrap();
        assert!(saved.contains("| alice "));
        assert!(output.starts_with(&saved));
        assert!(output.contains("Report written to"));
    }
}
