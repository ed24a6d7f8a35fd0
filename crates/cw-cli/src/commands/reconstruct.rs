//! Session table rebuilt from an event log.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use cw_core::{
    IgnoreList, RECONSTRUCTION_HEADERS, ReconstructOptions, parse_log, reconstruct, render_table,
    rows_to_cells,
};
use cw_store::{DataDir, write_atomic};

use super::util::read_log;
use crate::Config;

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    log: Option<&Path>,
    force_close: bool,
) -> Result<()> {
    let data = config.data();
    let ignore = config.ignore_list()?;
    let (log_path, optional) = match log {
        Some(path) => (path.to_path_buf(), false),
        None => (data.alltime_log(), true),
    };

    let text = read_log(&log_path, optional)?;
    let (table, path) = write_reconstruction(&data, &text, force_close, ignore)?;

    write!(writer, "{table}")?;
    writeln!(writer, "Table written to {}", path.display())?;
    Ok(())
}

/// Reconstructs `text` as of now and replaces `result_table.txt`.
pub fn write_reconstruction(
    data: &DataDir,
    text: &str,
    force_close: bool,
    ignore: IgnoreList,
) -> Result<(String, PathBuf)> {
    let options = ReconstructOptions {
        force_close,
        now: Local::now().naive_local(),
        ignore,
    };
    let table = render_reconstruction(text, &options);

    let path = data.result_table();
    write_atomic(&path, table.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok((table, path))
}

pub fn render_reconstruction(text: &str, options: &ReconstructOptions) -> String {
    let events = parse_log(text);
    let rows = reconstruct(&events, options);
    tracing::debug!(events = events.len(), rows = rows.len(), "reconstructed log");
    render_table(&RECONSTRUCTION_HEADERS, &rows_to_cells(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insta::assert_snapshot;

    const LOG: &str = "\
[2025-01-29 12:00:00] [JOIN] User 'alice' joined the chat
[2025-01-29 12:01:00] [JOIN] User 'nightbot' joined the chat
[2025-01-29 12:05:30] [LEAVE] User 'alice' left the chat
[2025-01-29 12:10:00] [JOIN] User 'bob' joined the chat
";

    fn options(force_close: bool) -> ReconstructOptions {
        ReconstructOptions {
            force_close,
            now: NaiveDate::from_ymd_opt(2025, 1, 29)
                .unwrap()
                .and_hms_opt(12, 40, 0)
                .unwrap(),
            ignore: IgnoreList::with_defaults(),
        }
    }

    #[test]
    fn table_without_force_close() {
        assert_snapshot!(render_reconstruction(LOG, &options(false)), @r"
        +-------+------+---------------------+---------------------+------------+
        | Nick  | Days | First seen          | Last seen           | Duration   |
        +-------+------+---------------------+---------------------+------------+
        | bob   | 1    | 2025-01-29 12:10:00 | 2025-01-29 12:10:00 | never left |
        | alice | 1    | 2025-01-29 12:00:00 | 2025-01-29 12:00:00 | 00:05:30   |
        +-------+------+---------------------+---------------------+------------+
        ");
    }

    #[test]
    fn force_close_uses_now() {
        let table = render_reconstruction(LOG, &options(true));
        assert!(table.contains("| bob   | 1    | 2025-01-29 12:10:00 | 2025-01-29 12:10:00 | 00:30:00 |"));
    }

    #[test]
    fn run_writes_result_table() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &config, None, false).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("no data\n"));
        assert_eq!(
            std::fs::read_to_string(config.data().result_table()).unwrap(),
            "no data\n"
        );
    }

    #[test]
    fn explicit_missing_log_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let missing = temp.path().join("nope.txt");
        assert!(run(&mut Vec::new(), &config, Some(&missing), false).is_err());
    }
}
