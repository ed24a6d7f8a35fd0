//! Merge run logs into the all-time log.

use std::io::Write;

use anyhow::{Context, Result};
use cw_store::{LiveLock, archive_run_logs};

use super::reconstruct::write_reconstruction;
use super::util::read_log;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let data = config.data();
    data.ensure()
        .with_context(|| format!("failed to create {}", data.root().display()))?;
    let ignore = config.ignore_list()?;

    // The active run log must not be moved out from under the watcher.
    let _lock = LiveLock::acquire(data.lock())
        .context("cannot archive while `cw watch` is running")?;

    let summary = archive_run_logs(&data).context("failed to archive run logs")?;
    tracing::info!(
        merged = summary.merged.len(),
        removed_empty = summary.removed_empty,
        failed = summary.failed,
        "archived run logs"
    );

    writeln!(
        writer,
        "Archived {} run log(s) into {}",
        summary.merged.len(),
        data.alltime_log().display()
    )?;
    if summary.removed_empty > 0 {
        writeln!(writer, "Removed {} empty run log(s)", summary.removed_empty)?;
    }
    if summary.failed > 0 {
        writeln!(
            writer,
            "Warning: {} run log(s) could not be archived and were left in place",
            summary.failed
        )?;
    }

    let text = read_log(&data.alltime_log(), true)?;
    let (table, path) = write_reconstruction(&data, &text, false, ignore)?;
    write!(writer, "{table}")?;
    writeln!(writer, "Table written to {}", path.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn archive_merges_and_reconstructs() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let data = config.data();
        data.ensure().unwrap();
        fs::write(
            data.logs_dir().join("chatters_log_2025-01-29_12-00-00.txt"),
            "[2025-01-29 12:00:00] [JOIN] User 'alice' joined the chat\n\
             [2025-01-29 12:05:30] [LEAVE] User 'alice' left the chat\n",
        )
        .unwrap();
        fs::write(data.logs_dir().join("chatters_log_2025-01-29_13-00-00.txt"), "").unwrap();

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Archived 1 run log(s)"));
        assert!(output.contains("Removed 1 empty run log(s)"));
        assert!(output.contains("| alice | 1    | 2025-01-29 12:00:00 | 2025-01-29 12:00:00 | 00:05:30 |"));
        assert!(cw_store::run_logs(&data).unwrap().is_empty());
        assert!(data.result_table().exists());
    }

    #[test]
    fn refuses_while_watcher_holds_lock() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        config.data().ensure().unwrap();
        let _held = LiveLock::acquire(config.data().lock()).unwrap();

        let err = run(&mut Vec::new(), &config).unwrap_err();
        assert!(err.to_string().contains("cw watch"));
    }
}
