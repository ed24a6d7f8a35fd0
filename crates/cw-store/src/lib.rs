//! File persistence for chatwatch.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data_dir>/
//!   stats.json          aggregate, replaced atomically on every save
//!   stats.lock          held exclusively by the live writer
//!   live.json           derived view, regenerated each cycle
//!   ignore.json         extra ignored identities (JSON array)
//!   report.txt          aggregate table by recency
//!   result_table.txt    reconstruction table
//!   logs/
//!     chatters_log_YYYY-MM-DD_HH-MM-SS.txt   one per live run
//!     chatters_alltime.txt                   archived run logs
//! ```
//!
//! # Atomicity
//!
//! Files that other processes read while the watcher runs are written to a
//! sibling `.tmp` file first and then renamed over the target, so a reader
//! sees either the old contents or the new ones. Run logs are append-only
//! and written line by line.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use cw_core::{Aggregate, AggregateStore, Direction, Identity, LogEvent};
use fs2::FileExt;
use serde::Serialize;
use thiserror::Error;

const STATS_FILE: &str = "stats.json";
const LOCK_FILE: &str = "stats.lock";
const LIVE_FILE: &str = "live.json";
const IGNORE_FILE: &str = "ignore.json";
const REPORT_FILE: &str = "report.txt";
const RESULT_TABLE_FILE: &str = "result_table.txt";
const LOGS_DIR: &str = "logs";
const ALLTIME_LOG: &str = "chatters_alltime.txt";
const RUN_LOG_PREFIX: &str = "chatters_log_";
const RUN_LOG_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file did not contain the expected JSON.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Another process holds the live-writer lock.
    #[error("another watcher already holds {}", path.display())]
    Locked { path: PathBuf },
}

impl StoreError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Resolved file locations inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory and its `logs/` subdirectory.
    pub fn ensure(&self) -> Result<(), StoreError> {
        let logs = self.logs_dir();
        fs::create_dir_all(&logs).map_err(|e| StoreError::io("failed to create", &logs, e))
    }

    pub fn stats(&self) -> PathBuf {
        self.root.join(STATS_FILE)
    }

    pub fn lock(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn live(&self) -> PathBuf {
        self.root.join(LIVE_FILE)
    }

    pub fn ignore(&self) -> PathBuf {
        self.root.join(IGNORE_FILE)
    }

    pub fn report(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn result_table(&self) -> PathBuf {
        self.root.join(RESULT_TABLE_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn alltime_log(&self) -> PathBuf {
        self.logs_dir().join(ALLTIME_LOG)
    }

    /// Path of the run log for a run started at `started` (local time).
    pub fn run_log(&self, started: NaiveDateTime) -> PathBuf {
        self.logs_dir().join(format!(
            "{RUN_LOG_PREFIX}{}.txt",
            started.format(RUN_LOG_TIME_FORMAT)
        ))
    }
}

/// Replaces `path` with `contents` via a temp file and rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io("failed to create", parent, e))?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).map_err(|e| StoreError::io("failed to write", &tmp_path, e))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io("failed to replace", path, e));
    }
    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push(b'\n');
    write_atomic(path, &json)
}

/// Reads a file, treating a missing file as `None`.
fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io("failed to read", path, e)),
    }
}

/// The aggregate as a JSON file.
#[derive(Debug, Clone)]
pub struct AggregateFile {
    path: PathBuf,
}

impl AggregateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves an unreadable aggregate to `<name>.bad` so the next save cannot
    /// overwrite it. Returns the new path, or `None` if the rename failed.
    fn set_aside(&self) -> Option<PathBuf> {
        let mut name = self.path.file_name()?.to_os_string();
        name.push(".bad");
        let aside = self.path.with_file_name(name);
        match fs::rename(&self.path, &aside) {
            Ok(()) => Some(aside),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to set malformed aggregate aside");
                None
            }
        }
    }
}

impl AggregateStore for AggregateFile {
    type Error = StoreError;

    /// Missing or malformed files load as an empty aggregate. A malformed
    /// file is first renamed to `stats.json.bad`.
    fn load(&self) -> Result<Aggregate, StoreError> {
        let Some(content) = read_optional(&self.path)? else {
            tracing::debug!(path = %self.path.display(), "no aggregate file; starting empty");
            return Ok(Aggregate::new());
        };
        if content.trim().is_empty() {
            return Ok(Aggregate::new());
        }
        match serde_json::from_str(&content) {
            Ok(aggregate) => Ok(aggregate),
            Err(e) => {
                let aside = self.set_aside();
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = ?aside,
                    error = %e,
                    "aggregate file is malformed; starting empty"
                );
                Ok(Aggregate::new())
            }
        }
    }

    fn save(&self, aggregate: &Aggregate) -> Result<(), StoreError> {
        write_json_atomic(&self.path, aggregate)
    }
}

/// Exclusive advisory lock held for as long as the value lives.
#[derive(Debug)]
pub struct LiveLock {
    _file: File,
    path: PathBuf,
}

impl LiveLock {
    /// Takes the lock without waiting.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io("failed to open", &path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                return Err(StoreError::Locked { path });
            }
            Err(e) => return Err(StoreError::io("failed to lock", &path, e)),
        }
        tracing::debug!(path = %path.display(), "acquired live-writer lock");
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Append-only sink for arrival and departure lines.
#[derive(Debug)]
pub struct EventLog {
    file: File,
    path: PathBuf,
}

impl EventLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io("failed to create", parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io("failed to open", &path, e))?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line stamped with `at` in local wall-clock time.
    pub fn record(
        &mut self,
        direction: Direction,
        identity: &Identity,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let event = LogEvent {
            timestamp: at.with_timezone(&Local).naive_local(),
            direction,
            identity: identity.clone(),
        };
        self.append(&event)
    }

    pub fn append(&mut self, event: &LogEvent) -> Result<(), StoreError> {
        writeln!(self.file, "{event}")
            .and_then(|()| self.file.flush())
            .map_err(|e| StoreError::io("failed to append to", &self.path, e))
    }
}

/// The user-maintained ignore list file.
#[derive(Debug, Clone)]
pub struct IgnoreFile {
    path: PathBuf,
}

impl IgnoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries as written; a missing file is an empty list.
    pub fn load(&self) -> Result<BTreeSet<String>, StoreError> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(BTreeSet::new());
        };
        if content.trim().is_empty() {
            return Ok(BTreeSet::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, names: &BTreeSet<String>) -> Result<(), StoreError> {
        write_json_atomic(&self.path, names)
    }

    /// Adds `name` unless an entry already matches it case-insensitively.
    pub fn add(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        let needle = name.to_lowercase();
        let mut names = self.load()?;
        if name.is_empty() || names.iter().any(|n| n.to_lowercase() == needle) {
            return Ok(false);
        }
        names.insert(name.to_string());
        self.save(&names)?;
        Ok(true)
    }

    /// Removes every entry matching `name` case-insensitively.
    pub fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let needle = name.trim().to_lowercase();
        let mut names = self.load()?;
        let before = names.len();
        names.retain(|n| n.to_lowercase() != needle);
        if names.len() == before {
            return Ok(false);
        }
        self.save(&names)?;
        Ok(true)
    }
}

/// Outcome of [`archive_run_logs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Run logs appended to the all-time log and removed.
    pub merged: Vec<PathBuf>,
    /// Empty run logs removed without merging.
    pub removed_empty: usize,
    /// Run logs left in place after an error.
    pub failed: usize,
}

/// Merges every run log into the all-time log, oldest first.
///
/// Each merged or empty run log is deleted. A file that cannot be read or
/// removed is logged and left in place; only failures on the all-time log
/// itself abort the archive.
pub fn archive_run_logs(data_dir: &DataDir) -> Result<ArchiveSummary, StoreError> {
    data_dir.ensure()?;
    let alltime_path = data_dir.alltime_log();

    let pending = run_logs(data_dir)?;
    let mut needs_separator = lacks_trailing_newline(&alltime_path)?;

    let mut alltime = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&alltime_path)
        .map_err(|e| StoreError::io("failed to open", &alltime_path, e))?;

    let mut summary = ArchiveSummary::default();
    for path in pending {
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable run log");
                summary.failed += 1;
                continue;
            }
        };

        let content = content.trim();
        if !content.is_empty() {
            if needs_separator {
                writeln!(alltime)
                    .map_err(|e| StoreError::io("failed to append to", &alltime_path, e))?;
                needs_separator = false;
            }
            writeln!(alltime, "{content}")
                .map_err(|e| StoreError::io("failed to append to", &alltime_path, e))?;
        }

        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove run log");
            summary.failed += 1;
            continue;
        }

        if content.is_empty() {
            summary.removed_empty += 1;
        } else {
            tracing::debug!(path = %path.display(), "archived run log");
            summary.merged.push(path);
        }
    }
    alltime
        .flush()
        .map_err(|e| StoreError::io("failed to flush", &alltime_path, e))?;

    Ok(summary)
}

/// True if `path` is non-empty and its last byte is not a newline.
fn lacks_trailing_newline(path: &Path) -> Result<bool, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(StoreError::io("failed to open", path, e)),
    };
    let len = file
        .metadata()
        .map_err(|e| StoreError::io("failed to read", path, e))?
        .len();
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| StoreError::io("failed to read", path, e))?;
    Ok(last[0] != b'\n')
}

/// Run logs waiting to be archived, oldest first.
///
/// A missing `logs/` directory has none.
pub fn run_logs(data_dir: &DataDir) -> Result<Vec<PathBuf>, StoreError> {
    let logs_dir = data_dir.logs_dir();
    let entries = match fs::read_dir(&logs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io("failed to list", &logs_dir, e)),
    };
    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_run_log(path))
        .collect();
    logs.sort();
    Ok(logs)
}

fn is_run_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.starts_with(RUN_LOG_PREFIX)
                && Path::new(name)
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use cw_core::{IgnoreList, Ledger, UserRecord, parse_log};
    use tempfile::TempDir;

    fn setup() -> (TempDir, DataDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = DataDir::new(temp_dir.path().join("chatwatch"));
        data_dir.ensure().unwrap();
        (temp_dir, data_dir)
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, h, m, 0).unwrap()
    }

    fn identity(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    #[test]
    fn missing_aggregate_loads_empty() {
        let (_tmp, data_dir) = setup();
        let store = AggregateFile::new(data_dir.stats());
        assert!(store.load().unwrap().is_empty());

        let aside = data_dir.root().join("stats.json.bad");
        assert_eq!(fs::read_to_string(aside).unwrap(), "{ not json");
        assert!(!data_dir.stats().exists());

        store.save(&Aggregate::new()).unwrap();
        assert!(data_dir.root().join("stats.json.bad").exists());
    }

    #[test]
    fn malformed_aggregate_loads_empty() {
        let (_tmp, data_dir) = setup();
        fs::write(data_dir.stats(), "{ not json").unwrap();
        let store = AggregateFile::new(data_dir.stats());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn aggregate_survives_save_and_load() {
        let (_tmp, data_dir) = setup();
        let store = AggregateFile::new(data_dir.stats());

        let mut aggregate = Aggregate::new();
        let mut record = UserRecord::first_visit(ts(12, 0));
        record.total_watch_time = Duration::seconds(930);
        record.entry_time = None;
        aggregate.insert(identity("alice"), record);
        store.save(&aggregate).unwrap();

        assert_eq!(store.load().unwrap(), aggregate);
        assert!(!data_dir.stats().with_extension("tmp").exists());

        let raw = fs::read_to_string(data_dir.stats()).unwrap();
        assert!(raw.contains(r#""total_watch_time": "00:15:30""#));
        assert!(!raw.contains("entry_time"));
    }

    #[test]
    fn unreadable_aggregate_is_an_error() {
        let (_tmp, data_dir) = setup();
        fs::create_dir_all(data_dir.stats()).unwrap();
        let store = AggregateFile::new(data_dir.stats());
        assert!(matches!(store.load(), Err(StoreError::Io { .. })));
    }

    #[test]
    fn ledger_resumes_from_file() {
        let (_tmp, data_dir) = setup();
        let store = AggregateFile::new(data_dir.stats());
        let mut ledger = Ledger::open(store.clone(), IgnoreList::with_defaults()).unwrap();
        ledger.arrive(&identity("alice"), ts(12, 0));
        drop(ledger);

        let mut ledger = Ledger::open(store.clone(), IgnoreList::with_defaults()).unwrap();
        assert_eq!(ledger.present().len(), 1);
        ledger.close_all(ts(12, 10));

        let alice = store.load().unwrap().get("alice").cloned().unwrap();
        assert_eq!(alice.total_watch_time, Duration::minutes(10));
        assert_eq!(alice.entry_time, None);
    }

    #[test]
    fn second_lock_is_refused() {
        let (_tmp, data_dir) = setup();
        let first = LiveLock::acquire(data_dir.lock()).unwrap();
        assert!(matches!(
            LiveLock::acquire(data_dir.lock()),
            Err(StoreError::Locked { .. })
        ));
        drop(first);
        assert!(LiveLock::acquire(data_dir.lock()).is_ok());
    }

    #[test]
    fn event_log_lines_parse_back() {
        let (_tmp, data_dir) = setup();
        let started = NaiveDate::from_ymd_opt(2025, 1, 29)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let path = data_dir.run_log(started);
        assert!(path.ends_with("logs/chatters_log_2025-01-29_12-00-00.txt"));

        let mut log = EventLog::open(&path).unwrap();
        log.record(Direction::Arrival, &identity("alice"), ts(12, 0)).unwrap();
        log.record(Direction::Departure, &identity("alice"), ts(12, 5)).unwrap();

        let events = parse_log(&fs::read_to_string(&path).unwrap());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].direction, Direction::Arrival);
        assert_eq!(events[1].timestamp - events[0].timestamp, Duration::minutes(5));
    }

    #[test]
    fn ignore_file_add_and_remove() {
        let (_tmp, data_dir) = setup();
        let file = IgnoreFile::new(data_dir.ignore());
        assert!(file.load().unwrap().is_empty());

        assert!(file.add("SomeBot").unwrap());
        assert!(!file.add("somebot").unwrap());
        assert!(!file.add("   ").unwrap());
        assert_eq!(file.load().unwrap().into_iter().collect::<Vec<_>>(), vec!["SomeBot"]);

        assert!(file.remove("SOMEBOT").unwrap());
        assert!(!file.remove("somebot").unwrap());
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_ignore_file_is_an_error() {
        let (_tmp, data_dir) = setup();
        fs::write(data_dir.ignore(), "{}").unwrap();
        assert!(matches!(
            IgnoreFile::new(data_dir.ignore()).load(),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn archive_merges_and_removes_run_logs() {
        let (_tmp, data_dir) = setup();
        let logs = data_dir.logs_dir();
        fs::write(
            logs.join("chatters_log_2025-01-29_10-00-00.txt"),
            "[2025-01-29 10:00:00] [JOIN] User 'alice' joined the chat\n",
        )
        .unwrap();
        fs::write(
            logs.join("chatters_log_2025-01-28_10-00-00.txt"),
            "[2025-01-28 10:00:00] [JOIN] User 'bob' joined the chat\n\n",
        )
        .unwrap();
        fs::write(logs.join("chatters_log_2025-01-30_10-00-00.txt"), "  \n").unwrap();
        fs::write(logs.join("notes.txt"), "keep me").unwrap();

        assert_eq!(run_logs(&data_dir).unwrap().len(), 3);
        let summary = archive_run_logs(&data_dir).unwrap();
        assert_eq!(summary.merged.len(), 2);
        assert_eq!(summary.removed_empty, 1);
        assert_eq!(summary.failed, 0);

        let alltime = fs::read_to_string(data_dir.alltime_log()).unwrap();
        assert_eq!(
            alltime,
            "[2025-01-28 10:00:00] [JOIN] User 'bob' joined the chat\n\
             [2025-01-29 10:00:00] [JOIN] User 'alice' joined the chat\n"
        );
        assert!(logs.join("notes.txt").exists());
        let remaining = fs::read_dir(&logs).unwrap().count();
        assert_eq!(remaining, 2);

        let again = archive_run_logs(&data_dir).unwrap();
        assert_eq!(again, ArchiveSummary::default());
    }

    #[test]
    fn archive_starts_on_a_new_line_after_legacy_log() {
        let (_tmp, data_dir) = setup();
        fs::write(
            data_dir.alltime_log(),
            "\n[2024-12-01 10:00:00] 🔴 [ВЫХОД] Пользователь 'alice' вышел из чата",
        )
        .unwrap();
        fs::write(
            data_dir.logs_dir().join("chatters_log_2025-01-29_12-00-00.txt"),
            "[2025-01-29 12:00:00] [JOIN] User 'bob' joined the chat\n",
        )
        .unwrap();

        archive_run_logs(&data_dir).unwrap();

        let alltime = fs::read_to_string(data_dir.alltime_log()).unwrap();
        let events = cw_core::parse_log(&alltime);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].identity.as_str(), "alice");
        assert_eq!(events[1].identity.as_str(), "bob");
        assert_eq!(events[1].timestamp.to_string(), "2025-01-29 12:00:00");
        assert!(alltime.ends_with("joined the chat\n"));
    }

    #[test]
    fn archive_into_empty_alltime_log_adds_no_blank_line() {
        let (_tmp, data_dir) = setup();
        fs::write(data_dir.alltime_log(), "").unwrap();
        fs::write(
            data_dir.logs_dir().join("chatters_log_2025-01-29_12-00-00.txt"),
            "[2025-01-29 12:00:00] [JOIN] User 'bob' joined the chat",
        )
        .unwrap();

        archive_run_logs(&data_dir).unwrap();
        assert_eq!(
            fs::read_to_string(data_dir.alltime_log()).unwrap(),
            "[2025-01-29 12:00:00] [JOIN] User 'bob' joined the chat\n"
        );
    }

    #[test]
    fn atomic_write_creates_parent() {
        let (_tmp, data_dir) = setup();
        let path = data_dir.root().join("nested/live.json");
        write_json_atomic(&path, &["a", "b"]).unwrap();
        let back: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec!["a", "b"]);
    }
}
