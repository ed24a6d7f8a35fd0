//! Rebuilding statistics from the human-readable event log.
//!
//! Log lines look like
//!
//! ```text
//! [2025-01-29 12:00:00] [JOIN] User 'alice' joined the chat
//! [2025-01-29 12:05:30] [LEAVE] User 'alice' left the chat
//! ```
//!
//! Only the bracketed timestamp, the direction tag, and the first quoted
//! name matter; everything else on the line is free text. The older tags
//! `[ВХОД]` and `[ВЫХОД]` are accepted too. Timestamps are local wall-clock
//! time.
//!
//! Two consumers:
//! - [`reconstruct`] builds the per-identity table. Its duration column is
//!   `departure - last arrival`, so only the final session's span is shown
//!   when an identity came and went several times. [`replay`] gives exact
//!   per-session sums.
//! - [`replay`] feeds the events through a [`Ledger`] to produce the same
//!   aggregate live accounting would have produced.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::duration::format_hms;
use crate::ignore::IgnoreList;
use crate::ledger::Ledger;
use crate::ranking::REPORT_TIME_FORMAT;
use crate::store::AggregateStore;
use crate::types::Identity;

static ARRIVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\[(?P<ts>[0-9]{4}-[0-9]{2}-[0-9]{2}\s+[0-9]{2}:[0-9]{2}:[0-9]{2})\].*?\[(?:JOIN|ВХОД)\].*?['"](?P<user>[^'"]+)['"]"#,
    )
    .unwrap()
});

static DEPARTURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\[(?P<ts>[0-9]{4}-[0-9]{2}-[0-9]{2}\s+[0-9]{2}:[0-9]{2}:[0-9]{2})\].*?\[(?:LEAVE|ВЫХОД)\].*?['"](?P<user>[^'"]+)['"]"#,
    )
    .unwrap()
});

/// Column headers for [`rows_to_cells`].
pub const RECONSTRUCTION_HEADERS: [&str; 5] = ["Nick", "Days", "First seen", "Last seen", "Duration"];

/// Arrival or departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    Arrival,
    Departure,
}

impl Direction {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Arrival => "JOIN",
            Self::Departure => "LEAVE",
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Arrival => "joined",
            Self::Departure => "left",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Arrival => &ARRIVAL_RE,
            Self::Departure => &DEPARTURE_RE,
        }
    }
}

/// One arrival or departure read from a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    pub identity: Identity,
}

impl LogEvent {
    /// Renders the event as a log line (without trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] User '{}' {} the chat",
            self.timestamp.format(REPORT_TIME_FORMAT),
            self.direction.tag(),
            self.identity,
            self.direction.verb()
        )
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Extracts the arrival and/or departure a line carries.
///
/// A line matching neither pattern yields nothing.
pub fn parse_line(line: &str) -> impl Iterator<Item = LogEvent> + '_ {
    [Direction::Arrival, Direction::Departure]
        .into_iter()
        .filter_map(move |direction| match_direction(line, direction))
}

fn match_direction(line: &str, direction: Direction) -> Option<LogEvent> {
    let caps = direction.pattern().captures(line)?;
    let raw_ts = caps.name("ts")?.as_str();
    let normalized = raw_ts.split_whitespace().collect::<Vec<_>>().join(" ");
    let timestamp = match NaiveDateTime::parse_from_str(&normalized, REPORT_TIME_FORMAT) {
        Ok(ts) => ts,
        Err(e) => {
            tracing::trace!(line, error = %e, "skipping log line with invalid timestamp");
            return None;
        }
    };
    let identity = Identity::new(caps.name("user")?.as_str()).ok()?;
    Some(LogEvent {
        timestamp,
        direction,
        identity,
    })
}

/// Every event in `text`, in line order.
pub fn parse_log(text: &str) -> Vec<LogEvent> {
    text.lines().flat_map(parse_line).collect()
}

/// How the reconstructed duration column is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSpan {
    /// `departure - last arrival`.
    Elapsed(Duration),
    /// Arrived and never departed (and no force-close was requested).
    NeverLeft,
    /// The recorded departure precedes the last arrival.
    TimeError,
}

impl fmt::Display for SessionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elapsed(d) => f.write_str(&format_hms(*d)),
            Self::NeverLeft => f.write_str("never left"),
            Self::TimeError => f.write_str("time error"),
        }
    }
}

/// Options for a reconstruction run.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// The log ends mid-run: give every unclosed identity a departure at `now`.
    pub force_close: bool,
    pub now: NaiveDateTime,
    pub ignore: IgnoreList,
}

/// One identity's reconstructed statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedRow {
    pub identity: Identity,
    /// Distinct calendar days with at least one arrival.
    pub distinct_session_days: usize,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub span: SessionSpan,
}

#[derive(Debug, Default)]
struct Accumulator {
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
    days: BTreeSet<NaiveDate>,
}

/// Builds per-identity rows from raw events.
///
/// Rows are sorted by `last_seen` descending, then identity ascending.
/// Identities that only ever departed produce no row.
pub fn reconstruct(events: &[LogEvent], options: &ReconstructOptions) -> Vec<ReconstructedRow> {
    let mut arrivals: BTreeMap<&Identity, Accumulator> = BTreeMap::new();
    let mut departures: BTreeMap<&Identity, NaiveDateTime> = BTreeMap::new();

    for event in events {
        if options.ignore.is_ignored(event.identity.as_str()) {
            continue;
        }
        match event.direction {
            Direction::Arrival => {
                let acc = arrivals.entry(&event.identity).or_default();
                acc.first = Some(acc.first.map_or(event.timestamp, |t| t.min(event.timestamp)));
                acc.last = Some(acc.last.map_or(event.timestamp, |t| t.max(event.timestamp)));
                acc.days.insert(event.timestamp.date());
            }
            Direction::Departure => {
                departures.insert(&event.identity, event.timestamp);
            }
        }
    }

    let mut rows: Vec<ReconstructedRow> = arrivals
        .into_iter()
        .filter_map(|(identity, acc)| {
            let (first_seen, last_seen) = (acc.first?, acc.last?);
            let departure = departures
                .get(identity)
                .copied()
                .or_else(|| options.force_close.then_some(options.now));
            let span = match departure {
                None => SessionSpan::NeverLeft,
                Some(departed) if departed < last_seen => SessionSpan::TimeError,
                Some(departed) => SessionSpan::Elapsed(departed - last_seen),
            };
            Some(ReconstructedRow {
                identity: identity.clone(),
                distinct_session_days: acc.days.len(),
                first_seen,
                last_seen,
                span,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.last_seen
            .cmp(&a.last_seen)
            .then_with(|| a.identity.cmp(&b.identity))
    });
    rows
}

/// Rows as table cells matching [`RECONSTRUCTION_HEADERS`].
pub fn rows_to_cells(rows: &[ReconstructedRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.identity.to_string(),
                row.distinct_session_days.to_string(),
                row.first_seen.format(REPORT_TIME_FORMAT).to_string(),
                row.last_seen.format(REPORT_TIME_FORMAT).to_string(),
                row.span.to_string(),
            ]
        })
        .collect()
}

/// Interprets a local wall-clock time as UTC.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times in a
/// spring-forward gap are read as if they were UTC.
pub fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Outcome of a [`replay`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub arrivals: usize,
    pub departures: usize,
    /// Arrivals for an identity already present, or departures for one absent.
    pub skipped: usize,
    /// Sessions closed by the final force-close.
    pub force_closed: usize,
}

/// Feeds log events through `ledger` in timestamp order.
///
/// The sort is stable, so events sharing a timestamp keep their log order.
/// With `force_close_at`, sessions still open at the end are closed there.
pub fn replay<S: AggregateStore>(
    ledger: &mut Ledger<S>,
    mut events: Vec<LogEvent>,
    force_close_at: Option<DateTime<Utc>>,
) -> ReplaySummary {
    events.sort_by_key(|e| e.timestamp);

    let mut summary = ReplaySummary::default();
    for event in &events {
        let at = local_to_utc(event.timestamp);
        let applied = match event.direction {
            Direction::Arrival => ledger.arrive(&event.identity, at),
            Direction::Departure => ledger.depart(&event.identity, at).is_some(),
        };
        match (applied, event.direction) {
            (true, Direction::Arrival) => summary.arrivals += 1,
            (true, Direction::Departure) => summary.departures += 1,
            (false, _) => summary.skipped += 1,
        }
    }

    if let Some(now) = force_close_at {
        summary.force_closed = ledger.close_all(now).len();
    }
    summary
}
