//! Ranked and tabular views derived from the aggregate.

use std::cmp::Reverse;

use chrono::{Duration, TimeZone};
use serde::Serialize;

use crate::duration::format_hms;
use crate::ignore::IgnoreList;
use crate::record::Aggregate;
use crate::types::Identity;

/// Timestamp layout used in every textual report.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column headers for [`recency_rows`].
pub const RECENCY_HEADERS: [&str; 5] = ["Nick", "Visits", "First seen", "Last seen", "Watch time"];

/// One line of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub identity: Identity,
    #[serde(with = "crate::duration::serde_hms")]
    pub total_watch_time: Duration,
    pub visits: u32,
}

/// The `n` identities with the most watch time.
///
/// Ties fall back to visits (descending), then identity (ascending).
pub fn top_n(aggregate: &Aggregate, ignore: &IgnoreList, n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = aggregate
        .iter()
        .filter(|(identity, _)| !ignore.is_ignored(identity.as_str()))
        .map(|(identity, record)| RankedEntry {
            identity: identity.clone(),
            total_watch_time: record.total_watch_time,
            visits: record.visits,
        })
        .collect();

    entries.sort_by(|a, b| {
        (Reverse(a.total_watch_time), Reverse(a.visits), &a.identity).cmp(&(
            Reverse(b.total_watch_time),
            Reverse(b.visits),
            &b.identity,
        ))
    });
    entries.truncate(n);
    entries
}

/// Every non-ignored record as report cells, most recently seen first.
///
/// Ties on `last_seen` are ordered by identity. Timestamps are rendered in
/// `tz`.
pub fn recency_rows<Tz>(aggregate: &Aggregate, ignore: &IgnoreList, tz: &Tz) -> Vec<Vec<String>>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut records: Vec<_> = aggregate
        .iter()
        .filter(|(identity, _)| !ignore.is_ignored(identity.as_str()))
        .collect();
    records.sort_by(|(a_id, a), (b_id, b)| b.last_seen.cmp(&a.last_seen).then_with(|| a_id.cmp(b_id)));

    records
        .into_iter()
        .map(|(identity, record)| {
            vec![
                identity.to_string(),
                record.visits.to_string(),
                record
                    .first_seen
                    .with_timezone(tz)
                    .format(REPORT_TIME_FORMAT)
                    .to_string(),
                record
                    .last_seen
                    .with_timezone(tz)
                    .format(REPORT_TIME_FORMAT)
                    .to_string(),
                format_hms(record.total_watch_time),
            ]
        })
        .collect()
}
