//! The live viewer snapshot published after every poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::format_hms;
use crate::ignore::IgnoreList;
use crate::ranking::top_n;
use crate::record::Aggregate;
use crate::types::Identity;

/// A leaderboard line in display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopViewer {
    pub name: String,
    /// `HH:MM:SS`.
    pub time: String,
    pub visits: u32,
}

/// Everything an external display needs, regenerated as a whole each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub viewer_count: usize,
    /// Present, non-ignored identities in sorted order.
    pub chatters: Vec<String>,
    pub top_viewers: Vec<TopViewer>,
    pub updated_at: DateTime<Utc>,
}

impl ViewerSnapshot {
    pub fn build<'a, I>(
        present: I,
        aggregate: &Aggregate,
        ignore: &IgnoreList,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Identity>,
    {
        let mut chatters: Vec<String> = present
            .into_iter()
            .filter(|id| !ignore.is_ignored(id.as_str()))
            .map(ToString::to_string)
            .collect();
        chatters.sort();
        chatters.dedup();

        let top_viewers = top_n(aggregate, ignore, limit)
            .into_iter()
            .map(|entry| TopViewer {
                name: entry.identity.into(),
                time: format_hms(entry.total_watch_time),
                visits: entry.visits,
            })
            .collect();

        Self {
            viewer_count: chatters.len(),
            chatters,
            top_viewers,
            updated_at: now,
        }
    }
}
