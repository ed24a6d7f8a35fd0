//! Durable per-user statistics and the aggregate that holds them.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::duration;
use crate::types::Identity;

/// Cumulative statistics for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Number of arrivals, never per-poll sightings. Always at least 1.
    #[serde(deserialize_with = "at_least_one")]
    pub visits: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Sum of all closed session spans.
    #[serde(with = "duration::serde_hms", default = "duration::zero")]
    pub total_watch_time: Duration,
    /// Start of the currently open session, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<DateTime<Utc>>,
}

fn at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(u32::deserialize(deserializer)?.max(1))
}

impl UserRecord {
    /// A record for a first arrival at `at`.
    pub const fn first_visit(at: DateTime<Utc>) -> Self {
        Self {
            visits: 1,
            first_seen: at,
            last_seen: at,
            total_watch_time: Duration::zero(),
            entry_time: Some(at),
        }
    }

    /// Moves `last_seen` forward, keeping `first_seen <= last_seen`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_seen = at;
        if self.first_seen > at {
            self.first_seen = at;
        }
    }

    pub const fn is_open(&self) -> bool {
        self.entry_time.is_some()
    }
}

/// Every identity's record, keyed by the exact stored identity string.
///
/// Serializes as a JSON object with sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregate {
    records: BTreeMap<Identity, UserRecord>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&UserRecord> {
        self.records.get(identity)
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut UserRecord> {
        self.records.get_mut(identity)
    }

    pub fn insert(&mut self, identity: Identity, record: UserRecord) -> Option<UserRecord> {
        self.records.insert(identity, record)
    }

    pub fn entry(&mut self, identity: Identity) -> btree_map::Entry<'_, Identity, UserRecord> {
        self.records.entry(identity)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Identity, UserRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, Identity, UserRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose `entry_time` says a session was open when last written.
    pub fn open_entries(&self) -> impl Iterator<Item = (&Identity, DateTime<Utc>)> {
        self.records
            .iter()
            .filter_map(|(id, record)| record.entry_time.map(|t| (id, t)))
    }

    /// Sum of every record's watch time.
    pub fn total_watch_time(&self) -> Duration {
        self.records
            .values()
            .fold(Duration::zero(), |acc, r| acc + r.total_watch_time)
    }
}

impl<'a> IntoIterator for &'a Aggregate {
    type Item = (&'a Identity, &'a UserRecord);
    type IntoIter = btree_map::Iter<'a, Identity, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<(Identity, UserRecord)> for Aggregate {
    fn from_iter<T: IntoIterator<Item = (Identity, UserRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
