//! Presence snapshots, the snapshot differ, and the presence source seam.

use std::collections::BTreeSet;
use std::future::Future;

use thiserror::Error;

use crate::types::Identity;

/// The identities reported present at one poll instant.
pub type PresenceSnapshot = BTreeSet<Identity>;

/// Result of comparing two consecutive snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceDiff {
    /// Present now, absent before.
    pub arrivals: BTreeSet<Identity>,
    /// Present before, absent now.
    pub departures: BTreeSet<Identity>,
}

impl PresenceDiff {
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty() && self.departures.is_empty()
    }
}

/// Computes arrivals (`current - previous`) and departures (`previous - current`).
///
/// An empty `previous` (cold start) makes every current identity an arrival.
pub fn diff(previous: &BTreeSet<Identity>, current: &BTreeSet<Identity>) -> PresenceDiff {
    PresenceDiff {
        arrivals: current.difference(previous).cloned().collect(),
        departures: previous.difference(current).cloned().collect(),
    }
}

/// Why a presence fetch produced no snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The credentials were rejected; polling again will not help.
    #[error("presence source rejected the access token")]
    Unauthorized,
    /// Network trouble, timeouts, rate limiting, unexpected responses.
    #[error("presence fetch failed: {0}")]
    Transient(String),
}

/// Something that can report who is currently present.
///
/// A failed fetch carries no partial data.
pub trait PresenceSource {
    fn fetch(&self) -> impl Future<Output = Result<PresenceSnapshot, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<Identity> {
        names.iter().map(|n| Identity::new(*n).unwrap()).collect()
    }

    #[test]
    fn cold_start_everyone_arrives() {
        let result = diff(&BTreeSet::new(), &set(&["alice", "bob"]));
        assert_eq!(result.arrivals, set(&["alice", "bob"]));
        assert!(result.departures.is_empty());
    }

    #[test]
    fn arrivals_and_departures() {
        let result = diff(&set(&["alice", "bob"]), &set(&["bob", "carol"]));
        assert_eq!(result.arrivals, set(&["carol"]));
        assert_eq!(result.departures, set(&["alice"]));
    }

    #[test]
    fn unchanged_snapshot_is_empty_diff() {
        let snapshot = set(&["alice", "bob"]);
        assert!(diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn everyone_leaves() {
        let result = diff(&set(&["alice"]), &BTreeSet::new());
        assert!(result.arrivals.is_empty());
        assert_eq!(result.departures, set(&["alice"]));
    }

    #[test]
    fn diff_is_case_sensitive() {
        let result = diff(&set(&["Alice"]), &set(&["alice"]));
        assert_eq!(result.arrivals, set(&["alice"]));
        assert_eq!(result.departures, set(&["Alice"]));
    }
}
