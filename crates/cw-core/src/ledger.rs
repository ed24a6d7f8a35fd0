//! Session ledger: open-session clocks merged into durable records.
//!
//! Each identity is either **absent** (no open session) or **present** (an
//! open session with a start time). Transitions:
//!
//! - arrival: absent → present; opens a session and counts a visit
//! - departure: present → absent; credits the elapsed time
//! - liveness refresh: present → present; moves `last_seen`
//! - close-all: every present identity departs at the same instant
//!
//! The in-memory aggregate is authoritative. Every mutation writes the whole
//! aggregate through the [`AggregateStore`]; a failed write marks the ledger
//! dirty and the next mutation or [`Ledger::flush`] retries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};

use crate::ignore::IgnoreList;
use crate::presence::{self, PresenceSnapshot};
use crate::record::{Aggregate, UserRecord};
use crate::store::AggregateStore;
use crate::types::Identity;

/// A session that has just been closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub identity: Identity,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Time added to the record; zero on a clock anomaly.
    pub credited: Duration,
    /// The end preceded (or equalled) the start.
    pub clock_anomaly: bool,
}

/// What one snapshot did to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub arrivals: Vec<Identity>,
    pub departures: Vec<ClosedSession>,
    /// Present identities that had no record and got one.
    pub backfilled: usize,
    /// Identities in the snapshot dropped by the ignore filter.
    pub ignored: usize,
    /// Present identities after the cycle.
    pub present: usize,
}

impl CycleReport {
    pub fn has_changes(&self) -> bool {
        !self.arrivals.is_empty() || !self.departures.is_empty()
    }
}

/// Live accounting state over an [`AggregateStore`].
#[derive(Debug)]
pub struct Ledger<S: AggregateStore> {
    store: S,
    ignore: IgnoreList,
    aggregate: Aggregate,
    open: BTreeMap<Identity, DateTime<Utc>>,
    dirty: bool,
    clock_anomalies: u64,
}

impl<S: AggregateStore> Ledger<S> {
    /// Loads the aggregate from `store` and resumes any sessions left open.
    pub fn open(store: S, ignore: IgnoreList) -> Result<Self, S::Error> {
        let aggregate = store.load()?;
        Ok(Self::from_aggregate(store, aggregate, ignore))
    }

    /// Builds a ledger over an already-loaded aggregate.
    ///
    /// Records with an `entry_time` become open sessions starting at that
    /// time. Ignored identities are not resumed and their stale
    /// `entry_time` is cleared.
    pub fn from_aggregate(store: S, mut aggregate: Aggregate, ignore: IgnoreList) -> Self {
        let mut open = BTreeMap::new();
        let mut dirty = false;
        for (identity, record) in aggregate.iter_mut() {
            let Some(entry_time) = record.entry_time else {
                continue;
            };
            if ignore.is_ignored(identity.as_str()) {
                tracing::debug!(%identity, "dropping open session of ignored identity");
                record.entry_time = None;
                dirty = true;
                continue;
            }
            open.insert(identity.clone(), entry_time);
        }
        if !open.is_empty() {
            tracing::info!(count = open.len(), "resuming open sessions from stored state");
        }

        Self {
            store,
            ignore,
            aggregate,
            open,
            dirty,
            clock_anomalies: 0,
        }
    }

    /// Records an arrival.
    ///
    /// Returns `false` without changes if the identity is ignored or
    /// already has an open session.
    pub fn arrive(&mut self, identity: &Identity, now: DateTime<Utc>) -> bool {
        if self.ignore.is_ignored(identity.as_str()) || self.open.contains_key(identity) {
            return false;
        }

        self.open.insert(identity.clone(), now);
        match self.aggregate.get_mut(identity.as_str()) {
            Some(record) => {
                record.visits = record.visits.saturating_add(1);
                record.touch(now);
                record.entry_time = Some(now);
            }
            None => {
                self.aggregate
                    .insert(identity.clone(), UserRecord::first_visit(now));
            }
        }
        tracing::debug!(%identity, "arrival");
        self.persist();
        true
    }

    /// Records a departure, crediting `now - start` when positive.
    ///
    /// Returns `None` if the identity had no open session.
    pub fn depart(&mut self, identity: &Identity, now: DateTime<Utc>) -> Option<ClosedSession> {
        let started_at = self.open.remove(identity)?;
        let elapsed = now - started_at;
        let clock_anomaly = elapsed <= Duration::zero();
        let credited = if clock_anomaly {
            self.clock_anomalies += 1;
            tracing::warn!(
                %identity,
                started_at = %started_at,
                ended_at = %now,
                "session ended before it started; crediting no time"
            );
            Duration::zero()
        } else {
            elapsed
        };

        let record = self
            .aggregate
            .entry(identity.clone())
            .or_insert_with(|| UserRecord::first_visit(started_at));
        record.total_watch_time += credited;
        record.touch(now);
        record.entry_time = None;

        tracing::debug!(%identity, credited_secs = credited.num_seconds(), "departure");
        self.persist();

        Some(ClosedSession {
            identity: identity.clone(),
            started_at,
            ended_at: now,
            credited,
            clock_anomaly,
        })
    }

    /// Sets `last_seen = now` for every present identity.
    ///
    /// A present identity without a record gets one with `visits = 1`.
    /// Returns how many records were backfilled.
    pub fn refresh(&mut self, present: &BTreeSet<Identity>, now: DateTime<Utc>) -> usize {
        let mut backfilled = 0;
        for identity in present {
            if self.ignore.is_ignored(identity.as_str()) {
                continue;
            }
            let entry_time = self.open.get(identity).copied();
            match self.aggregate.get_mut(identity.as_str()) {
                Some(record) => record.touch(now),
                None => {
                    let mut record = UserRecord::first_visit(now);
                    record.entry_time = entry_time;
                    self.aggregate.insert(identity.clone(), record);
                    backfilled += 1;
                    tracing::debug!(%identity, "backfilled missing record");
                }
            }
        }
        if !present.is_empty() {
            self.persist();
        }
        backfilled
    }

    /// Applies one presence snapshot taken at `now`.
    ///
    /// The snapshot is diffed against the set of open sessions, so after
    /// this call the open sessions equal the snapshot minus ignored
    /// identities.
    pub fn apply_snapshot(&mut self, snapshot: &PresenceSnapshot, now: DateTime<Utc>) -> CycleReport {
        let (current, ignored): (BTreeSet<Identity>, BTreeSet<Identity>) = snapshot
            .iter()
            .cloned()
            .partition(|id| !self.ignore.is_ignored(id.as_str()));

        let changes = presence::diff(&self.present(), &current);

        let departures = changes
            .departures
            .iter()
            .filter_map(|identity| self.depart(identity, now))
            .collect();
        let arrivals = changes
            .arrivals
            .into_iter()
            .filter(|identity| self.arrive(identity, now))
            .collect();
        let backfilled = self.refresh(&current, now);

        CycleReport {
            arrivals,
            departures,
            backfilled,
            ignored: ignored.len(),
            present: self.open.len(),
        }
    }

    /// Closes every open session at `now`.
    pub fn close_all(&mut self, now: DateTime<Utc>) -> Vec<ClosedSession> {
        let identities: Vec<Identity> = self.open.keys().cloned().collect();
        let closed: Vec<ClosedSession> = identities
            .iter()
            .filter_map(|identity| self.depart(identity, now))
            .collect();
        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "closed all open sessions");
        }
        closed
    }

    /// Retries a previously failed write. Returns `true` when nothing is pending.
    pub fn flush(&mut self) -> bool {
        if self.dirty {
            self.persist();
        }
        !self.dirty
    }

    fn persist(&mut self) {
        match self.store.save(&self.aggregate) {
            Ok(()) => {
                if self.dirty {
                    tracing::info!("aggregate write recovered");
                }
                self.dirty = false;
            }
            Err(e) => {
                self.dirty = true;
                tracing::warn!(error = %e, "failed to persist aggregate; keeping in-memory state");
            }
        }
    }

    /// Identities with an open session.
    pub fn present(&self) -> BTreeSet<Identity> {
        self.open.keys().cloned().collect()
    }

    pub fn open_sessions(&self) -> impl Iterator<Item = (&Identity, DateTime<Utc>)> {
        self.open.iter().map(|(id, start)| (id, *start))
    }

    pub const fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub const fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Sessions closed with a non-positive span so far.
    pub const fn clock_anomalies(&self) -> u64 {
        self.clock_anomalies
    }

    /// A write failed and has not yet been retried successfully.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn into_aggregate(self) -> Aggregate {
        self.aggregate
    }
}
