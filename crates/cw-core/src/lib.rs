//! Core domain logic for chatwatch.
//!
//! This crate contains the types and logic for:
//! - Presence: snapshots of who is in the chat and the diff between them
//! - Ledger: open sessions, visits and accumulated watch time
//! - Reconstruction: rebuilding statistics from the event log
//! - Views: leaderboards, recency reports and the live snapshot

pub mod duration;
pub mod ignore;
pub mod ledger;
pub mod presence;
pub mod ranking;
pub mod reconstruct;
pub mod record;
pub mod store;
mod table;
pub mod types;
pub mod view;

pub use duration::{format_hms, parse_hms};
pub use ignore::{DEFAULT_IGNORED, IgnoreList};
pub use ledger::{ClosedSession, CycleReport, Ledger};
pub use presence::{FetchError, PresenceDiff, PresenceSnapshot, PresenceSource, diff};
pub use ranking::{RECENCY_HEADERS, REPORT_TIME_FORMAT, RankedEntry, recency_rows, top_n};
pub use reconstruct::{
    Direction, LogEvent, RECONSTRUCTION_HEADERS, ReconstructOptions, ReconstructedRow,
    ReplaySummary, SessionSpan, local_to_utc, parse_line, parse_log, reconstruct, replay,
    rows_to_cells,
};
pub use record::{Aggregate, UserRecord};
pub use store::{AggregateStore, MemoryStore, MemoryStoreError};
pub use table::{NO_DATA, render_table};
pub use types::{Identity, ValidationError};
pub use view::{TopViewer, ViewerSnapshot};
