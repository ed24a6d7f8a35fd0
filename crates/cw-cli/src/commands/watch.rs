//! The live polling loop.
//!
//! Each cycle fetches a presence snapshot, applies it to the ledger, appends
//! arrivals and departures to the run log, and regenerates `live.json`.
//! Stopping (Ctrl-C, or a rejected token) closes every open session before
//! the loop returns.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, Utc};
use cw_core::{
    AggregateStore, ClosedSession, CycleReport, Direction, FetchError, Identity, Ledger,
    PresenceSource, ViewerSnapshot,
};
use cw_helix::HelixPresence;
use cw_store::{AggregateFile, EventLog, LiveLock, write_json_atomic};
use tokio::sync::watch;

use super::report::{render_report, save_report};
use super::util::{helix_client, helix_error};
use crate::Config;

/// Loop timing and view settings.
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub retry_delay: Duration,
    pub fetch_timeout: Duration,
    pub top_n: usize,
}

impl WatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            retry_delay: Duration::from_secs(config.retry_delay_secs.max(1)),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs.max(1)),
            top_n: config.top_n,
        }
    }
}

/// Why [`Monitor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    Unauthorized,
}

/// Totals over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub failed_fetches: u64,
    pub arrivals: u64,
    pub departures: u64,
}

/// Drives a ledger from a presence source.
pub struct Monitor<P, S: AggregateStore> {
    source: P,
    ledger: Ledger<S>,
    event_log: EventLog,
    live_path: PathBuf,
    settings: WatchSettings,
    stats: RunStats,
}

impl<P, S> Monitor<P, S>
where
    P: PresenceSource,
    S: AggregateStore,
{
    pub fn new(
        source: P,
        ledger: Ledger<S>,
        event_log: EventLog,
        live_path: PathBuf,
        settings: WatchSettings,
    ) -> Self {
        Self {
            source,
            ledger,
            event_log,
            live_path,
            settings,
            stats: RunStats::default(),
        }
    }

    /// Polls until `stop` turns true or the token is rejected.
    ///
    /// The stop flag is only checked between cycles; a cycle in progress
    /// always completes. Open sessions are closed before returning.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> StopReason {
        let reason = loop {
            if *stop.borrow() {
                break StopReason::Requested;
            }

            let delay = match self.poll_once().await {
                Ok(_) => self.settings.poll_interval,
                Err(FetchError::Unauthorized) => {
                    tracing::error!("access token rejected; stopping");
                    break StopReason::Unauthorized;
                }
                Err(FetchError::Transient(message)) => {
                    self.stats.failed_fetches += 1;
                    tracing::warn!(
                        error = %message,
                        retry_in_secs = self.settings.retry_delay.as_secs(),
                        "presence fetch failed; skipping cycle"
                    );
                    self.settings.retry_delay
                }
            };

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break StopReason::Requested;
                    }
                }
            }
        };

        let closed = self.shutdown(Utc::now());
        tracing::info!(closed = closed.len(), ?reason, "watch loop stopped");
        reason
    }

    /// Runs one fetch-and-apply cycle. A failed fetch changes nothing.
    pub async fn poll_once(&mut self) -> Result<CycleReport, FetchError> {
        let snapshot = match tokio::time::timeout(self.settings.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Transient(format!(
                    "fetch timed out after {}s",
                    self.settings.fetch_timeout.as_secs()
                )));
            }
        };

        let now = Utc::now();
        let report = self.ledger.apply_snapshot(&snapshot, now);
        self.stats.cycles += 1;

        for identity in &report.arrivals {
            self.append(Direction::Arrival, identity, now);
        }
        self.log_departures(&report.departures);
        self.ledger.flush();
        self.publish(now);

        if report.has_changes() {
            tracing::info!(
                arrivals = report.arrivals.len(),
                departures = report.departures.len(),
                present = report.present,
                "presence changed"
            );
        } else {
            tracing::debug!(present = report.present, ignored = report.ignored, "no presence changes");
        }
        Ok(report)
    }

    /// Closes every open session at `now` and writes the final view.
    pub fn shutdown(&mut self, now: DateTime<Utc>) -> Vec<ClosedSession> {
        let closed = self.ledger.close_all(now);
        self.log_departures(&closed);
        if !self.ledger.flush() {
            tracing::error!("final aggregate write failed; totals since the last successful write are lost");
        }
        self.publish(now);
        closed
    }

    pub const fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    fn log_departures(&mut self, sessions: &[ClosedSession]) {
        for session in sessions {
            self.append(Direction::Departure, &session.identity, session.ended_at);
        }
    }

    fn append(&mut self, direction: Direction, identity: &Identity, at: DateTime<Utc>) {
        match direction {
            Direction::Arrival => self.stats.arrivals += 1,
            Direction::Departure => self.stats.departures += 1,
        }
        if let Err(e) = self.event_log.record(direction, identity, at) {
            tracing::warn!(error = %e, %identity, "failed to append to run log");
        }
    }

    fn publish(&self, now: DateTime<Utc>) {
        let view = ViewerSnapshot::build(
            &self.ledger.present(),
            self.ledger.aggregate(),
            self.ledger.ignore_list(),
            self.settings.top_n,
            now,
        );
        if let Err(e) = write_json_atomic(&self.live_path, &view) {
            tracing::warn!(error = %e, "failed to write live view");
        }
    }
}

pub fn run<W: Write>(writer: &mut W, config: &Config, channel: Option<&str>) -> Result<()> {
    let client = helix_client(config)?;
    let channel = channel
        .or(config.channel.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let broadcaster_id = config
        .broadcaster_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty() && channel.is_none_or(|c| Some(c) == config.channel.as_deref()));
    if channel.is_none() && broadcaster_id.is_none() {
        bail!("no channel configured (pass --channel, or set CW_CHANNEL or channel in config.toml)");
    }

    let data = config.data();
    data.ensure()
        .with_context(|| format!("failed to create {}", data.root().display()))?;
    let _lock = LiveLock::acquire(data.lock()).context("failed to start watcher")?;
    let ignore = config.ignore_list()?;
    let settings = WatchSettings::from_config(config);

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let (reason, stats, aggregate, log_path) = runtime.block_on(async {
        let broadcaster_id = match broadcaster_id {
            Some(id) => id.to_string(),
            None => {
                let login = channel.unwrap_or_default();
                let id = client
                    .user_id(login)
                    .await
                    .map_err(|e| helix_error(e, "failed to look up channel"))?;
                tracing::info!(channel = login, broadcaster_id = %id, "resolved channel");
                id
            }
        };

        let store = AggregateFile::new(data.stats());
        let ledger = Ledger::open(store, ignore.clone())
            .with_context(|| format!("failed to load {}", data.stats().display()))?;
        let log_path = data.run_log(Local::now().naive_local());
        let event_log = EventLog::open(&log_path).context("failed to open run log")?;
        tracing::info!(log = %log_path.display(), "writing run log");

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; stopping after the current cycle");
                let _ = stop_tx.send(true);
            }
        });

        let source = HelixPresence::new(client, broadcaster_id);
        let mut monitor = Monitor::new(source, ledger, event_log, data.live(), settings);
        let reason = monitor.run(stop_rx).await;
        let stats = monitor.stats().clone();
        let aggregate = monitor.ledger().aggregate().clone();
        anyhow::Ok((reason, stats, aggregate, log_path))
    })?;

    let table = render_report(&aggregate, &ignore, &Local);
    let report_path = save_report(&data, &table)?;

    writeln!(
        writer,
        "Stopped after {} cycle(s): {} arrival(s), {} departure(s), {} failed fetch(es)",
        stats.cycles, stats.arrivals, stats.departures, stats.failed_fetches
    )?;
    writeln!(writer, "Run log: {}", log_path.display())?;
    writeln!(writer, "Report: {}", report_path.display())?;

    if reason == StopReason::Unauthorized {
        bail!("the access token was rejected; refresh it and update CW_ACCESS_TOKEN before restarting");
    }
    Ok(())
}
