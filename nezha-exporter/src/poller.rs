//! Periodic fetch-and-update loop

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::client::ServerSource;
use crate::record::ServerRecord;
use crate::updater::MetricUpdater;

/// How often the dashboard is polled
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One fetch-and-update pass over the upstream server list
pub struct PollCycle<S> {
    source: S,
    updater: MetricUpdater,
}

impl<S: ServerSource> PollCycle<S> {
    pub fn new(source: S, updater: MetricUpdater) -> Self {
        Self { source, updater }
    }

    /// Run one cycle. Never fails: a transport error skips the whole cycle,
    /// a bad record skips only that record.
    pub async fn run(&self) {
        let servers = match self.source.fetch_servers().await {
            Ok(servers) => servers,
            Err(e) => {
                warn!("update metric fail: {}", e);
                return;
            }
        };

        let (mut updated, mut skipped, mut failed) = (0usize, 0usize, 0usize);
        for raw in &servers {
            let Some(record) = ServerRecord::eligible(raw) else {
                skipped += 1;
                continue;
            };

            match self.updater.update(&record) {
                Ok(()) => updated += 1,
                Err(e) if e.is_record_error() => {
                    failed += 1;
                    warn!(server = %record.name(), "update metric fail: {}", e);
                }
                Err(e) => {
                    failed += 1;
                    error!(server = %record.name(), "update metric fail: {}", e);
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "Skipped servers without name, host or status");
        }
        info!(updated, skipped, failed, "Poll cycle complete");
    }
}

/// Drives a [`PollCycle`] at a fixed interval
pub struct Scheduler<S> {
    cycle: PollCycle<S>,
    period: Duration,
}

impl<S: ServerSource> Scheduler<S> {
    pub fn new(cycle: PollCycle<S>) -> Self {
        Self::with_period(cycle, POLL_INTERVAL)
    }

    pub fn with_period(cycle: PollCycle<S>, period: Duration) -> Self {
        Self { cycle, period }
    }

    /// Run a cycle immediately, then once per period until `shutdown` fires.
    ///
    /// Cycles run one after another on this task; ticks missed while a slow
    /// cycle was running are skipped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = self.period.as_secs_f64(), "Starting poll scheduler");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.cycle.run().await,
                _ = shutdown.recv() => break,
            }
        }

        info!("Poll scheduler stopped");
    }
}
