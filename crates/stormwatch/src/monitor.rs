//! Periodic report polling.
//!
//! A [`Poller`] fetches from a [`ReportSource`] on a fixed interval, decodes
//! each new report and sends it through a channel. A report whose raw text
//! is unchanged since the previous poll is not sent again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::metar;
use crate::observation::{hash_report, WeatherReport};
use crate::source::ReportSource;

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for a [`Poller`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between polls.
    pub interval: Duration,

    /// Station name attached to every report.
    pub station_name: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            station_name: String::new(),
        }
    }
}

/// Polls a report source and emits decoded reports.
pub struct Poller {
    source: Arc<dyn ReportSource>,
    config: PollerConfig,
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    last_hash: Option<String>,
    poll_count: u64,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("last_hash", &self.last_hash)
            .field("poll_count", &self.poll_count)
            .finish()
    }
}

impl Poller {
    /// Create a poller for `source`.
    #[must_use]
    pub fn new(source: Arc<dyn ReportSource>, config: PollerConfig) -> Self {
        Self {
            source,
            config,
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
            last_hash: None,
            poll_count: 0,
        }
    }

    /// Check if the polling loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of polls attempted so far.
    #[must_use]
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    /// Fetch and decode once.
    ///
    /// Returns `None` if the raw report is the same as on the previous
    /// successful poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the report is empty.
    pub async fn poll_once(&mut self) -> Result<Option<WeatherReport>> {
        self.poll_count += 1;
        let fetched = self.source.fetch().await?;

        let hash = hash_report(&fetched.raw);
        if self.last_hash.as_ref() == Some(&hash) {
            trace!(source = %self.source.name(), "report unchanged");
            return Ok(None);
        }

        let parsed = metar::parse(&fetched.raw)?;
        if parsed.is_sparse() {
            warn!(raw = %fetched.raw, "report decoded with no usable fields");
        }

        debug!(hash = %hash, station = %parsed.station, "new report");
        self.last_hash = Some(hash);

        let report = WeatherReport::new(
            fetched.raw,
            parsed,
            self.config.station_name.clone(),
            fetched.fetched_at,
        )
        .with_issued_at(fetched.issued_at);

        Ok(Some(report))
    }

    /// Poll until stopped or until the receiver is dropped.
    ///
    /// The first poll happens immediately. Errors are logged and polling
    /// continues on the next tick. A stop request wakes the loop without
    /// waiting for the tick.
    pub async fn start(&mut self, tx: mpsc::Sender<WeatherReport>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("poller already running");
            return;
        }

        info!(
            source = %self.source.name(),
            interval_secs = self.config.interval.as_secs(),
            "starting poller"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stop_signal = Arc::clone(&self.stop_signal);

        loop {
            {
                let stopped = stop_signal.notified();
                tokio::pin!(stopped);
                // Register before checking the flag so a stop in between is not lost.
                stopped.as_mut().enable();
                if !self.is_running() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = &mut stopped => break,
                }
            }

            match self.poll_once().await {
                Ok(Some(report)) => {
                    if tx.send(report).await.is_err() {
                        debug!("report channel closed, stopping poller");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, source = %self.source.name(), "poll failed"),
            }
        }

        self.running.store(false, Ordering::SeqCst);
        debug!(polls = self.poll_count, "poller stopped");
    }

    /// Stop the polling loop, waking it if it is waiting for a tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_signal.notify_waiters();
    }

    /// Get a handle that can stop the poller from another task.
    #[must_use]
    pub fn stop_handle(&self) -> PollerHandle {
        PollerHandle {
            running: Arc::clone(&self.running),
            stop_signal: Arc::clone(&self.stop_signal),
        }
    }
}

/// Cloneable handle to a running [`Poller`].
#[derive(Debug, Clone)]
pub struct PollerHandle {
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
}

impl PollerHandle {
    /// Stop the associated poller.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_signal.notify_waiters();
    }

    /// Check if the poller is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
