//! In-memory cache of the latest weather report.
//!
//! The cache holds one [`WeatherReport`] and knows how old it is. Staleness
//! is reported explicitly through [`Freshness`] so callers can decide
//! whether to serve a stale report or fetch a new one.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::observation::WeatherReport;

/// How usable the cached report is at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing cached yet.
    Empty,
    /// Cached report is within the maximum age.
    Fresh,
    /// Cached report is older than the maximum age.
    Stale {
        /// Time since the report was fetched.
        age: Duration,
    },
}

impl Freshness {
    /// Check if the cached report can be served as current.
    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Cache of the most recent report for one station.
#[derive(Debug, Clone)]
pub struct ObservationCache {
    latest: Option<WeatherReport>,
    max_age: Duration,
}

impl ObservationCache {
    /// Create an empty cache that treats reports older than `max_age` as stale.
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            latest: None,
            max_age,
        }
    }

    /// Maximum age before a report is stale.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Store `report` unless the cache already holds a newer one.
    ///
    /// Returns `true` if the report replaced the cached one.
    pub fn update(&mut self, report: WeatherReport) -> bool {
        if let Some(current) = &self.latest {
            if current.fetched_at > report.fetched_at {
                debug!(
                    cached = %current.fetched_at,
                    offered = %report.fetched_at,
                    "ignoring older report"
                );
                return false;
            }
        }
        self.latest = Some(report);
        true
    }

    /// The cached report regardless of age.
    #[must_use]
    pub fn latest(&self) -> Option<&WeatherReport> {
        self.latest.as_ref()
    }

    /// Freshness of the cached report at `now`.
    #[must_use]
    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        match &self.latest {
            None => Freshness::Empty,
            Some(report) => {
                let age = now - report.fetched_at;
                if age > self.max_age {
                    Freshness::Stale { age }
                } else {
                    Freshness::Fresh
                }
            }
        }
    }

    /// The cached report if it is still fresh at `now`.
    #[must_use]
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<&WeatherReport> {
        if self.freshness(now).is_fresh() {
            self.latest.as_ref()
        } else {
            None
        }
    }

    /// Drop the cached report.
    pub fn clear(&mut self) {
        self.latest = None;
    }
}
