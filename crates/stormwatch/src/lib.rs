//! `stormwatch` - METAR weather reports, decoded
//!
//! The core is [`metar::parse`], a pure function that turns one raw METAR
//! line into a [`ParsedObservation`] with a plain-language summary. Around
//! it sit the pieces needed to serve it: report sources, a poller, a
//! latest-observation cache and a `SQLite` observation log.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metar;
pub mod monitor;
pub mod observation;
pub mod source;
pub mod storage;

pub use cache::{Freshness, ObservationCache};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use metar::{Field, MetarError};
pub use monitor::{Poller, PollerConfig, PollerHandle};
pub use observation::{ParsedObservation, WeatherReport};
pub use source::{FetchedReport, FileSource, HttpSource, ReportSource};
pub use storage::{Storage, StorageStats, StoredObservation};
