//! Configuration management for stormwatch.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "stormwatch";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "observations.db";

/// Directory of per-station METAR text files published by NOAA.
pub const NOAA_STATIONS_URL: &str = "https://tgftp.nws.noaa.gov/data/observations/metar/stations";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `STORMWATCH_`, sections split on
///    `__`, e.g. `STORMWATCH_SOURCE__POLL_INTERVAL_SECS`)
/// 2. TOML config file at `~/.config/stormwatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Station configuration.
    pub station: StationConfig,
    /// Report source configuration.
    pub source: SourceConfig,
    /// Latest-observation cache configuration.
    pub cache: CacheConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// The station whose reports are fetched by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// ICAO identifier.
    pub code: String,
    /// Human-readable name shown alongside reports.
    pub name: String,
}

/// Where and how often reports are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the station file directory.
    pub base_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Interval between polls in seconds.
    pub poll_interval_secs: u64,
}

/// Staleness policy for the latest observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age in hours after which a cached report is stale.
    pub max_age_hours: u32,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/stormwatch/observations.db`
    pub database_path: Option<PathBuf>,
    /// Maximum number of observations to retain.
    /// Set to 0 for unlimited.
    pub max_observations: usize,
    /// Maximum age of observations to retain in days.
    /// Set to 0 for unlimited.
    pub max_age_days: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            code: "MKJP".to_string(),
            name: "Kingston/Norman Manley International Airport".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: NOAA_STATIONS_URL.to_string(),
            timeout_secs: 30,
            poll_interval_secs: 300,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_age_hours: 3 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            max_observations: 10_000,
            max_age_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `STORMWATCH_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("STORMWATCH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        validate_station_code(&self.station.code)?;

        if self.source.poll_interval_secs == 0 {
            return Err(Error::config_validation(
                "poll_interval_secs must be greater than 0",
            ));
        }

        if self.source.timeout_secs == 0 {
            return Err(Error::config_validation(
                "timeout_secs must be greater than 0",
            ));
        }

        if !(self.source.base_url.starts_with("http://")
            || self.source.base_url.starts_with("https://"))
        {
            return Err(Error::config_validation(format!(
                "base_url must be an http(s) URL: {}",
                self.source.base_url
            )));
        }

        if self.cache.max_age_hours == 0 {
            return Err(Error::config_validation(
                "max_age_hours must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.source.poll_interval_secs)
    }

    /// Get the HTTP timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    /// Get the cache staleness limit.
    #[must_use]
    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.cache.max_age_hours))
    }

    /// Get the observation retention age, `None` when unlimited.
    #[must_use]
    pub fn max_age(&self) -> Option<chrono::Duration> {
        if self.storage.max_age_days == 0 {
            None
        } else {
            Some(chrono::Duration::days(i64::from(self.storage.max_age_days)))
        }
    }
}

/// Check that a station identifier looks like an ICAO code.
///
/// # Errors
///
/// Returns an error unless the code is four ASCII letters or digits,
/// starting with a letter.
pub fn validate_station_code(code: &str) -> Result<()> {
    let valid = code.len() == 4
        && code.starts_with(|c: char| c.is_ascii_alphabetic())
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(Error::config_validation(format!(
            "station code must be a 4-character ICAO identifier: {code:?}"
        )))
    }
}
