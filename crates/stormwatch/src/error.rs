//! Error types for stormwatch.
//!
//! This module defines the error type used by the fetching, caching and
//! storage layers around the METAR parser. The parser itself never fails on
//! malformed groups; it only reports [`MetarError::Empty`].

use std::path::PathBuf;
use thiserror::Error;

use crate::metar::MetarError;

/// The main error type for stormwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Source Errors ===
    /// Fetching a report from its source failed.
    #[error("failed to fetch report from {source_name}: {message}")]
    Fetch {
        /// Name of the report source.
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The source returned no report text.
    #[error("no report available from {source_name}")]
    EmptyReport {
        /// Name of the report source.
        source_name: String,
    },

    /// The report could not be decoded at all.
    #[error("failed to decode report: {0}")]
    Metar(#[from] MetarError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for stormwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a fetch error for the named source.
    #[must_use]
    pub fn fetch(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an empty-report error for the named source.
    #[must_use]
    pub fn empty_report(source_name: impl Into<String>) -> Self {
        Self::EmptyReport {
            source_name: source_name.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means no weather data is available.
    ///
    /// Callers map this to a "weather data not available" state rather than
    /// a failure.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::EmptyReport { .. } | Self::Metar(MetarError::Empty))
    }

    /// Check if this error came from fetching a report.
    #[must_use]
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
