//! `SQLite` schema for the observation log.

/// Fetched reports, one row per distinct raw report.
///
/// `parsed_json` holds the observation as served on the wire at insert time;
/// `raw` stays the source of truth and is decoded again on read.
pub const CREATE_OBSERVATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    station TEXT NOT NULL,
    station_name TEXT NOT NULL,
    raw TEXT NOT NULL,
    raw_hash TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    issued_at TEXT,
    parsed_json TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Newest-first listing.
pub const CREATE_FETCHED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_observations_fetched_at ON observations(fetched_at DESC)
";

/// Deduplication lookups.
pub const CREATE_HASH_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_observations_hash ON observations(raw_hash)
";

/// Per-station listing.
pub const CREATE_STATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_observations_station ON observations(station, fetched_at DESC)
";

/// Key-value metadata, including the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_OBSERVATIONS_TABLE,
    CREATE_FETCHED_AT_INDEX,
    CREATE_HASH_INDEX,
    CREATE_STATION_INDEX,
    CREATE_METADATA_TABLE,
];
