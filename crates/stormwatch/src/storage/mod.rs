//! Observation log.
//!
//! `SQLite`-backed history of fetched reports. Identical raw reports are
//! stored once. Rows keep the raw text and are decoded again when read, so
//! a parser fix applies to the whole history.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::metar;
use crate::observation::WeatherReport;

const SELECT_COLUMNS: &str =
    "SELECT id, raw, raw_hash, station_name, fetched_at, issued_at, parsed_json FROM observations";

/// A report read back from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObservation {
    /// Row id.
    pub id: i64,
    /// BLAKE3 hash of the raw report.
    pub raw_hash: String,
    /// The report, decoded from its raw text.
    pub report: WeatherReport,
    /// Wire JSON of the observation as decoded when it was recorded.
    pub parsed_json: String,
}

/// Columns of one row before the raw text is decoded.
struct ObservationRow {
    id: i64,
    raw: String,
    raw_hash: String,
    station_name: String,
    fetched_at: String,
    issued_at: Option<String>,
    parsed_json: String,
}

impl ObservationRow {
    fn from_sql(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            raw: row.get(1)?,
            raw_hash: row.get(2)?,
            station_name: row.get(3)?,
            fetched_at: row.get(4)?,
            issued_at: row.get(5)?,
            parsed_json: row.get(6)?,
        })
    }

    fn decode(self) -> Result<StoredObservation> {
        let parsed = metar::parse(&self.raw)?;
        let fetched_at = parse_timestamp(&self.fetched_at).ok_or_else(|| {
            Error::internal(format!(
                "observation {} has invalid fetched_at: {}",
                self.id, self.fetched_at
            ))
        })?;
        let issued_at = self.issued_at.as_deref().and_then(parse_timestamp);

        Ok(StoredObservation {
            id: self.id,
            raw_hash: self.raw_hash,
            report: WeatherReport::new(self.raw, parsed, self.station_name, fetched_at)
                .with_issued_at(issued_at),
            parsed_json: self.parsed_json,
        })
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Storage engine for fetched reports.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Open or create the log at `path`.
    ///
    /// Creates parent directories as needed and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created, or
    /// the schema cannot be migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!(path = %path.display(), "opening observation log");
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!(path = %path.display(), "observation log opened");
        Ok(Self { path, conn })
    }

    /// Open a throwaway in-memory log.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a report.
    ///
    /// Returns the new row id, or `None` if the same raw report is already
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write or JSON encoding fails.
    pub fn insert(&self, report: &WeatherReport) -> Result<Option<i64>> {
        let hash = report.raw_hash();
        if self.exists_by_hash(&hash)? {
            debug!(hash = &hash[..16], "skipping duplicate report");
            return Ok(None);
        }

        let parsed_json = serde_json::to_string(&report.parsed)?;
        self.conn.execute(
            r"
            INSERT INTO observations
                (station, station_name, raw, raw_hash, fetched_at, issued_at, parsed_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                report.station(),
                report.station_name,
                report.raw.trim(),
                hash,
                format_timestamp(report.fetched_at),
                report.issued_at.map(format_timestamp),
                parsed_json,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, station = report.station(), "stored report");
        Ok(Some(id))
    }

    fn exists_by_hash(&self, hash: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM observations WHERE raw_hash = ?1",
                [hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Get a report by row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is unreadable.
    pub fn get(&self, id: i64) -> Result<Option<StoredObservation>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], ObservationRow::from_sql)
            .optional()?
            .map(ObservationRow::decode)
            .transpose()
    }

    /// Most recent reports across all stations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is unreadable.
    pub fn get_recent(&self, limit: usize) -> Result<Vec<StoredObservation>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY fetched_at DESC, id DESC LIMIT ?1");
        self.query(&sql, params![sql_limit(limit)])
    }

    /// Most recent reports for one station, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is unreadable.
    pub fn get_by_station(&self, station: &str, limit: usize) -> Result<Vec<StoredObservation>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE station = ?1 ORDER BY fetched_at DESC, id DESC LIMIT ?2"
        );
        self.query(&sql, params![station.to_ascii_uppercase(), sql_limit(limit)])
    }

    /// Newest report for one station.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is unreadable.
    pub fn latest_for_station(&self, station: &str) -> Result<Option<StoredObservation>> {
        Ok(self.get_by_station(station, 1)?.into_iter().next())
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<StoredObservation>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, ObservationRow::from_sql)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(ObservationRow::decode).collect()
    }

    /// Number of stored reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a report by row id.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM observations WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Delete reports fetched longer ago than `max_age`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn prune_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = format_timestamp(Utc::now() - max_age);
        let affected = self
            .conn
            .execute("DELETE FROM observations WHERE fetched_at < ?1", [cutoff])?;

        if affected > 0 {
            info!(deleted = affected, "pruned old observations");
        }
        Ok(affected)
    }

    /// Keep only the `keep` most recent reports.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn prune_keep_recent(&self, keep: usize) -> Result<usize> {
        let affected = self.conn.execute(
            r"
            DELETE FROM observations WHERE id NOT IN (
                SELECT id FROM observations ORDER BY fetched_at DESC, id DESC LIMIT ?1
            )
            ",
            [sql_limit(keep)],
        )?;

        if affected > 0 {
            info!(deleted = affected, kept = keep, "pruned observations to limit");
        }
        Ok(affected)
    }

    /// Summary statistics of the log.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_observations = self.count()?;
        let station_count = self.conn.query_row(
            "SELECT COUNT(DISTINCT station) FROM observations",
            [],
            |row| row.get(0),
        )?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(fetched_at), MAX(fetched_at) FROM observations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path == Path::new(":memory:") {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_observations,
            station_count,
            oldest_fetch: oldest.as_deref().and_then(parse_timestamp),
            newest_fetch: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }
}

/// Statistics about the observation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored reports.
    pub total_observations: i64,
    /// Number of distinct stations.
    pub station_count: i64,
    /// Fetch time of the oldest report.
    pub oldest_fetch: Option<DateTime<Utc>>,
    /// Fetch time of the newest report.
    pub newest_fetch: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn report(raw: &str, fetched_at: DateTime<Utc>) -> WeatherReport {
        WeatherReport::new(raw, metar::parse(raw).unwrap(), "Kingston", fetched_at)
    }

    fn kingston(hour: u32, fetched_at: DateTime<Utc>) -> WeatherReport {
        report(
            &format!("MKJP 15{hour:02}00Z 09010KT 9999 FEW020 30/24 Q1012"),
            fetched_at,
        )
    }

    #[test]
    fn test_insert_and_get() {
        let storage = storage();
        let now = Utc::now();
        let original = kingston(12, now).with_issued_at(Some(now - Duration::minutes(3)));

        let id = storage.insert(&original).unwrap().unwrap();
        let stored = storage.get(id).unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.raw_hash, original.raw_hash());
        assert_eq!(stored.report.raw, original.raw);
        assert_eq!(stored.report.parsed, original.parsed);
        assert_eq!(stored.report.station_name, "Kingston");
        assert_eq!(
            stored.report.fetched_at.timestamp_micros(),
            now.timestamp_micros()
        );
        assert!(stored.report.issued_at.is_some());
    }

    #[test]
    fn test_insert_deduplicates() {
        let storage = storage();
        let now = Utc::now();

        assert!(storage.insert(&kingston(12, now)).unwrap().is_some());
        assert!(storage
            .insert(&kingston(12, now + Duration::minutes(5)))
            .unwrap()
            .is_none());
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        assert!(storage().get(99_999).unwrap().is_none());
    }

    #[test]
    fn test_get_recent_newest_first() {
        let storage = storage();
        let base = Utc::now() - Duration::hours(10);
        for hour in 0..5 {
            storage
                .insert(&kingston(hour, base + Duration::hours(i64::from(hour))))
                .unwrap();
        }

        let recent = storage.get_recent(3).unwrap();
        let times: Vec<_> = recent
            .iter()
            .map(|s| s.report.observation_time.clone().unwrap())
            .collect();
        assert_eq!(times, ["150400Z", "150300Z", "150200Z"]);
    }

    #[test]
    fn test_get_by_station() {
        let storage = storage();
        let now = Utc::now();
        storage.insert(&kingston(12, now)).unwrap();
        storage
            .insert(&report(
                "KJFK 151251Z 31015G25KT 10SM FEW250 M02/M14 A3012",
                now,
            ))
            .unwrap();

        let jfk = storage.get_by_station("kjfk", 10).unwrap();
        assert_eq!(jfk.len(), 1);
        assert_eq!(jfk[0].report.station(), "KJFK");

        let latest = storage.latest_for_station("MKJP").unwrap().unwrap();
        assert_eq!(latest.report.station(), "MKJP");
        assert!(storage.latest_for_station("TNCM").unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let storage = storage();
        let id = storage.insert(&kingston(12, Utc::now())).unwrap().unwrap();

        assert!(storage.delete(id).unwrap());
        assert!(!storage.delete(id).unwrap());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_prune_older_than() {
        let storage = storage();
        let now = Utc::now();
        storage
            .insert(&kingston(1, now - Duration::days(40)))
            .unwrap();
        storage.insert(&kingston(2, now)).unwrap();

        assert_eq!(storage.prune_older_than(Duration::days(30)).unwrap(), 1);
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_prune_keep_recent() {
        let storage = storage();
        let base = Utc::now() - Duration::hours(10);
        for hour in 0..5 {
            storage
                .insert(&kingston(hour, base + Duration::hours(i64::from(hour))))
                .unwrap();
        }

        assert_eq!(storage.prune_keep_recent(2).unwrap(), 3);
        let left = storage.get_recent(10).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].report.observation_time.as_deref(), Some("150400Z"));
    }

    #[test]
    fn test_stats() {
        let storage = storage();
        let empty = storage.stats().unwrap();
        assert_eq!(empty.total_observations, 0);
        assert!(empty.oldest_fetch.is_none());

        let now = Utc::now();
        storage
            .insert(&kingston(1, now - Duration::hours(1)))
            .unwrap();
        storage.insert(&kingston(2, now)).unwrap();
        storage
            .insert(&report("KJFK 151251Z 31015KT 10SM FEW250 M02/M14 A3012", now))
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_observations, 3);
        assert_eq!(stats.station_count, 2);
        assert!(stats.oldest_fetch < stats.newest_fetch);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_parsed_json_column() {
        let storage = storage();
        let id = storage.insert(&kingston(12, Utc::now())).unwrap().unwrap();

        let json: String = storage
            .conn
            .query_row("SELECT parsed_json FROM observations", [], |row| row.get(0))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["wind"]["directionCompass"], "E");

        let stored = storage.get(id).unwrap().unwrap();
        assert_eq!(stored.parsed_json, json);
        let recorded: serde_json::Value = serde_json::from_str(&stored.parsed_json).unwrap();
        assert_eq!(recorded, serde_json::to_value(&stored.report.parsed).unwrap());
    }

    #[test]
    fn test_open_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("observations.db");

        let storage = Storage::open(&path).unwrap();
        storage.insert(&kingston(12, Utc::now())).unwrap();
        assert!(path.exists());
        assert!(storage.stats().unwrap().db_size_bytes > 0);
        drop(storage);

        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
