//! Report sources.
//!
//! A [`ReportSource`] produces the raw text of the latest report for a
//! station. NOAA publishes one small text file per station: a UTC timestamp
//! line followed by the METAR line. [`extract_report`] splits that format;
//! a file holding just the report line is accepted too.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Header timestamp format of NOAA station files (`2024/01/15 12:00`).
const NOAA_HEADER_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Raw report text fetched from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedReport {
    /// The METAR line.
    pub raw: String,
    /// Issue time from the source's header line, when it has one.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

/// Something that can fetch the latest report text.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Name of this source, for logging and error messages.
    fn name(&self) -> String;

    /// Fetch the latest report.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read, or holds no report.
    async fn fetch(&self) -> Result<FetchedReport>;
}

/// Split NOAA station-file text into the report line and its issue time.
///
/// Returns `None` when the text has no report line.
#[must_use]
pub fn extract_report(text: &str) -> Option<(String, Option<DateTime<Utc>>)> {
    let mut issued_at = None;
    let mut report = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match NaiveDateTime::parse_from_str(line, NOAA_HEADER_FORMAT) {
            Ok(ts) => issued_at = Some(ts.and_utc()),
            Err(_) => report = Some(line),
        }
    }

    report.map(|r| (r.to_string(), issued_at))
}

fn fetched(source_name: &str, text: &str) -> Result<FetchedReport> {
    let (raw, issued_at) = extract_report(text).ok_or_else(|| Error::empty_report(source_name))?;
    Ok(FetchedReport {
        raw,
        issued_at,
        fetched_at: Utc::now(),
    })
}

/// Fetches station files over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    station: String,
}

impl HttpSource {
    /// Create a source for `{base_url}/{STATION}.TXT`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, station: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::fetch("http", e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            station: station.to_ascii_uppercase(),
        })
    }

    /// URL of the station file.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}.TXT", self.base_url, self.station)
    }
}

#[async_trait]
impl ReportSource for HttpSource {
    fn name(&self) -> String {
        format!("http:{}", self.station)
    }

    #[instrument(skip(self), fields(station = %self.station))]
    async fn fetch(&self) -> Result<FetchedReport> {
        let url = self.url();
        debug!(url = %url, "fetching station file");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch(self.name(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(self.name(), format!("HTTP {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::fetch(self.name(), e.to_string()))?;

        fetched(&self.name(), &text)
    }
}

/// Reads a station file from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source reading `path` on every fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSource for FileSource {
    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch(&self) -> Result<FetchedReport> {
        debug!(path = %self.path.display(), "reading station file");
        let text = tokio::fs::read_to_string(&self.path).await?;
        fetched(&self.name(), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOAA_FILE: &str = "2024/01/15 12:00\nMKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012\n";

    #[test]
    fn test_extract_noaa_format() {
        let (raw, issued_at) = extract_report(NOAA_FILE).unwrap();
        assert_eq!(raw, "MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012");
        assert_eq!(
            issued_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_extract_bare_report() {
        let (raw, issued_at) = extract_report("  MKJP 151200Z 09010KT  \n\n").unwrap();
        assert_eq!(raw, "MKJP 151200Z 09010KT");
        assert!(issued_at.is_none());
    }

    #[test]
    fn test_extract_empty() {
        assert!(extract_report("").is_none());
        assert!(extract_report("\n  \n").is_none());
        assert!(extract_report("2024/01/15 12:00\n").is_none());
    }

    #[test]
    fn test_http_source_url() {
        let source =
            HttpSource::new("https://example.test/stations/", "mkjp", Duration::from_secs(5))
                .unwrap();
        assert_eq!(source.url(), "https://example.test/stations/MKJP.TXT");
        assert_eq!(source.name(), "http:MKJP");
    }

    #[tokio::test]
    async fn test_http_source_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MKJP.TXT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NOAA_FILE))
            .mount(&server)
            .await;

        let source = HttpSource::new(server.uri(), "MKJP", Duration::from_secs(5)).unwrap();
        let report = source.fetch().await.unwrap();

        assert_eq!(report.raw, "MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012");
        assert!(report.issued_at.is_some());
    }

    #[tokio::test]
    async fn test_http_source_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(server.uri(), "ZZZZ", Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();

        assert!(err.is_fetch_error());
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_http_source_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\n"))
            .mount(&server)
            .await;

        let source = HttpSource::new(server.uri(), "MKJP", Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(err.is_no_data());
    }

    #[tokio::test]
    async fn test_file_source_fetch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{NOAA_FILE}").unwrap();

        let source = FileSource::new(file.path());
        let report = source.fetch().await.unwrap();
        assert!(report.raw.starts_with("MKJP"));
        assert!(source.name().starts_with("file:"));
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileSource::new("/nonexistent/MKJP.TXT");
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
