//! Logging setup for stormwatch.
//!
//! Events go to stderr so command output on stdout stays parseable
//! (`stormwatch fetch --json | jq`). The parser only emits `trace` events
//! for degraded groups; fetching, polling and storage log at `debug` and
//! above. Other crates stay silent unless `RUST_LOG` asks for them, except
//! that `-vv` also shows the HTTP client.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target prefix of every event this crate emits.
pub const LOG_TARGET: &str = "stormwatch";

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only, for scripted `fetch` and `latest` runs.
    Quiet,
    /// New reports, storage pruning and poller start/stop.
    #[default]
    Normal,
    /// Adds per-poll and per-query detail.
    Verbose,
    /// Adds degraded METAR groups and HTTP client events.
    Trace,
}

impl Verbosity {
    /// Map the `-q` flag and `-v` count onto a level. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// The `EnvFilter` directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        let directive = format!("{LOG_TARGET}={}", self.to_level_filter());
        match self {
            Self::Trace => format!("{directive},reqwest=debug"),
            _ => directive,
        }
    }
}

/// Build the filter for `verbosity`.
///
/// A valid `rust_log` overrides the flags. An invalid one is ignored.
#[must_use]
pub fn build_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.filter_directive()))
}

/// Initialize the logging system.
///
/// Call once at startup, before any command runs. `RUST_LOG` takes
/// precedence over `verbosity`.
///
/// # Examples
///
/// ```no_run
/// use stormwatch::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(verbosity, rust_log.as_deref());

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity != Verbosity::Normal)
            .with_file(false)
            .with_line_number(false),
    );

    // Already installed (tests, embedding callers): keep the existing one
    let _ = subscriber.try_init();
}

/// Initialize logging for tests, warnings and errors only.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
