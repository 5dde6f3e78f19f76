//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Parse command arguments.
#[derive(Debug, Args)]
pub struct ParseCommand {
    /// The report, as one argument or as separate tokens
    #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
    pub report: Vec<String>,

    /// Read the report from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Output the decoded observation as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ParseCommand {
    /// The report text given on the command line.
    #[must_use]
    pub fn report_text(&self) -> String {
        self.report.join(" ")
    }
}

/// Where to read reports from.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// ICAO station code (defaults to the configured station)
    #[arg(short, long, value_name = "ICAO")]
    pub station: Option<String>,

    /// Read the station file from disk instead of over HTTP
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Fetch command arguments.
#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Report source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output the weather report as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Don't record the report in the observation log
    #[arg(long)]
    pub no_store: bool,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Report source
    #[command(flatten)]
    pub source: SourceArgs,

    /// Seconds between polls (defaults to the configured interval)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,
}

/// Latest command arguments.
#[derive(Debug, Args)]
pub struct LatestCommand {
    /// ICAO station code (defaults to the configured station)
    #[arg(short, long, value_name = "ICAO")]
    pub station: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Only show reports from this station
    #[arg(short, long, value_name = "ICAO")]
    pub station: Option<String>,

    /// Maximum number of reports
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Prune command arguments.
#[derive(Debug, Args)]
pub struct PruneCommand {
    /// Delete reports older than this many days (defaults to the configured retention)
    #[arg(long, value_name = "DAYS")]
    pub older_than_days: Option<u32>,

    /// Keep at most this many reports (defaults to the configured limit)
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One summary line per report
    #[default]
    Plain,
    /// Aligned columns
    Table,
    /// JSON array of weather reports
    Json,
}
