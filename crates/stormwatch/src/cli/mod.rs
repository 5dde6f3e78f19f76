//! Command-line interface for stormwatch.
//!
//! Argument definitions live in `commands`, text rendering in `output`. The
//! `stormwatch` binary wires them to the library.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, FetchCommand, HistoryCommand, LatestCommand, OutputFormat, ParseCommand,
    PruneCommand, SourceArgs, WatchCommand,
};

/// stormwatch - METAR weather reports, decoded
///
/// Decodes aviation weather reports into plain-language observations,
/// fetches the latest report for a station and keeps a local history.
#[derive(Debug, Parser)]
#[command(name = "stormwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a METAR report
    Parse(ParseCommand),

    /// Fetch and decode the latest report for a station
    Fetch(FetchCommand),

    /// Poll a station and record every new report
    Watch(WatchCommand),

    /// Show the newest recorded report for a station
    Latest(LatestCommand),

    /// List recorded reports
    History(HistoryCommand),

    /// Delete old reports from the observation log
    Prune(PruneCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
