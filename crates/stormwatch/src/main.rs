//! `stormwatch` - CLI for decoding and recording METAR weather reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use stormwatch::cli::output::{self, NO_DATA_MESSAGE};
use stormwatch::cli::{
    Cli, Command, ConfigCommand, FetchCommand, HistoryCommand, LatestCommand, OutputFormat,
    ParseCommand, PruneCommand, SourceArgs, WatchCommand,
};
use stormwatch::config::validate_station_code;
use stormwatch::monitor::{Poller, PollerConfig};
use stormwatch::source::{FileSource, HttpSource, ReportSource};
use stormwatch::{init_logging, metar, Config, ObservationCache, Storage, WeatherReport};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Decoding a report needs no configuration.
    if let Command::Parse(cmd) = &cli.command {
        return handle_parse(cmd);
    }
    if let Command::Config(cmd) = &cli.command {
        return handle_config(cli.config.clone(), cmd);
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Fetch(cmd) => handle_fetch(&config, &cmd).await,
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Latest(cmd) => handle_latest(&config, &cmd),
        Command::History(cmd) => handle_history(&config, &cmd),
        Command::Prune(cmd) => handle_prune(&config, &cmd),
        Command::Parse(_) | Command::Config(_) => Ok(()),
    }
}

fn handle_parse(cmd: &ParseCommand) -> anyhow::Result<()> {
    let text = if cmd.stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading report from stdin")?;
        buf
    } else {
        cmd.report_text()
    };

    let observation = metar::parse(&text).context(NO_DATA_MESSAGE)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&observation)?);
    } else {
        println!("{}", output::observation_details(&observation));
    }
    Ok(())
}

/// Station code and display name for a command.
fn resolve_station(config: &Config, requested: Option<&str>) -> anyhow::Result<(String, String)> {
    let Some(code) = requested else {
        return Ok((config.station.code.clone(), config.station.name.clone()));
    };

    let code = code.to_ascii_uppercase();
    validate_station_code(&code)?;
    let name = if code == config.station.code {
        config.station.name.clone()
    } else {
        code.clone()
    };
    Ok((code, name))
}

fn build_source(
    config: &Config,
    args: &SourceArgs,
) -> anyhow::Result<(Arc<dyn ReportSource>, String)> {
    let (station, name) = resolve_station(config, args.station.as_deref())?;
    let source: Arc<dyn ReportSource> = match &args.file {
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(HttpSource::new(
            config.source.base_url.as_str(),
            &station,
            config.request_timeout(),
        )?),
    };
    Ok((source, name))
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening observation log {}", path.display()))
}

/// Apply the configured retention limits.
fn enforce_retention(config: &Config, storage: &Storage) -> anyhow::Result<()> {
    if let Some(max_age) = config.max_age() {
        storage.prune_older_than(max_age)?;
    }
    if config.storage.max_observations > 0 {
        storage.prune_keep_recent(config.storage.max_observations)?;
    }
    Ok(())
}

async fn handle_fetch(config: &Config, cmd: &FetchCommand) -> anyhow::Result<()> {
    let (source, station_name) = build_source(config, &cmd.source)?;

    let fetched = match source.fetch().await {
        Ok(fetched) => fetched,
        Err(e) if e.is_no_data() => return Err(e).context(NO_DATA_MESSAGE),
        Err(e) => return Err(e.into()),
    };
    let parsed = metar::parse(&fetched.raw).context(NO_DATA_MESSAGE)?;
    let report = WeatherReport::new(fetched.raw, parsed, station_name, fetched.fetched_at)
        .with_issued_at(fetched.issued_at);

    if !cmd.no_store {
        let storage = open_storage(config)?;
        match storage.insert(&report)? {
            Some(id) => info!(id, "recorded report"),
            None => info!("report already recorded"),
        }
        enforce_retention(config, &storage)?;
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.station_name);
        println!("{}", report.raw);
        println!();
        println!("{}", output::observation_details(&report.parsed));
    }
    Ok(())
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let (source, station_name) = build_source(config, &cmd.source)?;
    let interval = match cmd.interval {
        Some(0) => bail!("--interval must be greater than 0"),
        Some(secs) => Duration::from_secs(secs),
        None => config.poll_interval(),
    };

    let storage = open_storage(config)?;
    let mut cache = ObservationCache::new(config.cache_max_age());

    let mut poller = Poller::new(
        source,
        PollerConfig {
            interval,
            station_name,
        },
    );
    let handle = poller.stop_handle();
    let (tx, mut rx) = mpsc::channel(16);
    let task = tokio::spawn(async move { poller.start(tx).await });

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(report) = received else { break };
                if let Err(e) = storage.insert(&report) {
                    warn!(error = %e, "failed to record report");
                } else if let Err(e) = enforce_retention(config, &storage) {
                    warn!(error = %e, "failed to prune observation log");
                }
                println!("[{}] {}", report.fetched_at.format("%H:%M"), report.summary);
                cache.update(report);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                handle.stop();
                break;
            }
        }
    }

    drop(rx);
    task.await.context("poller task failed")?;

    if let Some(report) = cache.latest() {
        info!(station = report.station(), "last report: {}", report.summary);
    }
    Ok(())
}

fn handle_latest(config: &Config, cmd: &LatestCommand) -> anyhow::Result<()> {
    let (station, _) = resolve_station(config, cmd.station.as_deref())?;
    let storage = open_storage(config)?;

    let Some(stored) = storage.latest_for_station(&station)? else {
        bail!("{NO_DATA_MESSAGE} for {station}");
    };

    let mut cache = ObservationCache::new(config.cache_max_age());
    cache.update(stored.report);
    let freshness = cache.freshness(Utc::now());
    let Some(report) = cache.latest() else {
        bail!("{NO_DATA_MESSAGE} for {station}");
    };

    let note = output::freshness_note(freshness);
    if cmd.json {
        if let Some(note) = &note {
            warn!(station = %station, "{note}");
        }
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report.station_name);
        if let Some(note) = note {
            println!("({note})");
        }
        println!("{}", output::observation_details(&report.parsed));
    }
    Ok(())
}

fn handle_history(config: &Config, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let observations = match &cmd.station {
        Some(station) => storage.get_by_station(station, cmd.limit)?,
        None => storage.get_recent(cmd.limit)?,
    };

    if observations.is_empty() && cmd.format != OutputFormat::Json {
        println!("{NO_DATA_MESSAGE}");
        return Ok(());
    }

    let rendered = match cmd.format {
        OutputFormat::Plain => output::history_plain(&observations),
        OutputFormat::Table => output::history_table(&observations),
        OutputFormat::Json => output::history_json(&observations)?,
    };
    println!("{rendered}");
    Ok(())
}

fn handle_prune(config: &Config, cmd: &PruneCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    let max_age = match cmd.older_than_days {
        Some(0) => None,
        Some(days) => Some(chrono::Duration::days(i64::from(days))),
        None => config.max_age(),
    };
    let by_age = match max_age {
        Some(age) => storage.prune_older_than(age)?,
        None => 0,
    };

    let keep = cmd.keep.unwrap_or(config.storage.max_observations);
    let by_count = if keep > 0 {
        storage.prune_keep_recent(keep)?
    } else {
        0
    };

    println!(
        "Deleted {} reports ({by_age} by age, {by_count} over the limit); {} remain.",
        by_age + by_count,
        storage.count()?
    );
    Ok(())
}

fn handle_config(
    config_path: Option<std::path::PathBuf>,
    cmd: &ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("loading configuration")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Station]");
                println!("  Code:               {}", config.station.code);
                println!("  Name:               {}", config.station.name);
                println!();
                println!("[Source]");
                println!("  Base URL:           {}", config.source.base_url);
                println!("  Timeout (secs):     {}", config.source.timeout_secs);
                println!("  Poll interval (s):  {}", config.source.poll_interval_secs);
                println!();
                println!("[Cache]");
                println!("  Max age (hours):    {}", config.cache.max_age_hours);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Max observations:   {}", config.storage.max_observations);
                println!("  Max age (days):     {}", config.storage.max_age_days);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .clone()
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
