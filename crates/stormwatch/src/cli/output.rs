//! Text rendering for CLI output.

use std::fmt::Write;

use chrono::Duration;

use crate::cache::Freshness;
use crate::metar::{Field, PressureUnit};
use crate::observation::{ParsedObservation, WeatherReport};
use crate::storage::StoredObservation;

/// Message shown when there is nothing to report.
pub const NO_DATA_MESSAGE: &str = "weather data not available";

/// Field-by-field description of an observation.
#[must_use]
pub fn observation_details(obs: &ParsedObservation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", obs.summary());
    let _ = writeln!(out);
    let _ = writeln!(out, "  Station:      {}", obs.station);
    let _ = writeln!(
        out,
        "  Observed:     {}",
        obs.observation_time.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "  Wind:         {}", wind_text(obs));
    let _ = writeln!(out, "  Visibility:   {}", obs.visibility.description());
    let _ = writeln!(out, "  Clouds:       {}", obs.clouds.label());
    let _ = writeln!(
        out,
        "  Temperature:  {}",
        temperature_text(obs.temperature_c(), obs.temperature_f())
    );
    let _ = writeln!(
        out,
        "  Dew point:    {}",
        temperature_text(obs.dew_point_c(), obs.dew_point_f())
    );
    let pressure = match &obs.pressure {
        Field::Value(p) => match (p.unit, p.reading()) {
            (PressureUnit::InchesOfMercury, Some(inches)) => format!("{inches:.2} inHg"),
            _ => format!("{} {}", p.value, p.unit.label()),
        },
        _ => "-".to_string(),
    };
    let _ = write!(out, "  Pressure:     {pressure}");
    out
}

fn wind_text(obs: &ParsedObservation) -> String {
    let wind = &obs.wind;
    let Some(speed) = wind.speed() else {
        return "-".to_string();
    };

    let mut text = match wind.direction_degrees() {
        Some(degrees) => format!("{} ({degrees:03}°)", wind.compass_label()),
        None => wind.compass_label().to_string(),
    };
    let _ = write!(text, " at {speed} {}", wind.unit.spoken());
    if let Some(gust) = wind.gust() {
        let _ = write!(text, ", gusting {gust}");
    }
    text
}

fn temperature_text(celsius: Option<i32>, fahrenheit: Option<i32>) -> String {
    match (celsius, fahrenheit) {
        (Some(c), Some(f)) => format!("{c}°C / {f}°F"),
        _ => "-".to_string(),
    }
}

/// Note to print next to a report of the given freshness, if any.
#[must_use]
pub fn freshness_note(freshness: Freshness) -> Option<String> {
    match freshness {
        Freshness::Stale { age } => Some(format!("stale: fetched {} ago", age_text(age))),
        Freshness::Fresh | Freshness::Empty => None,
    }
}

/// Compact age such as `45m` or `3h 20m`.
#[must_use]
pub fn age_text(age: Duration) -> String {
    let minutes = age.num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 48 * 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}d", minutes / (24 * 60))
    }
}

/// One line per report: fetch time, station and summary.
#[must_use]
pub fn history_plain(observations: &[StoredObservation]) -> String {
    observations
        .iter()
        .map(|o| {
            format!(
                "{} {} {}",
                o.report.fetched_at.format("%Y-%m-%d %H:%M"),
                o.report.station(),
                o.report.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Aligned table of reports.
#[must_use]
pub fn history_table(observations: &[StoredObservation]) -> String {
    let mut out = format!(
        "{:<6} {:<16} {:<7} {:<8} {:<10} {:<8} {:<18}",
        "ID", "FETCHED", "STATION", "TIME", "WIND", "TEMP", "CLOUDS"
    );
    for o in observations {
        let obs = &o.report.parsed;
        let wind = match obs.wind.speed() {
            Some(speed) => format!("{} {speed}", obs.wind.compass_label()),
            None => "-".to_string(),
        };
        let temp = obs
            .temperature_c()
            .map_or_else(|| "-".to_string(), |c| format!("{c}°C"));
        let _ = write!(
            out,
            "\n{:<6} {:<16} {:<7} {:<8} {:<10} {:<8} {:<18}",
            o.id,
            o.report.fetched_at.format("%Y-%m-%d %H:%M"),
            obs.station,
            obs.observation_time.as_deref().unwrap_or("-"),
            wind,
            temp,
            obs.clouds.label(),
        );
    }
    out
}

/// JSON array of the reports' wire envelopes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn history_json(observations: &[StoredObservation]) -> serde_json::Result<String> {
    let reports: Vec<&WeatherReport> = observations.iter().map(|o| &o.report).collect();
    serde_json::to_string_pretty(&reports)
}
