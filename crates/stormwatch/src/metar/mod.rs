//! METAR report decoding.
//!
//! [`parse`] turns one raw report line into a [`ParsedObservation`]. Groups
//! are located by position (station, time, wind, visibility) or by a
//! pattern scan (clouds, temperature, pressure). A group that cannot be read
//! degrades on its own to [`Field::Missing`] or [`Field::Malformed`]; only
//! input with no tokens at all is an error.

pub mod field;
pub mod groups;
pub mod wind;

use thiserror::Error;
use tracing::trace;

pub use field::Field;
pub use groups::{CloudCover, Pressure, PressureUnit, Temperatures, Visibility};
pub use wind::{compass_label, Wind, WindDirection, WindUnit};

use crate::observation::ParsedObservation;

/// Report type prefixes that some feeds put before the station.
const REPORT_TYPES: [&str; 2] = ["METAR", "SPECI"];

/// Marker after which the report carries free-form remarks.
const REMARKS_MARKER: &str = "RMK";

/// Errors that stop a report from being decoded at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetarError {
    /// The input has no tokens.
    #[error("empty METAR report")]
    Empty,
}

/// Decode a raw METAR report.
///
/// # Errors
///
/// Returns [`MetarError::Empty`] if the input is empty or whitespace only.
/// Any other input yields an observation, possibly with every field missing.
///
/// # Examples
///
/// ```
/// let obs = stormwatch::metar::parse("MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012").unwrap();
/// assert_eq!(obs.station, "MKJP");
/// assert_eq!(obs.wind.compass_label(), "E");
/// assert_eq!(obs.temperature_f(), Some(86));
/// ```
pub fn parse(raw: &str) -> Result<ParsedObservation, MetarError> {
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.first().is_some_and(|t| REPORT_TYPES.contains(t)) {
        tokens.remove(0);
    }

    let Some(station) = tokens.first() else {
        return Err(MetarError::Empty);
    };

    let body = body_tokens(&tokens);
    let observation = ParsedObservation::new(
        (*station).to_string(),
        tokens.get(1).map(ToString::to_string),
        wind::parse_wind(tokens.get(2).copied()),
        groups::parse_visibility(tokens.get(3).copied()),
        groups::parse_clouds(body),
        groups::parse_temperatures(body),
        groups::parse_pressure(body),
    );

    trace!(
        station = %observation.station,
        sparse = observation.is_sparse(),
        "decoded report"
    );
    Ok(observation)
}

/// Tokens between the observation time and the remarks.
fn body_tokens<'a>(tokens: &'a [&'a str]) -> &'a [&'a str] {
    let start = tokens.len().min(2);
    let rest = &tokens[start..];
    let end = rest
        .iter()
        .position(|t| *t == REMARKS_MARKER)
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kingston_report() {
        let obs = parse("MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012").unwrap();

        assert_eq!(obs.station, "MKJP");
        assert_eq!(obs.observation_time.as_deref(), Some("151200Z"));
        assert_eq!(obs.wind.direction_degrees(), Some(90));
        assert_eq!(obs.wind.compass_label(), "E");
        assert_eq!(obs.wind.speed(), Some(10));
        assert_eq!(obs.wind.gust(), None);
        assert_eq!(obs.visibility.description(), "10+ km");
        assert_eq!(obs.clouds, CloudCover::Few);
        assert_eq!(obs.temperature_c(), Some(30));
        assert_eq!(obs.temperature_f(), Some(86));
        assert_eq!(obs.dew_point_c(), Some(24));
        assert_eq!(obs.dew_point_f(), Some(75));

        let pressure = obs.pressure.value().unwrap();
        assert_eq!(pressure.value, "1012");
        assert_eq!(pressure.unit, PressureUnit::Hectopascals);
    }

    #[test]
    fn test_parse_gusting_report_with_missing_groups() {
        let obs = parse("MKJP 151200Z 27025G40KT ////  BKN010 ////  A2992").unwrap();

        assert_eq!(obs.wind.direction_degrees(), Some(270));
        assert_eq!(obs.wind.speed(), Some(25));
        assert_eq!(obs.wind.gust(), Some(40));
        assert_eq!(obs.visibility.description(), "Unknown");
        assert_eq!(obs.clouds, CloudCover::Broken);
        assert_eq!(obs.temperature_c(), None);
        assert_eq!(obs.temperature_f(), None);
        assert_eq!(obs.dew_point_c(), None);
        assert_eq!(obs.dew_point_f(), None);
        assert!(obs.temperatures.air.is_missing());

        let pressure = obs.pressure.value().unwrap();
        assert_eq!(pressure.value, "2992");
        assert_eq!(pressure.unit, PressureUnit::InchesOfMercury);
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse(""), Err(MetarError::Empty));
        assert_eq!(parse("   \t\n "), Err(MetarError::Empty));
        assert_eq!(parse("METAR"), Err(MetarError::Empty));
    }

    #[test]
    fn test_parse_skips_report_type() {
        let obs = parse("METAR KJFK 151251Z 31015G25KT 10SM FEW250 M02/M14 A3012 RMK AO2").unwrap();
        assert_eq!(obs.station, "KJFK");
        assert_eq!(obs.wind.compass_label(), "NW");
        assert_eq!(obs.temperature_c(), Some(-2));
        assert_eq!(obs.dew_point_c(), Some(-14));
        assert_eq!(obs.pressure.value().unwrap().value, "3012");

        let obs = parse("SPECI MKJP 151230Z VRB02KT 9999 SCT018 29/23 Q1011").unwrap();
        assert_eq!(obs.station, "MKJP");
        assert_eq!(obs.wind.compass_label(), "Variable");
    }

    #[test]
    fn test_parse_station_only() {
        let obs = parse("MKJP").unwrap();
        assert_eq!(obs.station, "MKJP");
        assert!(obs.observation_time.is_none());
        assert!(obs.wind.direction.is_missing());
        assert_eq!(obs.visibility.description(), "Unknown");
        assert_eq!(obs.clouds, CloudCover::Unknown);
        assert!(obs.pressure.is_missing());
        assert!(obs.is_sparse());
    }

    #[test]
    fn test_parse_garbage_degrades_per_field() {
        let obs = parse("XXXX garbage more junk here").unwrap();
        assert!(obs.wind.direction.is_malformed());
        assert_eq!(obs.wind.compass_label(), "Variable");
        assert!(obs.visibility.kilometres.is_malformed());
        assert_eq!(obs.clouds, CloudCover::Unknown);
        assert_eq!(obs.temperature_c(), None);
        assert!(obs.pressure.is_missing());
        assert!(obs.is_sparse());
    }

    #[test]
    fn test_one_bad_group_keeps_the_rest() {
        let obs = parse("MKJP 151200Z 09O10KT 9999 FEW020 30/24 Q1012").unwrap();
        assert!(obs.wind.speed.is_malformed());
        assert_eq!(obs.temperature_c(), Some(30));
        assert_eq!(obs.clouds, CloudCover::Few);
        assert!(obs.pressure.is_value());
        assert!(!obs.is_sparse());
    }

    #[test]
    fn test_station_codes_do_not_match_groups() {
        let obs = parse("SCTE 151200Z 18005KT 9999 BKN015 12/10 Q1020").unwrap();
        assert_eq!(obs.clouds, CloudCover::Broken);

        let obs = parse("AGGH 151200Z 18005KT 9999 FEW015 29/24 Q1009").unwrap();
        assert_eq!(obs.pressure.value().unwrap().value, "1009");
    }

    #[test]
    fn test_remarks_are_ignored() {
        let obs = parse("KBOS 151254Z 04008KT 10SM RMK SLP123 T01000050 FEW030 A3000").unwrap();
        assert_eq!(obs.clouds, CloudCover::Unknown);
        assert!(obs.pressure.is_missing());
        assert_eq!(obs.temperature_c(), None);
    }

    #[test]
    fn test_cloud_scan_follows_token_order() {
        let obs = parse("MKJP 151200Z 09010KT 9999 OVC008 FEW020 30/24 Q1012").unwrap();
        assert_eq!(obs.clouds, CloudCover::Overcast);
    }

    #[test]
    fn test_body_tokens_bounds() {
        assert!(body_tokens(&["MKJP"]).is_empty());
        assert_eq!(body_tokens(&["MKJP", "151200Z", "09010KT"]), &["09010KT"]);
        assert_eq!(
            body_tokens(&["MKJP", "151200Z", "FEW020", "RMK", "SCT"]),
            &["FEW020"]
        );
    }
}
