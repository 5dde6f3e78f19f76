//! Decoded observations and the JSON shapes served to consumers.
//!
//! [`ParsedObservation`] is what the METAR parser produces. It serializes to
//! the camelCase wire contract (`wind.directionCompass`,
//! `temperature.fahrenheit`, ...). [`WeatherReport`] wraps it with the raw
//! text and fetch metadata, the envelope a weather endpoint responds with.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::metar::groups::celsius_to_fahrenheit;
use crate::metar::{CloudCover, Field, Pressure, Temperatures, Visibility, Wind};

/// A weather observation decoded from one METAR report.
///
/// Built once by [`crate::metar::parse`] and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedObservation {
    /// ICAO station identifier.
    pub station: String,
    /// Day and time token as reported (`151200Z`), not validated.
    pub observation_time: Option<String>,
    /// Wind group.
    pub wind: Wind,
    /// Prevailing visibility.
    pub visibility: Visibility,
    /// First cloud group in the report.
    pub clouds: CloudCover,
    /// Temperature and dew point in Celsius.
    pub temperatures: Temperatures,
    /// QNH or altimeter setting.
    pub pressure: Field<Pressure>,
    summary: String,
}

impl ParsedObservation {
    /// Assemble an observation from decoded groups and write its summary.
    #[must_use]
    pub fn new(
        station: String,
        observation_time: Option<String>,
        wind: Wind,
        visibility: Visibility,
        clouds: CloudCover,
        temperatures: Temperatures,
        pressure: Field<Pressure>,
    ) -> Self {
        let mut observation = Self {
            station,
            observation_time,
            wind,
            visibility,
            clouds,
            temperatures,
            pressure,
            summary: String::new(),
        };
        observation.summary = observation.compose_summary();
        observation
    }

    /// Air temperature in Celsius.
    #[must_use]
    pub fn temperature_c(&self) -> Option<i32> {
        self.temperatures.air.get()
    }

    /// Air temperature in Fahrenheit. `None` whenever Celsius is.
    #[must_use]
    pub fn temperature_f(&self) -> Option<i32> {
        self.temperature_c().map(celsius_to_fahrenheit)
    }

    /// Dew point in Celsius.
    #[must_use]
    pub fn dew_point_c(&self) -> Option<i32> {
        self.temperatures.dew_point.get()
    }

    /// Dew point in Fahrenheit. `None` whenever Celsius is.
    #[must_use]
    pub fn dew_point_f(&self) -> Option<i32> {
        self.dew_point_c().map(celsius_to_fahrenheit)
    }

    /// One-sentence description of the conditions.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Check whether none of the derived fields could be read.
    ///
    /// A sparse observation came from a report that had tokens but nothing
    /// recognisable past the station identifier.
    #[must_use]
    pub fn is_sparse(&self) -> bool {
        !self.wind.direction.is_value()
            && !self.wind.speed.is_value()
            && !self.visibility.kilometres.is_value()
            && self.clouds == CloudCover::Unknown
            && !self.temperatures.air.is_value()
            && !self.temperatures.dew_point.is_value()
            && !self.pressure.is_value()
    }

    fn compose_summary(&self) -> String {
        let winds = format!(
            "Winds from the {} at {} {}. Visibility {}.",
            self.wind.compass_label(),
            self.wind.speed().unwrap_or(0),
            self.wind.unit.spoken(),
            self.visibility.description(),
        );

        match self.temperature_f() {
            Some(f) => format!(
                "{f}°F with {}. {winds}",
                self.clouds.label().to_lowercase()
            ),
            None => format!("{}. {winds}", self.clouds.label()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireObservation<'a> {
    station: &'a str,
    observation_time: Option<&'a str>,
    wind: WireWind<'a>,
    visibility: WireVisibility<'a>,
    clouds: CloudCover,
    temperature: WireTemperature,
    dew_point: WireTemperature,
    pressure: &'a Field<Pressure>,
    summary: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireWind<'a> {
    direction: Option<u16>,
    direction_compass: &'static str,
    speed: &'a Field<u16>,
    gust: &'a Field<u16>,
    unit: crate::metar::WindUnit,
    description: &'static str,
}

#[derive(Serialize)]
struct WireVisibility<'a> {
    raw: Option<&'a str>,
    description: String,
}

#[derive(Serialize)]
struct WireTemperature {
    celsius: Option<i32>,
    fahrenheit: Option<i32>,
}

impl Serialize for ParsedObservation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let compass = self.wind.compass_label();
        WireObservation {
            station: &self.station,
            observation_time: self.observation_time.as_deref(),
            wind: WireWind {
                direction: self.wind.direction_degrees(),
                direction_compass: compass,
                speed: &self.wind.speed,
                gust: &self.wind.gust,
                unit: self.wind.unit,
                description: compass,
            },
            visibility: WireVisibility {
                raw: self.visibility.raw.as_deref(),
                description: self.visibility.description(),
            },
            clouds: self.clouds,
            temperature: WireTemperature {
                celsius: self.temperature_c(),
                fahrenheit: self.temperature_f(),
            },
            dew_point: WireTemperature {
                celsius: self.dew_point_c(),
                fahrenheit: self.dew_point_f(),
            },
            pressure: &self.pressure,
            summary: &self.summary,
        }
        .serialize(serializer)
    }
}

/// A fetched report together with its decoded observation.
///
/// This is the response body of a weather endpoint: consumers read
/// `parsed`, `summary` and `stationName`, and can show `raw` verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    /// The report line exactly as fetched.
    pub raw: String,
    /// The decoded observation.
    pub parsed: ParsedObservation,
    /// Copy of `parsed.summary` for consumers that only want the sentence.
    pub summary: String,
    /// Day and time token of the report.
    pub observation_time: Option<String>,
    /// Human-readable station name.
    #[serde(rename = "stationName")]
    pub station_name: String,
    /// When the report was fetched.
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
    /// When the source says the report was issued, if it says.
    #[serde(rename = "issuedAt", skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl WeatherReport {
    /// Wrap a decoded observation.
    #[must_use]
    pub fn new(
        raw: impl Into<String>,
        parsed: ParsedObservation,
        station_name: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let summary = parsed.summary().to_string();
        let observation_time = parsed.observation_time.clone();
        Self {
            raw: raw.into(),
            parsed,
            summary,
            observation_time,
            station_name: station_name.into(),
            fetched_at,
            issued_at: None,
        }
    }

    /// Set the issue time reported by the source.
    #[must_use]
    pub fn with_issued_at(mut self, issued_at: Option<DateTime<Utc>>) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// BLAKE3 hash of the raw report, used to spot repeats.
    #[must_use]
    pub fn raw_hash(&self) -> String {
        hash_report(&self.raw)
    }

    /// Station identifier of the decoded report.
    #[must_use]
    pub fn station(&self) -> &str {
        &self.parsed.station
    }
}

/// Compute the BLAKE3 hash of a raw report.
///
/// Surrounding whitespace does not change the hash.
#[must_use]
pub fn hash_report(raw: &str) -> String {
    blake3::hash(raw.trim().as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metar::parse;

    #[test]
    fn test_summary_with_temperature() {
        let obs = parse("MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012").unwrap();
        assert_eq!(
            obs.summary(),
            "86°F with few clouds. Winds from the E at 10 knots. Visibility 10+ km."
        );
    }

    #[test]
    fn test_summary_without_temperature() {
        let obs = parse("MKJP 151200Z 27025G40KT //// BKN010 //// A2992").unwrap();
        assert_eq!(
            obs.summary(),
            "Broken clouds. Winds from the W at 25 knots. Visibility Unknown."
        );
    }

    #[test]
    fn test_summary_defaults_speed_to_zero() {
        let obs = parse("MKJP 151200Z ///// 9999").unwrap();
        assert_eq!(
            obs.summary(),
            "Unknown. Winds from the Variable at 0 knots. Visibility 10+ km."
        );
    }

    #[test]
    fn test_summary_metres_per_second() {
        let obs = parse("UUEE 151200Z 18004MPS 9999 OVC010 M03/M05 Q1021").unwrap();
        assert_eq!(
            obs.summary(),
            "27°F with overcast. Winds from the S at 4 m/s. Visibility 10+ km."
        );
    }

    #[test]
    fn test_wire_shape() {
        let obs = parse("MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012").unwrap();
        let json = serde_json::to_value(&obs).unwrap();

        assert_eq!(json["station"], "MKJP");
        assert_eq!(json["observationTime"], "151200Z");
        assert_eq!(json["wind"]["direction"], 90);
        assert_eq!(json["wind"]["directionCompass"], "E");
        assert_eq!(json["wind"]["speed"], 10);
        assert!(json["wind"]["gust"].is_null());
        assert_eq!(json["wind"]["unit"], "KT");
        assert_eq!(json["visibility"]["raw"], "9999");
        assert_eq!(json["visibility"]["description"], "10+ km");
        assert_eq!(json["clouds"], "Few clouds");
        assert_eq!(json["temperature"]["celsius"], 30);
        assert_eq!(json["temperature"]["fahrenheit"], 86);
        assert_eq!(json["dewPoint"]["celsius"], 24);
        assert_eq!(json["dewPoint"]["fahrenheit"], 75);
        assert_eq!(json["pressure"]["value"], "1012");
        assert_eq!(json["pressure"]["unit"], "hPa");
    }

    #[test]
    fn test_wire_nulls_for_missing_groups() {
        let obs = parse("MKJP 151200Z VRB03KT //// BKN010 ////").unwrap();
        let json = serde_json::to_value(&obs).unwrap();

        assert!(json["wind"]["direction"].is_null());
        assert_eq!(json["wind"]["directionCompass"], "Variable");
        assert_eq!(json["wind"]["description"], "Variable");
        assert!(json["temperature"]["celsius"].is_null());
        assert!(json["temperature"]["fahrenheit"].is_null());
        assert!(json["dewPoint"]["fahrenheit"].is_null());
        assert!(json["pressure"].is_null());
        assert_eq!(json["visibility"]["description"], "Unknown");
    }

    #[test]
    fn test_weather_report_envelope() {
        let raw = "MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012";
        let fetched_at = Utc::now();
        let report = WeatherReport::new(raw, parse(raw).unwrap(), "Kingston", fetched_at);

        assert_eq!(report.summary, report.parsed.summary());
        assert_eq!(report.observation_time.as_deref(), Some("151200Z"));
        assert_eq!(report.station(), "MKJP");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["raw"], raw);
        assert_eq!(json["stationName"], "Kingston");
        assert_eq!(json["observation_time"], "151200Z");
        assert_eq!(json["parsed"]["wind"]["directionCompass"], "E");
        assert!(json.get("issuedAt").is_none());
    }

    #[test]
    fn test_raw_hash_ignores_surrounding_whitespace() {
        assert_eq!(hash_report("MKJP 151200Z"), hash_report("  MKJP 151200Z\n"));
        assert_ne!(hash_report("MKJP 151200Z"), hash_report("MKJP 151300Z"));
    }
}
