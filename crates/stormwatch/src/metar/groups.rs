//! Sky, temperature, pressure and visibility groups.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::trace;

use super::field::{is_missing_marker, Field};

/// `TT/DD` where either side may be negative (`M`), slashed, or absent.
///
/// Sides are matched loosely so a garbled group (`3O/24`) is still found and
/// reported as malformed instead of being skipped.
static TEMPERATURE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(M?[0-9A-Z]{1,3}|/{1,3})/(M?[0-9A-Z]{1,3}|/{1,3})?$")
        .expect("valid temperature pattern")
});

/// Suffix of fractional visibility groups (`1/2SM`).
const STATUTE_MILES: &str = "SM";

/// `Qpppp` (hectopascals) or `Apppp` (hundredths of inches of mercury).
static PRESSURE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([QA])(\d{3,4}|/{3,4})$").expect("valid pressure pattern"));

/// Visibility token meaning 10 km or more.
const UNLIMITED_VISIBILITY: &str = "9999";

/// Ceiling and visibility OK: visibility 10 km or more, no significant cloud.
const CAVOK: &str = "CAVOK";

// === Clouds ===

/// Sky cover, as the first cloud group of the report describes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CloudCover {
    /// `FEW`: 1 to 2 oktas.
    Few,
    /// `SCT`: 3 to 4 oktas.
    Scattered,
    /// `BKN`: 5 to 7 oktas.
    Broken,
    /// `OVC`: 8 oktas.
    Overcast,
    /// `CLR`: no cloud below 12,000 ft (automated stations).
    Clear,
    /// `SKC`: sky clear.
    SkyClear,
    /// No cloud group found.
    #[default]
    Unknown,
}

impl CloudCover {
    const CODES: [(&'static str, Self); 6] = [
        ("FEW", Self::Few),
        ("SCT", Self::Scattered),
        ("BKN", Self::Broken),
        ("OVC", Self::Overcast),
        ("CLR", Self::Clear),
        ("SKC", Self::SkyClear),
    ];

    /// Match a token by its cloud-code prefix.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::CODES
            .iter()
            .find(|(code, _)| token.starts_with(code))
            .map(|(_, cover)| *cover)
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Few => "Few clouds",
            Self::Scattered => "Scattered clouds",
            Self::Broken => "Broken clouds",
            Self::Overcast => "Overcast",
            Self::Clear => "Clear",
            Self::SkyClear => "Sky clear",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for CloudCover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for CloudCover {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Find the first cloud group in token order.
#[must_use]
pub fn parse_clouds(tokens: &[&str]) -> CloudCover {
    tokens
        .iter()
        .find_map(|t| CloudCover::from_token(t))
        .unwrap_or_default()
}

// === Temperature ===

/// Air temperature and dew point in whole degrees Celsius.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Temperatures {
    /// Air temperature.
    pub air: Field<i32>,
    /// Dew point.
    pub dew_point: Field<i32>,
}

/// Convert Celsius to Fahrenheit, rounded to the nearest degree.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32
}

/// Find and decode the temperature/dew point group.
///
/// Candidates contain `/`, no `Q`, and are not entirely slashes. A report
/// without such a group has both values missing.
#[must_use]
pub fn parse_temperatures(tokens: &[&str]) -> Temperatures {
    let Some(token) = tokens.iter().copied().find(|t| is_temperature_candidate(t)) else {
        return Temperatures::default();
    };

    let (air, dew_point) = token.split_once('/').unwrap_or((token, ""));
    Temperatures {
        air: parse_celsius(air),
        dew_point: parse_celsius(dew_point),
    }
}

fn is_temperature_candidate(token: &str) -> bool {
    token.contains('/')
        && !token.contains('Q')
        && !token.ends_with(STATUTE_MILES)
        && token.chars().any(|c| c.is_ascii_digit())
        && !is_missing_marker(token)
        && TEMPERATURE_GROUP.is_match(token)
}

fn parse_celsius(side: &str) -> Field<i32> {
    if side.is_empty() || is_missing_marker(side) {
        return Field::Missing;
    }

    let signed = side
        .strip_prefix('M')
        .map_or_else(|| side.to_string(), |rest| format!("-{rest}"));

    if signed.contains('/') {
        return Field::malformed(side);
    }

    signed.parse::<i32>().map_or_else(
        |_| {
            trace!(side, "unreadable temperature");
            Field::malformed(side)
        },
        Field::Value,
    )
}

// === Pressure ===

/// Unit of a pressure reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    /// Hectopascals (`Q` groups).
    Hectopascals,
    /// Inches of mercury, in hundredths (`A` groups).
    InchesOfMercury,
}

impl PressureUnit {
    /// Unit label used on the wire.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hectopascals => "hPa",
            Self::InchesOfMercury => "inHg",
        }
    }
}

impl Serialize for PressureUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Altimeter setting or QNH as written in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pressure {
    /// Digits of the group without its letter (`"1012"`, `"2992"`).
    pub value: String,
    /// Unit of `value`.
    pub unit: PressureUnit,
}

impl Pressure {
    /// The reading in its natural unit: hPa, or inches of mercury.
    #[must_use]
    pub fn reading(&self) -> Option<f64> {
        let raw: f64 = self.value.parse().ok()?;
        Some(match self.unit {
            PressureUnit::Hectopascals => raw,
            PressureUnit::InchesOfMercury => raw / 100.0,
        })
    }
}

/// Find the first `Q`/`A` pressure group.
#[must_use]
pub fn parse_pressure(tokens: &[&str]) -> Field<Pressure> {
    let Some(caps) = tokens
        .iter()
        .filter(|t| t.len() > 2)
        .find_map(|t| PRESSURE_GROUP.captures(t))
    else {
        return Field::Missing;
    };

    let body = &caps[2];
    if is_missing_marker(body) {
        return Field::Missing;
    }

    let unit = if &caps[1] == "Q" {
        PressureUnit::Hectopascals
    } else {
        PressureUnit::InchesOfMercury
    };

    Field::Value(Pressure {
        value: body.to_string(),
        unit,
    })
}

// === Visibility ===

/// Prevailing visibility.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Visibility {
    /// The visibility token as reported, if the report had one.
    pub raw: Option<String>,
    /// Visibility in kilometres.
    pub kilometres: Field<f64>,
    /// Whether the report says 10 km or more.
    pub unlimited: bool,
}

impl Visibility {
    /// `"10+ km"`, `"<n> km"`, or `"Unknown"`.
    #[must_use]
    pub fn description(&self) -> String {
        if self.unlimited {
            return "10+ km".to_string();
        }
        match self.kilometres.get() {
            Some(km) => format!("{km} km"),
            None => "Unknown".to_string(),
        }
    }
}

/// Decode the visibility token.
#[must_use]
pub fn parse_visibility(token: Option<&str>) -> Visibility {
    let Some(token) = token else {
        return Visibility::default();
    };
    let raw = Some(token.to_string());

    if token.contains('/') {
        return Visibility {
            raw,
            kilometres: Field::Missing,
            unlimited: false,
        };
    }

    if token == UNLIMITED_VISIBILITY || token == CAVOK {
        return Visibility {
            raw,
            kilometres: Field::Value(10.0),
            unlimited: true,
        };
    }

    let kilometres = if token.bytes().all(|b| b.is_ascii_digit()) {
        token
            .parse::<u32>()
            .map_or_else(|_| Field::malformed(token), |m| Field::Value(f64::from(m) / 1000.0))
    } else {
        trace!(token, "unrecognised visibility group");
        Field::malformed(token)
    };

    Visibility {
        raw,
        kilometres,
        unlimited: false,
    }
}
