//! Wind group decoding and compass labels.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::trace;

use super::field::{is_missing_marker, Field};

/// `DDDSS(GSS)(KT|MPS)` with `VRB` allowed in place of the direction.
static WIND_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3}|VRB)(\d{2,3})(?:G(\d{2,3}))?(KT|MPS)?$").expect("valid wind pattern")
});

/// The 16-point compass, clockwise from north.
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Label used when the wind has no fixed direction.
pub const VARIABLE_LABEL: &str = "Variable";

/// Highest direction a wind group may report.
const MAX_DIRECTION: u16 = 360;

/// Where the wind is blowing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindDirection {
    /// A fixed direction in degrees true.
    Degrees(u16),
    /// `VRB`: the direction varies.
    Variable,
}

impl WindDirection {
    /// Get the direction in degrees, `None` when variable.
    #[must_use]
    pub fn degrees(self) -> Option<u16> {
        match self {
            Self::Degrees(d) => Some(d),
            Self::Variable => None,
        }
    }
}

/// Unit a wind group reports its speeds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindUnit {
    /// Knots (`KT`). Assumed when the group carries no unit.
    #[default]
    Knots,
    /// Metres per second (`MPS`).
    MetersPerSecond,
}

impl WindUnit {
    /// The METAR suffix for this unit.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Knots => "KT",
            Self::MetersPerSecond => "MPS",
        }
    }

    /// The unit as written in prose.
    #[must_use]
    pub fn spoken(self) -> &'static str {
        match self {
            Self::Knots => "knots",
            Self::MetersPerSecond => "m/s",
        }
    }
}

impl std::fmt::Display for WindUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for WindUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A decoded wind group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wind {
    /// Direction the wind blows from.
    pub direction: Field<WindDirection>,
    /// Sustained speed.
    pub speed: Field<u16>,
    /// Gust speed. `Missing` when the group has no `G` segment.
    pub gust: Field<u16>,
    /// Unit of `speed` and `gust`.
    pub unit: WindUnit,
}

impl Wind {
    /// Direction in degrees, `None` when variable or unreadable.
    #[must_use]
    pub fn direction_degrees(&self) -> Option<u16> {
        self.direction.get().and_then(WindDirection::degrees)
    }

    /// The 16-point compass label, or `"Variable"` without a fixed direction.
    #[must_use]
    pub fn compass_label(&self) -> &'static str {
        self.direction_degrees()
            .map_or(VARIABLE_LABEL, compass_label)
    }

    /// Sustained speed, if it parsed.
    #[must_use]
    pub fn speed(&self) -> Option<u16> {
        self.speed.get()
    }

    /// Gust speed, if the group carried one.
    #[must_use]
    pub fn gust(&self) -> Option<u16> {
        self.gust.get()
    }
}

/// Map a direction in degrees to its 16-point compass label.
///
/// Each label covers 22.5 degrees centred on its bearing, so 349 through 11
/// are all `N`, and 360 wraps back to `N`.
#[must_use]
pub fn compass_label(degrees: u16) -> &'static str {
    // 22.5 = 45 / 2, so index = round(2 * degrees / 45) without floats.
    let index = (u32::from(degrees) * 2 + 22) / 45;
    COMPASS_POINTS[(index % 16) as usize]
}

/// Decode the wind group token.
///
/// A token that does not look like a wind group leaves every subfield
/// unreadable; `None` or a slashed token means the group is missing.
#[must_use]
pub fn parse_wind(token: Option<&str>) -> Wind {
    let Some(token) = token else {
        return Wind::default();
    };

    if is_missing_marker(token.trim_end_matches("KT").trim_end_matches("MPS")) {
        trace!(token, "wind group not reported");
        return Wind::default();
    }

    let Some(caps) = WIND_GROUP.captures(token) else {
        trace!(token, "unrecognised wind group");
        return Wind {
            direction: Field::malformed(token),
            speed: Field::malformed(token),
            gust: Field::Missing,
            unit: WindUnit::default(),
        };
    };

    let direction = match &caps[1] {
        "VRB" => Field::Value(WindDirection::Variable),
        digits => match digits.parse::<u16>() {
            Ok(d) if d <= MAX_DIRECTION => Field::Value(WindDirection::Degrees(d)),
            _ => Field::malformed(digits),
        },
    };

    let speed = parse_speed(&caps[2]);
    let gust = caps.get(3).map_or(Field::Missing, |g| parse_speed(g.as_str()));

    let unit = match caps.get(4).map(|m| m.as_str()) {
        Some("MPS") => WindUnit::MetersPerSecond,
        _ => WindUnit::Knots,
    };

    Wind {
        direction,
        speed,
        gust,
        unit,
    }
}

fn parse_speed(digits: &str) -> Field<u16> {
    digits
        .parse::<u16>()
        .map_or_else(|_| Field::malformed(digits), Field::Value)
}
