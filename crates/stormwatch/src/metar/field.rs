//! Per-field extraction results.
//!
//! Every group the parser extracts is reported as a [`Field`], which keeps
//! "the report did not carry this group" apart from "the report carried it
//! but it could not be read". Both collapse to JSON `null` on the wire.

use serde::{Serialize, Serializer};

/// The outcome of extracting one field from a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// The field was present and parsed.
    Value(T),
    /// The group is absent, or only carries the `//` missing-data marker.
    Missing,
    /// The group was present but could not be parsed. Holds the raw text.
    Malformed(String),
}

impl<T> Field<T> {
    /// Build a malformed field from the offending text.
    #[must_use]
    pub fn malformed(raw: impl Into<String>) -> Self {
        Self::Malformed(raw.into())
    }

    /// Get the parsed value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Malformed(_) => None,
        }
    }

    /// Consume the field, returning the parsed value if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Malformed(_) => None,
        }
    }

    /// Check if the field parsed.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Check if the field is absent from the report.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Check if the field was present but unreadable.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Map the parsed value, keeping `Missing` and `Malformed` as they are.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Value(v) => Field::Value(f(v)),
            Self::Missing => Field::Missing,
            Self::Malformed(raw) => Field::Malformed(raw),
        }
    }
}

impl<T: Copy> Field<T> {
    /// Get a copy of the parsed value, if any.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Missing | Self::Malformed(_) => serializer.serialize_none(),
        }
    }
}

/// Check whether a token is made up only of the `/` missing-data marker.
#[must_use]
pub fn is_missing_marker(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c == '/')
}
