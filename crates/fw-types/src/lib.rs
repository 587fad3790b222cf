#![forbid(unsafe_code)]

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serialization type tag for a column or index, recorded once from the
/// first qualifying value. Documents the dominant observed type; never
/// enforced against later rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "string")]
    Utf8,
    #[serde(rename = "boolean")]
    Bool,
    #[serde(rename = "date")]
    Date,
}

/// A single cell value. `Missing` is the sentinel for absent data and is
/// skipped by alignment-sensitive operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Bool(bool),
    Number(f64),
    Utf8(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The serialization tag for this value; `None` for `Missing`.
    #[must_use]
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Missing => None,
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Number(_) => Some(ValueKind::Number),
            Self::Utf8(_) => Some(ValueKind::Utf8),
            Self::Timestamp(_) => Some(ValueKind::Date),
        }
    }

    /// Equality that treats NaN == NaN, for fixture comparison.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            _ => self == other,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Infer the serialization tag for a column from the first non-missing value.
/// A wholly-missing (or empty) column has no tag.
pub fn infer_kind<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<ValueKind> {
    values.into_iter().find_map(Value::kind)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("'{input}' is not a valid ISO-8601 timestamp")]
    InvalidTimestamp { input: String },
}

/// Canonical wire encoding for temporal values: RFC 3339 with millisecond
/// precision and a `Z` suffix, matching JavaScript `Date.toISOString()`.
#[must_use]
pub fn format_iso(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a wire timestamp back into a temporal value. Accepts any RFC 3339
/// offset and normalizes to UTC, so round-tripping preserves the instant.
pub fn parse_iso(input: &str) -> Result<DateTime<Utc>, TypeError> {
    DateTime::parse_from_rfc3339(input)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| TypeError::InvalidTimestamp {
            input: input.to_owned(),
        })
}
