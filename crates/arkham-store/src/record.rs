//! Log records
//!
//! A record is an opaque JSON object whose shape depends on its category.
//! The only field the store itself interprets is `timestamp`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field used for recency ordering and expiry
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// One event entry within a category
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(Map<String, Value>);

/// State of a record's `timestamp` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTime {
    /// No usable field: absent, null or empty
    Missing,
    /// Parsed instant
    At(DateTime<Utc>),
    /// Present but not a recognizable timestamp
    Invalid,
}

impl LogRecord {
    /// Create an empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing JSON object
    #[inline]
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convert a JSON value, returning it unchanged if it is not an object
    pub fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }

    /// Builder-style field setter
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Raw field value
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Field value if it is a string
    #[inline]
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Lower-cased string field, treating an empty string as absent
    #[must_use]
    pub fn lowercase_field(&self, name: &str) -> Option<String> {
        self.str_field(name)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Human-readable rendering of a field.
    ///
    /// Strings render as-is, arrays are comma-joined and absent or null
    /// fields render empty.
    #[must_use]
    pub fn display_field(&self, name: &str) -> String {
        self.0.get(name).map(display_value).unwrap_or_default()
    }

    /// Interpret the `timestamp` field
    #[must_use]
    pub fn time(&self) -> RecordTime {
        match self.0.get(TIMESTAMP_FIELD) {
            None | Some(Value::Null) => RecordTime::Missing,
            Some(Value::String(s)) if s.is_empty() => RecordTime::Missing,
            Some(Value::String(s)) => {
                parse_timestamp(s).map_or(RecordTime::Invalid, RecordTime::At)
            }
            Some(_) => RecordTime::Invalid,
        }
    }

    /// Parsed timestamp, if present and valid
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.time() {
            RecordTime::At(at) => Some(at),
            RecordTime::Missing | RecordTime::Invalid => None,
        }
    }

    /// Iterate over fields
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the record has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the underlying JSON object
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Render a JSON value for display
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Parse an ISO-8601 timestamp into an absolute instant.
///
/// Accepts RFC 3339, the backend's `+00:00Z` double suffix, and offset-less
/// date-times (read as UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Some(stripped) = raw.strip_suffix('Z') {
        if let Ok(at) = DateTime::parse_from_rfc3339(stripped) {
            return Some(at.with_timezone(&Utc));
        }
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
