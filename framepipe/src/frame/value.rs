//! Field values carried by frames.

use super::Frame;
use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Field present with no value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integral number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text value.
    String(String),
    /// Point in time.
    Date(DateTime<Utc>),
    /// Nested frame.
    Frame(Frame),
}

impl Value {
    /// Returns true if the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for null values and strings that are blank after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns the string slice if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested frame if this is a frame value.
    #[must_use]
    pub const fn as_frame(&self) -> Option<&Frame> {
        match self {
            Self::Frame(f) => Some(f),
            _ => None,
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Strings `true`/`yes`/`1` (any case) are true, numbers are true when
    /// non-zero.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Integer(i) => Some(*i != 0),
            Self::Float(f) => Some(*f != 0.0),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interprets the value as a number.
    ///
    /// Dates convert to epoch milliseconds and numeric strings are parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            Self::Date(d) => Some(d.timestamp_millis() as f64),
            Self::Bool(_) | Self::Null | Self::Frame(_) => None,
        }
    }

    /// Returns the textual form of the value; null renders as an empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Returns a short type name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Frame(_) => "frame",
        }
    }

    /// Compares two values the way field comparisons do.
    ///
    /// Numbers (and numeric strings) compare numerically, a date against a
    /// number compares as epoch milliseconds, a date against a string parses
    /// the string as an RFC 3339 timestamp, and anything else compares by its
    /// textual form. Returns `None` when either side is null.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        match (self, other) {
            (Self::Date(a), Self::String(s)) => Some(match parse_date(s) {
                Some(b) => a.cmp(&b),
                None => self.to_text().cmp(s),
            }),
            (Self::String(s), Self::Date(b)) => Some(match parse_date(s) {
                Some(a) => a.cmp(b),
                None => s.as_str().cmp(other.to_text().as_str()),
            }),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => Some(self.to_text().cmp(&other.to_text())),
            },
        }
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::json!(b),
            Self::Integer(i) => serde_json::json!(i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::json!(s),
            Self::Date(d) => serde_json::json!(d.to_rfc3339()),
            Self::Frame(f) => f.to_json(),
        }
    }

    /// Builds a value from JSON. Objects and arrays become nested frames.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Integer),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Self::Frame(Frame::from_json(value))
            }
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Builds a UTC date from epoch milliseconds.
#[must_use]
pub fn date_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Frame(frame) => write!(f, "{frame}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or(Self::Float(i as f64), Self::Integer)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Frame> for Value {
    fn from(f: Frame) -> Self {
        Self::Frame(f)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(!Value::from(" x ").is_blank());
        assert!(!Value::Integer(0).is_blank());
    }

    #[test]
    fn test_numeric_comparison_of_strings() {
        let ten = Value::from("10");
        let nine = Value::from("9");
        assert_eq!(ten.compare(&nine), Some(Ordering::Greater));
        assert_eq!(Value::Integer(2).compare(&Value::Float(2.0)), Some(Ordering::Equal));
    }

    #[test]
    fn test_text_comparison_fallback() {
        let a = Value::from("apple");
        let b = Value::from("banana");
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn test_null_is_incomparable() {
        assert_eq!(Value::Null.compare(&Value::Integer(1)), None);
        assert_eq!(Value::Integer(1).compare(&Value::Null), None);
    }

    #[test]
    fn test_date_compares_as_epoch_millis() {
        let date = date_from_millis(1_000).unwrap();
        let value = Value::Date(date);
        assert_eq!(value.compare(&Value::Integer(999)), Some(Ordering::Greater));
        assert_eq!(value.compare(&Value::Integer(1_000)), Some(Ordering::Equal));
    }

    #[test]
    fn test_date_compares_with_timestamp_string() {
        let value = Value::Date(date_from_millis(0).unwrap());
        let later = Value::from("1970-01-02T00:00:00Z");
        assert_eq!(value.compare(&later), Some(Ordering::Less));
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"a": 1, "b": [true, "x"], "c": 1.5});
        let value = Value::from_json(&json);
        let frame = value.as_frame().unwrap();

        assert_eq!(frame.get("a"), Some(&Value::Integer(1)));
        assert_eq!(frame.get("c"), Some(&Value::Float(1.5)));
        assert!(frame.get("b").and_then(Value::as_frame).unwrap().is_array_biased());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(Value::from("YES").as_bool(), Some(true));
        assert_eq!(Value::Integer(0).as_bool(), Some(false));
        assert_eq!(Value::from("maybe").as_bool(), None);
    }
}
