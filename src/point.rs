//! Core data types for time-series points.
//!
//! - [`Point`]: A single timestamped measurement (namespace, tags, fields)
//! - [`FieldValue`]: Typed value of a field
//! - [`Tags`] / [`Fields`]: Key-ordered maps for point dimensions and values

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Indexed string dimensions attached to a point (e.g., `host`, `region`).
pub type Tags = BTreeMap<String, String>;

/// Measured values attached to a point.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single time-series point.
///
/// # Example
///
/// ```
/// use stats_collector::{FieldValue, Point};
/// use chrono::Utc;
///
/// let point = Point::new("cpu", Utc::now())
///     .with_tag("host", "a")
///     .with_field("usage", 42.5);
///
/// assert_eq!(point.fields["usage"], FieldValue::Float(42.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement name the point belongs to (e.g., "cpu", "requests").
    pub namespace: String,
    /// Indexed dimensions.
    pub tags: Tags,
    /// Measured values.
    pub fields: Fields,
    /// Caller-supplied timestamp (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Create a point with no tags or fields.
    pub fn new(namespace: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            namespace: namespace.into(),
            tags: Tags::new(),
            fields: Fields::new(),
            timestamp,
        }
    }

    /// Create a point from its four parts without copying them.
    pub fn from_parts(
        namespace: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            tags,
            fields,
            timestamp,
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Signed 64-bit integer.
    Integer(i64),
    /// Unsigned 64-bit integer.
    UInteger(u64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInteger(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInteger(u64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// A JSON value that cannot be stored as a field.
#[derive(Debug, Error)]
#[error("unsupported field value: {0}")]
pub struct UnsupportedFieldValue(pub serde_json::Value);

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = UnsupportedFieldValue;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(Self::Boolean(b)),
            Value::String(s) => Ok(Self::String(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::UInteger(u))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(UnsupportedFieldValue(Value::Number(n)))
                }
            }
            other => Err(UnsupportedFieldValue(other)),
        }
    }
}
