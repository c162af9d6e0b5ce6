//! Mapping from [`Point`] to InfluxDB line protocol.
//!
//! Lines are built by [`influxlp_tools::LineProtocol`]. Points that would
//! produce an ambiguous line are rejected here so a batch never carries them.

use chrono::{DateTime, Utc};
use influxlp_tools::LineProtocol;

use crate::client::ClientError;
use crate::config::Precision;
use crate::point::{FieldValue, Point};

/// Build the line-protocol representation of a single point.
///
/// Tags with an empty key or value are omitted.
///
/// # Errors
/// Returns `ClientError::Encode` if the point has no fields, an empty
/// namespace or field key, a name or tag containing a line break or ending
/// in a backslash, a non-finite float, or an unrepresentable timestamp.
pub fn to_line_protocol(
    point: &Point,
    precision: Precision,
) -> Result<LineProtocol, ClientError> {
    check_name("namespace", &point.namespace)?;
    if point.fields.is_empty() {
        return Err(ClientError::Encode(format!(
            "point '{}' has no fields",
            point.namespace
        )));
    }

    let mut line = LineProtocol::new(point.namespace.as_str());

    for (key, value) in &point.tags {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        check_name("tag key", key)?;
        check_name("tag value", value)?;
        line = line.add_tag(key.as_str(), value.as_str());
    }

    for (key, value) in &point.fields {
        check_name("field key", key)?;
        line = match value {
            FieldValue::Float(f) if !f.is_finite() => {
                return Err(ClientError::Encode(format!(
                    "field '{key}' is not a finite number"
                )));
            }
            FieldValue::Float(f) => line.add_field(key.as_str(), *f),
            FieldValue::Integer(i) => line.add_field(key.as_str(), *i),
            FieldValue::UInteger(u) => line.add_field(key.as_str(), *u),
            FieldValue::Boolean(b) => line.add_field(key.as_str(), *b),
            FieldValue::String(s) => line.add_field(key.as_str(), s.as_str()),
        };
    }

    Ok(line.with_timestamp(timestamp(&point.timestamp, precision)?))
}

/// Encode a single point as one line (without trailing newline).
pub fn encode_point(point: &Point, precision: Precision) -> Result<String, ClientError> {
    to_line_protocol(point, precision)?
        .build()
        .map_err(|e| ClientError::Encode(e.to_string()))
}

/// Encode a batch of points, skipping (and reporting) points that fail to encode.
///
/// Returns the newline-separated body and the list of per-point errors.
pub fn encode_batch(points: &[Point], precision: Precision) -> (String, Vec<ClientError>) {
    let mut lines = Vec::with_capacity(points.len());
    let mut errors = Vec::new();

    for point in points {
        match encode_point(point, precision) {
            Ok(line) => lines.push(line),
            Err(e) => errors.push(e),
        }
    }

    (lines.join("\n"), errors)
}

// Line breaks end a line and a trailing backslash escapes the next separator.
fn check_name(what: &str, s: &str) -> Result<(), ClientError> {
    if s.is_empty() {
        return Err(ClientError::Encode(format!("empty {what}")));
    }
    if s.contains(['\n', '\r']) {
        return Err(ClientError::Encode(format!(
            "{what} '{}' contains a line break",
            s.escape_debug()
        )));
    }
    if s.ends_with('\\') {
        return Err(ClientError::Encode(format!("{what} '{s}' ends with a backslash")));
    }
    Ok(())
}

fn timestamp(ts: &DateTime<Utc>, precision: Precision) -> Result<i64, ClientError> {
    match precision {
        Precision::Ns => ts
            .timestamp_nanos_opt()
            .ok_or_else(|| ClientError::Encode(format!("timestamp out of range: {ts}"))),
        Precision::Us => Ok(ts.timestamp_micros()),
        Precision::Ms => Ok(ts.timestamp_millis()),
        Precision::S => Ok(ts.timestamp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap()
    }

    fn assert_rejected(point: &Point, needle: &str) {
        match encode_point(point, Precision::S) {
            Err(ClientError::Encode(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {msg}")
            }
            other => panic!("expected encode error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_basic_point() {
        let point = Point::new("cpu", t0())
            .with_tag("host", "a")
            .with_field("usage", 42.5);

        assert_eq!(
            encode_point(&point, Precision::Ns).unwrap(),
            "cpu,host=a usage=42.5 1700000000123456789"
        );
    }

    #[test]
    fn test_encode_integer_suffixes() {
        let signed = Point::new("m", t0()).with_field("i", -2_i64);
        assert_eq!(encode_point(&signed, Precision::S).unwrap(), "m i=-2i 1700000000");

        let unsigned = Point::new("m", t0()).with_field("u", 3_u64);
        assert_eq!(encode_point(&unsigned, Precision::S).unwrap(), "m u=3u 1700000000");
    }

    #[test]
    fn test_encode_precision() {
        let point = Point::new("m", t0()).with_field("v", 1_i64);
        let ms = encode_point(&point, Precision::Ms).unwrap();
        assert!(ms.ends_with(" 1700000000123"), "{ms}");
        let us = encode_point(&point, Precision::Us).unwrap();
        assert!(us.ends_with(" 1700000000123456"), "{us}");
    }

    #[test]
    fn test_encode_skips_empty_tags() {
        let point = Point::new("cpu", t0())
            .with_tag("host", "")
            .with_tag("", "orphan")
            .with_tag("region", "us")
            .with_field("v", 1_i64);

        assert_eq!(
            encode_point(&point, Precision::Us).unwrap(),
            "cpu,region=us v=1i 1700000000123456"
        );
    }

    #[test]
    fn test_encode_rejects_missing_parts() {
        assert_rejected(&Point::new("cpu", t0()).with_tag("host", "a"), "no fields");
        assert_rejected(&Point::new("", t0()).with_field("v", 1.0), "empty namespace");
        assert_rejected(&Point::new("cpu", t0()).with_field("", 1_i64), "empty field key");
        assert_rejected(
            &Point::new("cpu", t0()).with_field("v", f64::NAN),
            "not a finite number",
        );
    }

    #[test]
    fn test_encode_rejects_line_breaks() {
        let in_tag = Point::new("cpu", t0())
            .with_tag("host", "web\n01")
            .with_field("v", 2_i64);
        assert_rejected(&in_tag, "line break");

        let in_namespace = Point::new("cpu\r", t0()).with_field("v", 1_i64);
        assert_rejected(&in_namespace, "line break");

        let in_field_key = Point::new("cpu", t0()).with_field("a\nb", 1_i64);
        assert_rejected(&in_field_key, "line break");
    }

    #[test]
    fn test_encode_rejects_trailing_backslash() {
        let point = Point::new("cpu", t0())
            .with_tag("path", "C:\\")
            .with_field("v", 1_i64);
        assert_rejected(&point, "ends with a backslash");
    }

    #[test]
    fn test_encode_batch_skips_bad_points() {
        let points = vec![
            Point::new("a", t0()).with_field("v", 1_i64),
            Point::new("cpu", t0())
                .with_tag("host", "web\n01")
                .with_field("v", 2_i64),
            Point::new("bad", t0()),
            Point::new("b", t0()).with_field("v", 3_i64),
        ];

        let (body, errors) = encode_batch(&points, Precision::S);
        assert_eq!(body, "a v=1i 1700000000\nb v=3i 1700000000");
        assert_eq!(errors.len(), 2);
    }
}
