//! The closed set of field coercions.
//!
//! `decode` runs on values read from a record before they reach an entity
//! field, `encode` on values read from an entity before they go into a
//! record. `null` passes through both untouched.

use crate::Result;

use datamap_core::{schema::Coercion, Error, Value};

use jiff::{civil, tz::TimeZone, Timestamp};

/// Civil layouts tried, in order, after RFC 3339. They carry no offset and
/// are read as UTC.
const CIVIL_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Converts a record value into the shape an entity field expects.
pub fn decode(coercion: Coercion, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }

    match coercion {
        Coercion::Default => Ok(value),
        Coercion::Timestamp => timestamp(value).map(Value::Timestamp),
        Coercion::Structured => structured(value),
    }
}

/// Converts an entity field value into its record representation.
pub fn encode(coercion: Coercion, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }

    match coercion {
        Coercion::Default => Ok(value),
        Coercion::Timestamp => timestamp(value).map(|ts| Value::String(ts.to_string())),
        Coercion::Structured => serde_json::to_string(&value.to_json())
            .map(Value::String)
            .map_err(|err| Error::type_coercion_detail(value.kind(), "structured text", err)),
    }
}

/// Interprets a native timestamp, an ISO-8601 family string or integer
/// epoch seconds as an instant.
pub fn timestamp(value: Value) -> Result<Timestamp> {
    match value {
        Value::Timestamp(ts) => Ok(ts),
        Value::String(text) => parse_timestamp(&text),
        Value::I64(secs) => from_epoch(secs, "I64"),
        Value::U64(secs) => i64::try_from(secs)
            .map_err(|_| Error::type_coercion_detail("U64", "timestamp", "out of range"))
            .and_then(|secs| from_epoch(secs, "U64")),
        Value::F64(secs) if secs.fract() == 0.0 => from_epoch(secs as i64, "F64"),
        value => Err(Error::type_coercion(value.kind(), "timestamp")),
    }
}

/// Parses a timestamp string, first match wins: RFC 3339 (fractional
/// seconds allowed), `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and
/// `YYYY-MM-DD`.
pub fn parse_timestamp(text: &str) -> Result<Timestamp> {
    let text = text.trim();

    if let Ok(ts) = text.parse::<Timestamp>() {
        return Ok(ts);
    }

    for layout in CIVIL_LAYOUTS {
        if let Ok(datetime) = civil::DateTime::strptime(layout, text) {
            return utc(datetime);
        }
    }

    if let Ok(date) = civil::Date::strptime(DATE_LAYOUT, text) {
        return utc(date.to_datetime(civil::Time::midnight()));
    }

    Err(Error::type_coercion_detail(
        "String",
        "timestamp",
        format!("unrecognized layout `{text}`"),
    ))
}

fn utc(datetime: civil::DateTime) -> Result<Timestamp> {
    datetime
        .to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp())
        .map_err(|err| Error::type_coercion_detail("String", "timestamp", err))
}

fn from_epoch(secs: i64, kind: &'static str) -> Result<Timestamp> {
    Timestamp::from_second(secs).map_err(|err| Error::type_coercion_detail(kind, "timestamp", err))
}

fn structured(value: Value) -> Result<Value> {
    let parsed = match value {
        Value::String(text) => serde_json::from_str::<serde_json::Value>(&text)
            .map_err(|err| Error::type_coercion_detail("String", "structured", err))?,
        Value::Bytes(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes)
            .map_err(|err| Error::type_coercion_detail("Bytes", "structured", err))?,
        Value::Record(_) | Value::List(_) => return Ok(value),
        value => return Err(Error::type_coercion(value.kind(), "structured")),
    };

    Ok(Value::from(parsed))
}
