// Hey Loyalty Client - Rust client for the Hey Loyalty API
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Field mediation between API wire values and native values
//!
//! Conversion is dispatched purely on the field's declared [`FieldFormat`]:
//!
//! | format     | wire (read)                  | native                 | wire (write)       |
//! |------------|------------------------------|------------------------|--------------------|
//! | `boolean`  | any JSON value               | `Boolean` (truthiness) | `"1"` / `"0"`      |
//! | `text`     | string                       | `Text`                 | string             |
//! | `password` | ignored                      | `Absent`               | string             |
//! | `date`     | `YYYY-MM-DD[ HH:MM:SS]`      | `Timestamp` (UTC)      | `YYYY-MM-DD`       |
//! | `number`   | string / number              | `Integer`              | decimal string     |
//! | `choice`   | `{"id": ..}`                 | `Choice`               | decimal string     |
//! | `multi`    | `[{"id": ..}, ..]`           | `Multi`                | repeated `name[]`  |
//!
//! The zero dates `0000-00-00` and `0000-00-00 00:00:00` read as `Absent`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{HeyLoyaltyError, Result};
use crate::models::{FieldFormat, FieldValue};

const ZERO_DATE: &str = "0000-00-00";
const ZERO_DATE_TIME: &str = "0000-00-00 00:00:00";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A field value ready to be written to a form body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Written as an empty value
    Absent,
    Scalar(String),
    /// Written as one `name[]` pair per element
    List(Vec<String>),
}

impl WireValue {
    /// Append this value to a list of form pairs under the given field name
    pub fn append_to(&self, name: &str, pairs: &mut Vec<(String, String)>) {
        match self {
            Self::Absent => pairs.push((name.to_string(), String::new())),
            Self::Scalar(value) => pairs.push((name.to_string(), value.clone())),
            Self::List(values) => {
                let key = format!("{name}[]");
                pairs.extend(values.iter().map(|v| (key.clone(), v.clone())));
            }
        }
    }
}

/// Parse a field value obtained from the API into a native value
pub fn parse_value(format: FieldFormat, value: &Value) -> Result<FieldValue> {
    match format {
        FieldFormat::Boolean => Ok(FieldValue::Boolean(is_truthy(value))),

        FieldFormat::Text => Ok(match value {
            Value::Null => FieldValue::Absent,
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(scalar_to_string(other)),
        }),

        // never round-tripped from the server
        FieldFormat::Password => Ok(FieldValue::Absent),

        FieldFormat::Date => match value {
            Value::Null => Ok(FieldValue::Absent),
            Value::String(s) => Ok(parse_date_time(s)?.map_or(FieldValue::Absent, FieldValue::Timestamp)),
            other => Err(HeyLoyaltyError::InvalidDate(other.to_string())),
        },

        FieldFormat::Number => Ok(FieldValue::Integer(coerce_int(value))),

        FieldFormat::Choice => Ok(value
            .get("id")
            .and_then(option_id)
            .map_or(FieldValue::Absent, FieldValue::Choice)),

        FieldFormat::Multi => {
            let ids = match value {
                Value::Array(options) => options
                    .iter()
                    .filter_map(|option| option.get("id").and_then(option_id))
                    .collect(),
                Value::Object(options) => options
                    .values()
                    .filter_map(|option| option.get("id").and_then(option_id))
                    .collect(),
                _ => Vec::new(),
            };
            Ok(FieldValue::Multi(ids))
        }
    }
}

/// Format a native value for writing to a field of the given format
pub fn format_value(format: FieldFormat, value: &FieldValue) -> Result<WireValue> {
    let mismatch = || HeyLoyaltyError::InvalidFieldValue {
        format: format.as_str().to_string(),
        value: format!("{value:?}"),
    };

    match format {
        FieldFormat::Boolean => Ok(WireValue::Scalar(if value.is_truthy() { "1" } else { "0" }.to_string())),

        FieldFormat::Text | FieldFormat::Password => match value {
            FieldValue::Multi(_) => Err(mismatch()),
            other => Ok(WireValue::Scalar(other.to_string())),
        },

        FieldFormat::Date => match value {
            FieldValue::Absent => Ok(WireValue::Absent),
            FieldValue::Timestamp(ts) | FieldValue::Integer(ts) => {
                Ok(format_date_time(*ts).map_or(WireValue::Absent, WireValue::Scalar))
            }
            _ => Err(mismatch()),
        },

        FieldFormat::Number | FieldFormat::Choice => match value {
            FieldValue::Multi(_) => Err(mismatch()),
            other => Ok(WireValue::Scalar(other.to_string())),
        },

        FieldFormat::Multi => match value {
            FieldValue::Absent => Ok(WireValue::List(Vec::new())),
            FieldValue::Multi(ids) => Ok(WireValue::List(ids.iter().map(|id| id.to_string()).collect())),
            FieldValue::Choice(id) | FieldValue::Integer(id) => Ok(WireValue::List(vec![id.to_string()])),
            _ => Err(mismatch()),
        },
    }
}

/// Parse an API date or date-time string as a UNIX timestamp (UTC)
///
/// Returns `Ok(None)` for the zero dates and for an empty string.
pub fn parse_date_time(value: &str) -> Result<Option<i64>> {
    if value.is_empty() || value == ZERO_DATE || value == ZERO_DATE_TIME {
        return Ok(None);
    }

    let invalid = || HeyLoyaltyError::InvalidDate(value.to_string());

    let timestamp = if value.len() == 10 {
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|_| invalid())?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(invalid)?
            .and_utc()
            .timestamp()
    } else {
        NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
            .map_err(|_| invalid())?
            .and_utc()
            .timestamp()
    };

    Ok(Some(timestamp))
}

/// Format a UNIX timestamp as an API date; zero means no date
pub fn format_date_time(timestamp: i64) -> Option<String> {
    if timestamp == 0 {
        return None;
    }
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format(DATE_FORMAT).to_string())
}

/// Convert a schema fallback value, tolerating bare option ids
///
/// Fallbacks are informational, so anything unparsable becomes `Absent`.
pub(crate) fn parse_fallback(format: FieldFormat, value: &Value) -> FieldValue {
    let parsed = match (format, value) {
        (_, Value::Null) => Ok(FieldValue::Absent),
        (FieldFormat::Choice, v) if !v.is_object() => Ok(option_id(v).map_or(FieldValue::Absent, FieldValue::Choice)),
        (FieldFormat::Multi, Value::Array(items)) if items.iter().all(|v| !v.is_object()) => {
            Ok(FieldValue::Multi(items.iter().filter_map(option_id).collect()))
        }
        (format, v) => parse_value(format, v),
    };

    parsed.unwrap_or_else(|e| {
        tracing::warn!(format = format.as_str(), error = %e, "ignoring unparsable field fallback");
        FieldValue::Absent
    })
}

/// Loose truthiness of a JSON value (`0`, `"0"`, `""`, `[]`, `{}` and null are false)
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Integer coercion: numbers are truncated, strings use their leading integer prefix
pub(crate) fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
        Value::String(s) => leading_int(s),
        _ => 0,
    }
}

/// Option ids arrive as numbers or numeric strings
pub(crate) fn option_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "1" } else { "" }.to_string(),
        other => other.to_string(),
    }
}

fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].bytes().fold(0i64, |acc, d| {
        acc.saturating_mul(10).saturating_add(sign * i64::from(d - b'0'))
    })
}
