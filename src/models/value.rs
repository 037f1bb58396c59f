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


//! Native field values
//!
//! A member's schema is only known at runtime, so every field value is held in
//! one tagged enum. The mediator produces these when reading and consumes them
//! when writing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native value of a single list field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// No value (zero dates, passwords, unset choices)
    #[default]
    Absent,
    Boolean(bool),
    Text(String),
    Integer(i64),
    /// UNIX timestamp in seconds (UTC)
    Timestamp(i64),
    /// Option id of a `choice` field
    Choice(i64),
    /// Option ids of a `multi` field, in API order
    Multi(Vec<i64>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Timestamp value from a calendar date at midnight UTC
    pub fn date(date: NaiveDate) -> Self {
        Self::Timestamp(date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or_default())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) | Self::Timestamp(n) | Self::Choice(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => DateTime::from_timestamp(*ts, 0),
            _ => None,
        }
    }

    pub fn as_options(&self) -> Option<&[i64]> {
        match self {
            Self::Multi(ids) => Some(ids),
            _ => None,
        }
    }

    /// Loose truthiness used when a value is written to a boolean field
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Boolean(b) => *b,
            Self::Text(s) => !s.is_empty() && s != "0",
            Self::Integer(n) | Self::Timestamp(n) | Self::Choice(n) => *n != 0,
            Self::Multi(ids) => !ids.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Boolean(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) | Self::Timestamp(n) | Self::Choice(n) => write!(f, "{n}"),
            Self::Multi(ids) => {
                let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(value: Vec<i64>) -> Self {
        Self::Multi(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value.timestamp())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Absent)
    }
}
