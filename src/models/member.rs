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


//! List members
//!
//! A [`Member`] is an open key/value record: the set of fields depends on the
//! list it belongs to and is only known once the list schema has been fetched.
//! Server-managed metadata (status, counters, timestamps) has typed read-only
//! accessors and is only ever populated from API responses.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{HeyLoyaltyError, Result};
use crate::mediator;
use crate::models::{FieldValue, List};

/// Membership status of an active member
pub const STATUS_ACTIVE: &str = "active";

/// Sex option ids used by the fixed `sex` field
pub const SEX_MALE: i64 = 1;
pub const SEX_FEMALE: i64 = 2;

/// Server-populated member metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberMetadata {
    pub status: Option<String>,
    pub status_email: Option<String>,
    pub status_mobile: Option<String>,
    /// Number of emails sent to this member
    pub sent_mail: i64,
    /// Number of SMS sent to this member
    pub sent_sms: i64,
    /// Percentage of emails opened
    pub open_rate: i64,
    pub imported: bool,
    /// UNIX timestamp
    pub created_at: Option<i64>,
    /// UNIX timestamp
    pub updated_at: Option<i64>,
}

/// An individual member of a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    list_id: u64,
    id: Option<String>,
    metadata: MemberMetadata,
    values: IndexMap<String, FieldValue>,
}

impl Member {
    /// Create an empty member for the given list; it has no id until created remotely
    pub fn new(list_id: u64) -> Self {
        Self {
            list_id,
            id: None,
            metadata: MemberMetadata::default(),
            values: IndexMap::new(),
        }
    }

    pub fn list_id(&self) -> u64 {
        self.list_id
    }

    /// Hey Loyalty member GUID, `None` until the member has been created
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }

    // ===== Field values =====

    /// Value of a field, `None` if it was never set on this member
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All field values set on this member, in insertion order
    pub fn values(&self) -> &IndexMap<String, FieldValue> {
        &self.values
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(FieldValue::as_datetime)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    pub fn choice(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Choice(id) => Some(*id),
            _ => None,
        }
    }

    pub fn options(&self, name: &str) -> Option<&[i64]> {
        self.get(name).and_then(FieldValue::as_options)
    }

    pub fn email(&self) -> Option<&str> {
        self.text("email")
    }

    pub fn mobile(&self) -> Option<&str> {
        self.text("mobile")
    }

    // ===== Server metadata =====

    pub fn metadata(&self) -> &MemberMetadata {
        &self.metadata
    }

    pub fn status(&self) -> Option<&str> {
        self.metadata.status.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(STATUS_ACTIVE)
    }

    pub fn status_email(&self) -> Option<&str> {
        self.metadata.status_email.as_deref()
    }

    pub fn status_mobile(&self) -> Option<&str> {
        self.metadata.status_mobile.as_deref()
    }

    pub fn sent_mail(&self) -> i64 {
        self.metadata.sent_mail
    }

    pub fn sent_sms(&self) -> i64 {
        self.metadata.sent_sms
    }

    pub fn open_rate(&self) -> i64 {
        self.metadata.open_rate
    }

    pub fn imported(&self) -> bool {
        self.metadata.imported
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.created_at.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.updated_at.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    // ===== Wire conversion =====

    /// Build a member from an API record using the list schema
    ///
    /// Only fields declared by the list are read; anything else in the record
    /// is ignored.
    pub fn from_record(list: &List, record: &Value) -> Result<Self> {
        let id = match record.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(HeyLoyaltyError::invalid_response(
                    "member record has no id",
                    Some(record.to_string()),
                ))
            }
        };

        let status = record.get("status");
        let status_member = |key: &str| {
            status
                .and_then(|s| s.get(key))
                .filter(|v| !v.is_null())
                .map(mediator::scalar_to_string)
        };
        let int_member = |key: &str| record.get(key).map(mediator::coerce_int).unwrap_or_default();
        let date_member = |key: &str| -> Result<Option<i64>> {
            match record.get(key) {
                Some(Value::String(s)) => mediator::parse_date_time(s),
                _ => Ok(None),
            }
        };

        let metadata = MemberMetadata {
            status: status_member("status"),
            status_email: status_member("email"),
            status_mobile: status_member("mobile"),
            sent_mail: int_member("sent_mail"),
            sent_sms: int_member("sent_sms"),
            open_rate: int_member("open_rate"),
            imported: record.get("imported").is_some_and(mediator::is_truthy),
            created_at: date_member("created_at")?,
            updated_at: date_member("updated_at")?,
        };

        let mut values = IndexMap::new();
        for (name, field) in &list.fields {
            if let Some(raw) = record.get(name) {
                values.insert(name.clone(), mediator::parse_value(field.format, raw)?);
            }
        }

        Ok(Self {
            list_id: list.id,
            id: Some(id),
            metadata,
            values,
        })
    }
}
