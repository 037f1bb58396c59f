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


//! List and field schema
//!
//! A [`List`] is built once from the `GET /lists/{id}` metadata response and
//! is immutable afterwards. Its fields keep the order the API returned them in.
//!
//! # API Response Shape
//! ```json
//! {
//!   "id": 1234, "name": "Newsletter", "country_id": 45,
//!   "date_format": "d-m-Y", "duplicates": "disallow",
//!   "fields": [
//!     { "id": 1, "name": "email", "label": "E-mail", "required_in_shop": true,
//!       "fallback": null, "type": "fixed", "type_id": 1, "format": "text" },
//!     { "id": 9, "name": "sex", "label": "Sex", "type": "fixed", "format": "choice",
//!       "options": { "1": "Male", "2": "Female" } }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{HeyLoyaltyError, Result};
use crate::mediator;
use crate::models::FieldValue;

// ============================================================================
// ENUMS
// ============================================================================

/// Whether a list accepts members sharing an email address or mobile number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatesPolicy {
    Allow,
    AllowEmail,
    AllowMobile,
    Disallow,
}

impl DuplicatesPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::AllowEmail => "allow_email",
            Self::AllowMobile => "allow_mobile",
            Self::Disallow => "disallow",
        }
    }

    /// True if at most one member can carry a given email address
    pub fn unique_email(&self) -> bool {
        matches!(self, Self::Disallow | Self::AllowMobile)
    }

    /// True if at most one member can carry a given mobile number
    pub fn unique_mobile(&self) -> bool {
        matches!(self, Self::Disallow | Self::AllowEmail)
    }
}

impl FromStr for DuplicatesPolicy {
    type Err = HeyLoyaltyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allow" => Ok(Self::Allow),
            "allow_email" => Ok(Self::AllowEmail),
            "allow_mobile" => Ok(Self::AllowMobile),
            "disallow" => Ok(Self::Disallow),
            other => Err(HeyLoyaltyError::UnsupportedDuplicatesPolicy(other.to_string())),
        }
    }
}

/// System-defined (`fixed`) or user-defined (`custom`) field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Fixed,
    Custom,
}

impl FromStr for FieldType {
    type Err = HeyLoyaltyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "custom" => Ok(Self::Custom),
            other => Err(HeyLoyaltyError::UnsupportedFieldType(other.to_string())),
        }
    }
}

/// Field input format, governs how values are converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Text,
    Choice,
    Date,
    Number,
    Password,
    Boolean,
    Multi,
}

impl FieldFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Choice => "choice",
            Self::Date => "date",
            Self::Number => "number",
            Self::Password => "password",
            Self::Boolean => "boolean",
            Self::Multi => "multi",
        }
    }

    /// True for formats that carry an option map
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Choice | Self::Multi)
    }
}

impl FromStr for FieldFormat {
    type Err = HeyLoyaltyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "choice" => Ok(Self::Choice),
            "date" => Ok(Self::Date),
            "number" => Ok(Self::Number),
            "password" => Ok(Self::Password),
            "boolean" => Ok(Self::Boolean),
            "multi" => Ok(Self::Multi),
            other => Err(HeyLoyaltyError::UnsupportedFieldFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MODELS
// ============================================================================

/// A Hey Loyalty list with its field schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub id: u64,
    pub name: String,
    pub country_id: i64,
    /// Display format used by the Hey Loyalty UI, informational only
    pub date_format: String,
    pub duplicates: DuplicatesPolicy,
    /// Field name => field, in API order
    pub fields: IndexMap<String, Field>,
}

impl List {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn custom_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().filter(|f| f.field_type == FieldType::Custom)
    }
}

/// A single field in a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub id: i64,
    pub list_id: u64,
    pub name: String,
    pub label: String,
    pub required_in_shop: bool,
    /// Value used when a member has none
    pub fallback: FieldValue,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub type_id: i64,
    pub format: FieldFormat,
    /// Option id => option label, only for `choice` and `multi` fields
    pub options: IndexMap<i64, String>,
}

impl Field {
    /// Label of the given option id
    pub fn option_label(&self, id: i64) -> Option<&str> {
        self.options.get(&id).map(String::as_str)
    }

    /// Option id carrying the given label
    pub fn option_id(&self, label: &str) -> Option<i64> {
        self.options.iter().find(|(_, l)| l.as_str() == label).map(|(id, _)| *id)
    }
}

// ============================================================================
// METADATA PARSING
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListMetadata {
    id: Value,
    name: String,
    country_id: Value,
    #[serde(default)]
    date_format: String,
    duplicates: String,
    fields: Vec<FieldMetadata>,
}

#[derive(Debug, Deserialize)]
struct FieldMetadata {
    id: Value,
    name: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    required_in_shop: Value,
    #[serde(default)]
    fallback: Value,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    type_id: Value,
    format: String,
    #[serde(default)]
    options: Option<Value>,
}

/// Parse a `GET /lists/{id}` response body into a [`List`]
pub fn parse_list_metadata(body: &str) -> Result<List> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| HeyLoyaltyError::invalid_response(format!("list metadata is not JSON: {e}"), Some(body.to_string())))?;
    List::from_metadata(value)
}

impl List {
    /// Build a list from already-decoded metadata
    pub fn from_metadata(value: Value) -> Result<Self> {
        let metadata: ListMetadata = serde_json::from_value(value)
            .map_err(|e| HeyLoyaltyError::invalid_response(format!("malformed list metadata: {e}"), None))?;

        let id = u64::try_from(mediator::coerce_int(&metadata.id))
            .map_err(|_| HeyLoyaltyError::invalid_response(format!("invalid list id {}", metadata.id), None))?;

        if metadata.fields.is_empty() {
            return Err(HeyLoyaltyError::invalid_response(format!("list {id} declares no fields"), None));
        }

        let mut fields = IndexMap::with_capacity(metadata.fields.len());
        for field in metadata.fields {
            let field = build_field(id, field)?;
            fields.insert(field.name.clone(), field);
        }

        Ok(Self {
            id,
            name: metadata.name,
            country_id: mediator::coerce_int(&metadata.country_id),
            date_format: metadata.date_format,
            duplicates: metadata.duplicates.parse()?,
            fields,
        })
    }
}

fn build_field(list_id: u64, data: FieldMetadata) -> Result<Field> {
    let format: FieldFormat = data.format.parse()?;

    let options = match data.options {
        Some(options) => parse_options(&options),
        None => IndexMap::new(),
    };

    Ok(Field {
        id: mediator::coerce_int(&data.id),
        list_id,
        name: data.name,
        label: data.label,
        required_in_shop: mediator::is_truthy(&data.required_in_shop),
        fallback: mediator::parse_fallback(format, &data.fallback),
        field_type: data.field_type.parse()?,
        type_id: mediator::coerce_int(&data.type_id),
        format,
        options,
    })
}

/// Options arrive either as `{"<id>": "<label>"}` or as a list of
/// `{"id": .., "label": ..}` entries
fn parse_options(value: &Value) -> IndexMap<i64, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(id, label)| Some((id.trim().parse().ok()?, option_label(label))))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item {
                Value::Object(entry) => {
                    let id = entry.get("id").and_then(mediator::option_id)?;
                    Some((id, option_label(item)))
                }
                other => Some((index as i64, mediator::scalar_to_string(other))),
            })
            .collect(),
        _ => IndexMap::new(),
    }
}

fn option_label(value: &Value) -> String {
    match value {
        Value::Object(entry) => entry
            .get("label")
            .or_else(|| entry.get("name"))
            .map(mediator::scalar_to_string)
            .unwrap_or_default(),
        other => mediator::scalar_to_string(other),
    }
}
