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


//! Error types for the Hey Loyalty client
//!
//! Errors are grouped by where they originate:
//!
//! - **Configuration** - missing or malformed credentials / client settings,
//!   reported when the client is constructed
//! - **Protocol** - the API answered with a status code other than the one the
//!   operation expects, or with a body we cannot make sense of
//! - **Schema** - list metadata declares a field format (or type, or
//!   duplicates policy) this client does not know
//! - **Precondition** - the caller asked for something that cannot work, such
//!   as creating a member that already has an id
//!
//! Lookups that find nothing (`get_member_by_email` etc.) return `Ok(None)`
//! rather than an error.

use thiserror::Error;

/// Result type alias using our HeyLoyaltyError type
pub type Result<T> = std::result::Result<T, HeyLoyaltyError>;

/// Main error type for the Hey Loyalty client
#[derive(Error, Debug)]
pub enum HeyLoyaltyError {
    // ===== Configuration Errors =====

    /// Credentials or client settings are missing or invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // ===== Protocol Errors =====

    /// The API answered with a status code the operation does not accept
    #[error("Unexpected HTTP status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        status: u16,
        /// Endpoint path relative to the API base URL
        endpoint: String,
        /// Raw response body, kept for diagnosis
        body: String,
    },

    /// API returned a body that does not have the expected shape
    #[error("Invalid API response: {message}")]
    InvalidApiResponse {
        message: String,
        /// Response body for debugging
        response_body: Option<String>,
    },

    // ===== Schema Errors =====

    /// A field declares a format this client cannot convert
    #[error("unsupported field format: {0}")]
    UnsupportedFieldFormat(String),

    /// A field declares a type other than `fixed` / `custom`
    #[error("unsupported field type: {0}")]
    UnsupportedFieldType(String),

    /// A list declares an unknown duplicates policy
    #[error("unsupported duplicates policy: {0}")]
    UnsupportedDuplicatesPolicy(String),

    // ===== Value Errors =====

    /// A date value is neither a zero date nor `YYYY-MM-DD[ HH:MM:SS]`
    #[error("Invalid date value: {0:?}")]
    InvalidDate(String),

    /// A native value cannot be written to a field of the given format
    #[error("Cannot format {value} as a {format} field value")]
    InvalidFieldValue {
        format: String,
        value: String,
    },

    // ===== Precondition Errors =====

    /// `create_member` was called on a member that already has an id
    #[error("Cannot create a member when its id is already set ({id})")]
    MemberAlreadyCreated { id: String },

    /// Update/delete was called on a member that has no id yet
    #[error("Cannot update or delete a member with no id")]
    MemberNotCreated,

    // ===== General Errors =====

    /// Operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    // ===== External Library Errors =====

    /// HTTP client error from reqwest
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl HeyLoyaltyError {
    /// Create an unexpected status error
    pub fn unexpected_status(status: u16, endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            endpoint: endpoint.into(),
            body: body.into(),
        }
    }

    /// Create an invalid API response error
    pub fn invalid_response(message: impl Into<String>, response_body: Option<String>) -> Self {
        Self::InvalidApiResponse {
            message: message.into(),
            response_body,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::ReqwestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for errors caused by calling an operation on a member in the wrong state
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MemberAlreadyCreated { .. } | Self::MemberNotCreated)
    }
}
