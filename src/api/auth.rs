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


//! Request signing
//!
//! Every request carries HTTP Basic credentials where the user name is the
//! API key and the password is a signature of the request timestamp:
//!
//! ```text
//! timestamp = "Mon, 19 Oct 2026 08:30:00 GMT"
//! signature = base64(hex(hmac_sha256(api_secret, timestamp)))
//! Authorization: Basic base64("{api_key}:{signature}")
//! X-Request-Timestamp: {timestamp}
//! ```
//!
//! Note the hex step: the HMAC digest is hex encoded (lowercase) before it is
//! base64 encoded. The API rejects the raw-digest variant.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::{HeyLoyaltyError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signed timestamp
pub const TIMESTAMP_HEADER: &str = "X-Request-Timestamp";

const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// API key and shared secret issued by Hey Loyalty
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    /// Create credentials, rejecting blank keys or secrets
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        let api_secret = api_secret.into();

        if api_key.is_empty() {
            return Err(HeyLoyaltyError::InvalidConfiguration("API key is empty".to_string()));
        }
        if api_secret.trim().is_empty() {
            return Err(HeyLoyaltyError::InvalidConfiguration("API secret is empty".to_string()));
        }
        if api_key.contains(':') {
            return Err(HeyLoyaltyError::InvalidConfiguration(
                "API key must not contain ':'".to_string(),
            ));
        }

        Ok(Self { api_key, api_secret })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Authentication headers for a request sent at the given time
    pub fn sign(&self, at: DateTime<Utc>) -> Result<Vec<(String, String)>> {
        let timestamp = request_timestamp(at);
        let signature = signature(&self.api_secret, &timestamp)?;
        let basic = general_purpose::STANDARD.encode(format!("{}:{}", self.api_key, signature));

        Ok(vec![
            ("Authorization".to_string(), format!("Basic {basic}")),
            (TIMESTAMP_HEADER.to_string(), timestamp),
        ])
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

/// Format a request timestamp, e.g. `Mon, 19 Oct 2026 08:30:00 GMT`
pub fn request_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Sign a timestamp with the API secret
pub fn signature(api_secret: &str, timestamp: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|e| HeyLoyaltyError::InvalidConfiguration(format!("Invalid API secret: {e}")))?;
    mac.update(timestamp.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(general_purpose::STANDARD.encode(digest))
}
