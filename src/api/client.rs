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


//! HTTP client for the Hey Loyalty API
//!
//! # Architecture
//!
//! `HeyLoyaltyClient` owns:
//! - a [`Transport`] (a `reqwest::Client` unless one is supplied)
//! - the API [`Credentials`], used to sign every request
//! - the list schema cache: list id => [`List`], filled on first use and
//!   never evicted for the lifetime of the client
//!
//! Operations are split across modules the same way the API is:
//! - `lists.rs` - list metadata (`GET /lists`, `GET /lists/{id}`)
//! - `members.rs` - member queries and writes (`/lists/{id}/members`)
//!
//! # Status Codes
//! Reads expect `200 OK`. Create, update and delete expect `201 Created`
//! (including `PUT` and `DELETE`, which is what the API actually answers).
//! Any other status fails the call with [`HeyLoyaltyError::UnexpectedStatus`];
//! nothing is retried.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::auth::Credentials;
use crate::api::transport::{HttpMethod, HttpRequest, Transport};
use crate::error::{HeyLoyaltyError, Result};
use crate::models::List;

/// Hey Loyalty API endpoint
pub const BASE_URL: &str = "https://api.heyloyalty.com/loyalty/v1";

/// Page size used when enumerating all members of a list
pub const ENUMERATION_PAGE_SIZE: u32 = 1000;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Expected status for reads
pub(crate) const STATUS_OK: u16 = 200;

/// Expected status for create, update and delete
pub(crate) const STATUS_CREATED: u16 = 201;

/// Configuration for HeyLoyaltyClient
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applied to the default reqwest transport only
    pub timeout: Duration,
    pub user_agent: String,
    /// Members per page when enumerating a whole list
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("heyloyalty-client/{}", env!("CARGO_PKG_VERSION")),
            page_size: ENUMERATION_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Check the settings and normalize the base URL
    fn validate(mut self) -> Result<Self> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            HeyLoyaltyError::InvalidConfiguration(format!("Invalid base URL {:?}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HeyLoyaltyError::InvalidConfiguration(format!(
                "Base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.page_size == 0 {
            return Err(HeyLoyaltyError::InvalidConfiguration("page size must be positive".to_string()));
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Client for the Hey Loyalty API
///
/// # Example
/// ```rust,no_run
/// use heyloyalty::{Credentials, HeyLoyaltyClient, Member};
///
/// # async fn example() -> heyloyalty::Result<()> {
/// let client = HeyLoyaltyClient::new(Credentials::new("api-key", "api-secret")?)?;
///
/// let list = client.get_list(1234).await?;
/// println!("{} has {} fields", list.name, list.fields.len());
///
/// let mut member = Member::new(1234);
/// member.set("email", "jane@example.com").set("firstname", "Jane");
/// let id = client.create_member(&mut member).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HeyLoyaltyClient<T = reqwest::Client> {
    transport: T,
    credentials: Credentials,
    config: ClientConfig,
    /// List id => schema; the lock is held while a missing list is fetched
    list_cache: Mutex<HashMap<u64, Arc<List>>>,
}

impl HeyLoyaltyClient<reqwest::Client> {
    /// Create a client with default configuration
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a client with custom configuration
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be built
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Self::with_transport(credentials, config, client)
    }
}

impl<T: Transport> HeyLoyaltyClient<T> {
    /// Create a client sending requests through the given transport
    pub fn with_transport(credentials: Credentials, config: ClientConfig, transport: T) -> Result<Self> {
        let config = config.validate()?;

        Ok(Self {
            transport,
            credentials,
            config,
            list_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn list_cache(&self) -> &Mutex<HashMap<u64, Arc<List>>> {
        &self.list_cache
    }

    /// Sign and send a request, returning the body if the status matches
    ///
    /// # Arguments
    /// * `endpoint` - path relative to the base URL, e.g. `/lists/12`
    /// * `query` - query string pairs
    /// * `form` - form body pairs (POST / PUT only)
    /// * `expected` - the only status code accepted as success
    pub(crate) async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query: Vec<(String, String)>,
        form: Vec<(String, String)>,
        expected: u16,
    ) -> Result<String> {
        let mut headers = self.credentials.sign(Utc::now())?;
        headers.push(("Accept".to_string(), "application/json".to_string()));

        let request = HttpRequest {
            method,
            url: format!("{}{}", self.config.base_url, endpoint),
            headers,
            query,
            form,
        };

        debug!(method = method.as_str(), endpoint, "sending Hey Loyalty request");

        let response = self.transport.send(request).await?;

        if response.status != expected {
            debug!(status = response.status, endpoint, "unexpected Hey Loyalty response status");
            return Err(HeyLoyaltyError::unexpected_status(response.status, endpoint, response.body));
        }

        Ok(response.body)
    }

    /// Perform a GET request and decode the JSON body
    pub(crate) async fn get_json(&self, endpoint: &str, query: Vec<(String, String)>) -> Result<Value> {
        let body = self.execute(HttpMethod::Get, endpoint, query, Vec::new(), STATUS_OK).await?;
        decode_json(&body)
    }
}

/// Decode a response body, keeping the body for diagnosis on failure
pub(crate) fn decode_json(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| {
        HeyLoyaltyError::invalid_response(
            format!("Parse error: {} at line {} col {}", e, e.line(), e.column()),
            Some(body.to_string()),
        )
    })
}

// ===== TESTS =====
