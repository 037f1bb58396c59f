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


//! List metadata API
//!
//! # API Endpoints
//! - `GET /lists` - all lists of the account (returned as raw JSON)
//! - `GET /lists/{list_id}` - one list with its field schema

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::api::client::{HeyLoyaltyClient, STATUS_OK};
use crate::api::transport::{HttpMethod, Transport};
use crate::error::Result;
use crate::models::{parse_list_metadata, List};

impl<T: Transport> HeyLoyaltyClient<T> {
    /// Get a list and its fields
    ///
    /// The first call for a list id fetches the metadata; every later call
    /// returns the cached schema. Concurrent callers asking for the same
    /// uncached list wait for a single fetch.
    pub async fn get_list(&self, list_id: u64) -> Result<Arc<List>> {
        let mut cache = self.list_cache().lock().await;

        if let Some(list) = cache.get(&list_id) {
            return Ok(Arc::clone(list));
        }

        debug!(list_id, "list schema not cached, fetching metadata");

        let endpoint = format!("/lists/{list_id}");
        let body = self
            .execute(HttpMethod::Get, &endpoint, Vec::new(), Vec::new(), STATUS_OK)
            .await?;
        let list = Arc::new(parse_list_metadata(&body)?);

        debug!(list_id, fields = list.fields.len(), "cached list schema");
        cache.insert(list_id, Arc::clone(&list));

        Ok(list)
    }

    /// Get all lists of the account as returned by the API
    pub async fn get_lists(&self) -> Result<Value> {
        self.get_json("/lists", Vec::new()).await
    }

    /// Cached schema for a list, without fetching
    pub async fn cached_list(&self, list_id: u64) -> Option<Arc<List>> {
        self.list_cache().lock().await.get(&list_id).cloned()
    }
}
