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


//! Hey Loyalty API client implementation
//!
//! Request signing, transport, list metadata and member operations.

pub mod auth;
pub mod client;
pub mod filter;
pub mod lists;
pub mod members;
pub mod transport;

// Re-export commonly used types
pub use auth::Credentials;
pub use client::{ClientConfig, ClientConfigBuilder, HeyLoyaltyClient, BASE_URL, ENUMERATION_PAGE_SIZE};
pub use filter::{FilterOperator, ListFilter};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport};
