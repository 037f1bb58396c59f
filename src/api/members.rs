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


//! List member API
//!
//! # API Endpoints
//! - `GET /lists/{list_id}/members?page=&perpage=&orderby=created_at&filter[..]` - query
//! - `GET /lists/{list_id}/members/{member_id}` - load one member
//! - `POST /lists/{list_id}/members` - create (form body, answers 201 with `{"id": ..}`)
//! - `PUT /lists/{list_id}/members/{member_id}` - update (form body, answers 201)
//! - `DELETE /lists/{list_id}/members/{member_id}` - delete (answers 201)
//!
//! # Write Semantics
//! The two update operations deliberately differ:
//! - [`HeyLoyaltyClient::update_member`] sends only the values set on the member
//!   (a partial update)
//! - [`HeyLoyaltyClient::update_member_data`] sends every field of the list;
//!   fields missing from `data` are sent empty and the server drops their
//!   existing values

use indexmap::IndexMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::client::{decode_json, HeyLoyaltyClient, STATUS_CREATED};
use crate::api::filter::ListFilter;
use crate::api::transport::{HttpMethod, Transport};
use crate::error::{HeyLoyaltyError, Result};
use crate::mediator::{self, WireValue};
use crate::models::{FieldValue, List, Member};

impl<T: Transport> HeyLoyaltyClient<T> {
    /// Get one page of list members, oldest first
    ///
    /// # Arguments
    /// * `list_id` - Hey Loyalty list id
    /// * `page` - page number, starting at 1
    /// * `per_page` - members per page
    /// * `filter` - optional constraints on field values
    pub async fn get_list_members(
        &self,
        list_id: u64,
        page: u32,
        per_page: u32,
        filter: Option<&ListFilter>,
    ) -> Result<Vec<Member>> {
        let list = self.get_list(list_id).await?;

        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("perpage".to_string(), per_page.to_string()),
            ("orderby".to_string(), "created_at".to_string()),
        ];
        if let Some(filter) = filter {
            query.extend(filter.to_query());
        }

        let response = self.get_json(&members_endpoint(list_id), query).await?;

        let records: &[Value] = match response.get("members") {
            Some(Value::Array(records)) => records.as_slice(),
            Some(Value::Null) | None => &[],
            Some(_) => {
                return Err(HeyLoyaltyError::invalid_response(
                    "members is not an array",
                    Some(response.to_string()),
                ))
            }
        };

        records.iter().map(|record| Member::from_record(&list, record)).collect()
    }

    /// Find a member by email address
    ///
    /// Only meaningful for lists that do not allow duplicate email addresses:
    /// the first match is returned.
    pub async fn get_member_by_email(&self, list_id: u64, email: &str) -> Result<Option<Member>> {
        self.find_first(list_id, "email", email).await
    }

    /// Find a member by mobile phone number
    ///
    /// Only meaningful for lists that do not allow duplicate mobile numbers:
    /// the first match is returned.
    pub async fn get_member_by_mobile(&self, list_id: u64, mobile: &str) -> Result<Option<Member>> {
        self.find_first(list_id, "mobile", mobile).await
    }

    async fn find_first(&self, list_id: u64, field_name: &str, value: &str) -> Result<Option<Member>> {
        let mut filter = ListFilter::new();
        filter.equal_to(field_name, value);

        let members = self.get_list_members(list_id, 1, 1, Some(&filter)).await?;
        Ok(members.into_iter().next())
    }

    /// Visit every member of a list, or of the subset matching `filter`
    ///
    /// Pages of `page_size` members (1000 by default) are fetched one after
    /// another until an empty page comes back; a short page does not end the
    /// walk. Returns the number of members visited.
    pub async fn enumerate_members<F>(&self, list_id: u64, filter: Option<&ListFilter>, visit: F) -> Result<usize>
    where
        F: FnMut(Member),
    {
        self.enumerate(list_id, filter, None, visit).await
    }

    /// Like [`enumerate_members`](Self::enumerate_members), checking `cancel`
    /// before each page
    ///
    /// # Errors
    /// Returns [`HeyLoyaltyError::Cancelled`] once the token is cancelled; the
    /// members of pages already fetched have been visited.
    pub async fn enumerate_members_with_cancel<F>(
        &self,
        list_id: u64,
        filter: Option<&ListFilter>,
        cancel: &CancellationToken,
        visit: F,
    ) -> Result<usize>
    where
        F: FnMut(Member),
    {
        self.enumerate(list_id, filter, Some(cancel), visit).await
    }

    async fn enumerate<F>(
        &self,
        list_id: u64,
        filter: Option<&ListFilter>,
        cancel: Option<&CancellationToken>,
        mut visit: F,
    ) -> Result<usize>
    where
        F: FnMut(Member),
    {
        let per_page = self.config().page_size;
        let mut page = 1;
        let mut total = 0;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(list_id, page, total, "member enumeration cancelled");
                return Err(HeyLoyaltyError::Cancelled);
            }

            let members = self.get_list_members(list_id, page, per_page, filter).await?;
            if members.is_empty() {
                break;
            }

            info!(list_id, page, count = members.len(), "enumerating members");

            total += members.len();
            members.into_iter().for_each(&mut visit);
            page += 1;
        }

        Ok(total)
    }

    /// Load a member by its Hey Loyalty GUID
    pub async fn load_member(&self, list_id: u64, member_id: &str) -> Result<Member> {
        let list = self.get_list(list_id).await?;
        let record = self.get_json(&member_endpoint(list_id, member_id), Vec::new()).await?;
        Member::from_record(&list, &record)
    }

    /// Create a new member, assigning the server-issued id to it
    ///
    /// Every field of the list is sent; fields not set on the member are sent
    /// empty.
    ///
    /// # Errors
    /// Returns [`HeyLoyaltyError::MemberAlreadyCreated`] without contacting the
    /// API if the member already has an id.
    pub async fn create_member(&self, member: &mut Member) -> Result<String> {
        if let Some(id) = member.id() {
            return Err(HeyLoyaltyError::MemberAlreadyCreated { id: id.to_string() });
        }

        let list = self.get_list(member.list_id()).await?;
        let form = full_form(&list, member.values())?;

        let body = self
            .execute(HttpMethod::Post, &members_endpoint(member.list_id()), Vec::new(), form, STATUS_CREATED)
            .await?;

        let response = decode_json(&body)?;
        let id = match response.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(HeyLoyaltyError::invalid_response("create response has no member id", Some(body))),
        };

        debug!(list_id = member.list_id(), member_id = %id, "created member");
        member.assign_id(id.clone());

        Ok(id)
    }

    /// Update an existing member with the values set on it
    ///
    /// Only fields that are declared by the list and hold a value on the
    /// member are sent; everything else keeps its value on the server.
    pub async fn update_member(&self, member: &Member) -> Result<()> {
        let member_id = member.id().ok_or(HeyLoyaltyError::MemberNotCreated)?;
        let list = self.get_list(member.list_id()).await?;

        let mut form = Vec::new();
        for (name, field) in &list.fields {
            match member.get(name) {
                Some(value) if !value.is_absent() => {
                    mediator::format_value(field.format, value)?.append_to(name, &mut form);
                }
                _ => {}
            }
        }

        self.execute(
            HttpMethod::Put,
            &member_endpoint(member.list_id(), member_id),
            Vec::new(),
            form,
            STATUS_CREATED,
        )
        .await?;

        Ok(())
    }

    /// Replace all field values of a member
    ///
    /// `data` must be complete: every field of the list is sent, and fields
    /// missing from `data` are sent empty, which erases their existing values
    /// on the server.
    pub async fn update_member_data(
        &self,
        list_id: u64,
        member_id: &str,
        data: &IndexMap<String, FieldValue>,
    ) -> Result<()> {
        let list = self.get_list(list_id).await?;
        let form = full_form(&list, data)?;

        self.execute(HttpMethod::Put, &member_endpoint(list_id, member_id), Vec::new(), form, STATUS_CREATED)
            .await?;

        Ok(())
    }

    /// Delete a member
    pub async fn delete_member(&self, member: &Member) -> Result<()> {
        let member_id = member.id().ok_or(HeyLoyaltyError::MemberNotCreated)?;
        self.delete_member_by_id(member.list_id(), member_id).await
    }

    /// Delete a member by its Hey Loyalty GUID
    pub async fn delete_member_by_id(&self, list_id: u64, member_id: &str) -> Result<()> {
        self.execute(
            HttpMethod::Delete,
            &member_endpoint(list_id, member_id),
            Vec::new(),
            Vec::new(),
            STATUS_CREATED,
        )
        .await?;

        debug!(list_id, member_id, "deleted member");
        Ok(())
    }

    /// Create the member if it has no id yet, otherwise update it
    ///
    /// Returns the member id.
    pub async fn save_member(&self, member: &mut Member) -> Result<String> {
        match member.id() {
            Some(id) => {
                let id = id.to_string();
                self.update_member(member).await?;
                Ok(id)
            }
            None => self.create_member(member).await,
        }
    }
}

/// Form pairs for every field of the list, missing values formatted as absent
fn full_form(list: &List, values: &IndexMap<String, FieldValue>) -> Result<Vec<(String, String)>> {
    let mut form = Vec::new();
    for (name, field) in &list.fields {
        let value = values.get(name).unwrap_or(&FieldValue::Absent);
        let wire: WireValue = mediator::format_value(field.format, value)?;
        wire.append_to(name, &mut form);
    }
    Ok(form)
}

fn members_endpoint(list_id: u64) -> String {
    format!("/lists/{list_id}/members")
}

fn member_endpoint(list_id: u64, member_id: &str) -> String {
    format!("/lists/{list_id}/members/{}", urlencoding::encode(member_id))
}
