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


//! Data model: list schema, members and native field values

pub mod list;
pub mod member;
pub mod value;

pub use list::{parse_list_metadata, DuplicatesPolicy, Field, FieldFormat, FieldType, List};
pub use member::{Member, MemberMetadata, SEX_FEMALE, SEX_MALE, STATUS_ACTIVE};
pub use value::FieldValue;
