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


//! Member query filters
//!
//! Each constraint becomes one query parameter named
//! `filter[{field}][{operator}][]`. The parameter name is the identity of a
//! constraint, so setting the same field and operator twice keeps only the
//! last value.

use indexmap::IndexMap;

use crate::models::FieldValue;

/// Comparison operator of a filter constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "neq",
        }
    }
}

/// A set of constraints for list member queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    filters: IndexMap<String, String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match members whose field equals the value
    pub fn equal_to(&mut self, field_name: &str, value: impl Into<FieldValue>) -> &mut Self {
        self.constrain(field_name, FilterOperator::Equal, value.into())
    }

    /// Match members whose field differs from the value
    pub fn not_equal_to(&mut self, field_name: &str, value: impl Into<FieldValue>) -> &mut Self {
        self.constrain(field_name, FilterOperator::NotEqual, value.into())
    }

    fn constrain(&mut self, field_name: &str, operator: FilterOperator, value: FieldValue) -> &mut Self {
        let key = format!("filter[{}][{}][]", field_name, operator.as_str());
        self.filters.insert(key, value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Query parameter name => value
    pub fn to_params(&self) -> &IndexMap<String, String> {
        &self.filters
    }

    pub(crate) fn to_query(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.filters.iter().map(|(k, v)| (k.clone(), v.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_get_distinct_keys() {
        let mut filter = ListFilter::new();
        filter.equal_to("email", "a@b.com").not_equal_to("email", "a@b.com");

        assert_eq!(filter.len(), 2);
        assert_eq!(filter.to_params()["filter[email][eq][]"], "a@b.com");
        assert_eq!(filter.to_params()["filter[email][neq][]"], "a@b.com");
    }

    #[test]
    fn test_same_constraint_overwrites() {
        let mut filter = ListFilter::new();
        filter.equal_to("email", "first@b.com");
        filter.equal_to("email", "second@b.com");

        assert_eq!(filter.len(), 1);
        assert_eq!(filter.to_params()["filter[email][eq][]"], "second@b.com");
    }

    #[test]
    fn test_values_are_stringified() {
        let mut filter = ListFilter::new();
        filter.equal_to("sex", 2).equal_to("vip", true).not_equal_to("active", false);

        let params: Vec<(String, String)> = filter.to_query().collect();
        assert_eq!(
            params,
            vec![
                ("filter[sex][eq][]".to_string(), "2".to_string()),
                ("filter[vip][eq][]".to_string(), "1".to_string()),
                ("filter[active][neq][]".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_filter() {
        assert!(ListFilter::new().is_empty());
    }
}
