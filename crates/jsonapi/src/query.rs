//! Query parameters relevant to document building.
//!
//! Handles the JSON:API families `fields[type]=a,b` (sparse fieldsets) and
//! `include=a,b.c` (inclusion paths). All other parameters are kept verbatim.

use std::collections::{BTreeSet, HashMap};

use url::Url;

use crate::api::keywords;

/// Parsed query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameters {
    fields: HashMap<String, BTreeSet<String>>,
    include: Vec<String>,
    other: Vec<(String, String)>,
}

impl QueryParameters {
    /// Parses a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.push(&name, &value);
        }
        params
    }

    /// Parses the query of a URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (name, value) in url.query_pairs() {
            params.push(&name, &value);
        }
        params
    }

    fn push(&mut self, name: &str, value: &str) {
        if let Some(api_type) = fieldset_type(name) {
            let fields = self.fields.entry(api_type.to_string()).or_default();
            fields.extend(split_list(value));
            return;
        }
        if name == keywords::INCLUDE {
            for path in split_list(value) {
                if !self.include.contains(&path) {
                    self.include.push(path);
                }
            }
            return;
        }
        self.other.push((name.to_string(), value.to_string()));
    }

    /// Returns true if the api type has a sparse fieldset.
    pub fn is_restricted(&self, api_type: &str) -> bool {
        self.fields.contains_key(api_type)
    }

    /// Returns true if the field should be emitted for the api type.
    ///
    /// Every field is emitted for types without a sparse fieldset.
    pub fn contains_field(&self, api_type: &str, field: &str) -> bool {
        self.fields
            .get(api_type)
            .is_none_or(|fields| fields.contains(field))
    }

    /// Returns the requested fields of an api type.
    pub fn fields(&self, api_type: &str) -> Option<&BTreeSet<String>> {
        self.fields.get(api_type)
    }

    /// Returns the requested include paths in request order.
    pub fn include_paths(&self) -> &[String] {
        &self.include
    }

    /// Returns true if `path` or a longer path starting with it was requested.
    ///
    /// `comments` is included when `comments.author` was requested.
    pub fn is_included(&self, path: &str) -> bool {
        self.include.iter().any(|requested| {
            requested == path
                || requested
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Returns the first value of a parameter that is neither a fieldset nor
    /// an include.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.other
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn fieldset_type(name: &str) -> Option<&str> {
    name.strip_prefix(keywords::FIELDS)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|api_type| !api_type.is_empty())
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
