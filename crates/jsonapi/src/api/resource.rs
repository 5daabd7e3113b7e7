//! Resources and resource identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::link::{Links, Meta};
use super::relationship::Relationships;

/// A bare `(type, id)` reference to a resource.
///
/// Equality, hashing and ordering consider only the type and id, so an
/// identifier carrying meta still matches the same identity without it.
/// Ordering is by type, then id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// The api type, e.g. `"articles"`.
    #[serde(rename = "type")]
    pub api_type: String,

    /// The api id.
    #[serde(rename = "id")]
    pub api_id: String,

    /// Optional meta attached to this identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ResourceIdentifier {
    /// Creates an identifier without meta.
    pub fn new(api_type: impl Into<String>, api_id: impl Into<String>) -> Self {
        Self {
            api_type: api_type.into(),
            api_id: api_id.into(),
            meta: None,
        }
    }

    /// Sets the meta.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns a copy of the identity without meta.
    pub fn identity(&self) -> Self {
        Self::new(self.api_type.clone(), self.api_id.clone())
    }
}

impl PartialEq for ResourceIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.api_type == other.api_type && self.api_id == other.api_id
    }
}

impl Eq for ResourceIdentifier {}

impl Hash for ResourceIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.api_type.hash(state);
        self.api_id.hash(state);
    }
}

impl PartialOrd for ResourceIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourceIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.api_type
            .cmp(&other.api_type)
            .then_with(|| self.api_id.cmp(&other.api_id))
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_type, self.api_id)
    }
}

/// A resource object.
///
/// # JSON shape
///
/// ```json
/// {
///   "type": "articles",
///   "id": "1",
///   "attributes": { "title": "JSON:API paints my bikeshed!" },
///   "relationships": { "author": { "data": { "type": "people", "id": "9" } } },
///   "links": { "self": "http://example.com/articles/1" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// The api type.
    #[serde(rename = "type")]
    pub api_type: String,

    /// The api id.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    /// Attribute members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,

    /// Relationship members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,

    /// Resource-level links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    /// Resource-level meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Resource {
    /// Creates a resource with only type and id.
    pub fn new(api_type: impl Into<String>, api_id: impl Into<String>) -> Self {
        Self {
            api_type: api_type.into(),
            api_id: Some(api_id.into()),
            attributes: None,
            relationships: None,
            links: None,
            meta: None,
        }
    }

    /// Returns the identifier of this resource, if it has an id.
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.api_id
            .as_ref()
            .map(|id| ResourceIdentifier::new(self.api_type.clone(), id.clone()))
    }

    /// Returns an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.as_ref().and_then(|a| a.get(name))
    }
}
