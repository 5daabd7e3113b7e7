//! Links and meta.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form meta information. JSON:API requires this to be a JSON object.
pub type Meta = serde_json::Value;

/// A single link.
///
/// Serialized as a bare string when there is no meta, otherwise as an
/// object with `href` and `meta` members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LinkRepr", into = "LinkRepr")]
pub struct Link {
    /// The link target.
    pub href: String,
    /// Optional link meta.
    pub meta: Option<Meta>,
}

impl Link {
    /// Creates a link without meta.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            meta: None,
        }
    }

    /// Sets the meta.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    Href(String),
    Object {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Meta>,
    },
}

impl From<LinkRepr> for Link {
    fn from(repr: LinkRepr) -> Self {
        match repr {
            LinkRepr::Href(href) => Link { href, meta: None },
            LinkRepr::Object { href, meta } => Link { href, meta },
        }
    }
}

impl From<Link> for LinkRepr {
    fn from(link: Link) -> Self {
        match link.meta {
            None => LinkRepr::Href(link.href),
            Some(meta) => LinkRepr::Object {
                href: link.href,
                meta: Some(meta),
            },
        }
    }
}

/// A links object, keyed by link relation name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Link>);

impl Links {
    /// Creates an empty links object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a link.
    pub fn insert(&mut self, rel: impl Into<String>, link: Link) {
        self.0.insert(rel.into(), link);
    }

    /// Adds a link and returns self.
    pub fn with(mut self, rel: impl Into<String>, link: Link) -> Self {
        self.insert(rel, link);
        self
    }

    /// Returns a link by relation name.
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.get(rel)
    }

    /// Returns true if a link with this relation exists.
    pub fn contains(&self, rel: &str) -> bool {
        self.0.contains_key(rel)
    }

    /// Returns the number of links.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no links.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(rel, link)` pairs in relation-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Link)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Link)> for Links {
    fn from_iter<I: IntoIterator<Item = (String, Link)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_without_meta_is_a_string() {
        let links = Links::new().with("self", Link::new("http://example.com/articles/1"));
        let value = serde_json::to_value(&links).unwrap();
        assert_eq!(value, json!({"self": "http://example.com/articles/1"}));
    }

    #[test]
    fn test_link_with_meta_is_an_object() {
        let link = Link::new("http://example.com/articles?page=2").with_meta(json!({"count": 10}));
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(
            value,
            json!({"href": "http://example.com/articles?page=2", "meta": {"count": 10}})
        );

        let parsed: Link = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, link);
    }
}
