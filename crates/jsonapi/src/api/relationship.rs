//! Relationships and resource linkage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::link::{Links, Meta};
use super::resource::ResourceIdentifier;

/// The identifier(s) a relationship points to.
///
/// Serialized as `null`, a single identifier object, or an array of
/// identifier objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceLinkage {
    /// To-one linkage; `None` is an explicit empty (`null`) relationship.
    ToOne(Option<ResourceIdentifier>),
    /// To-many linkage in insertion order.
    ToMany(Vec<ResourceIdentifier>),
}

impl ResourceLinkage {
    /// Creates to-one linkage pointing at an identifier.
    pub fn to_one(identifier: ResourceIdentifier) -> Self {
        ResourceLinkage::ToOne(Some(identifier))
    }

    /// Creates empty to-one linkage.
    pub fn null() -> Self {
        ResourceLinkage::ToOne(None)
    }

    /// Creates to-many linkage, dropping duplicate identifiers.
    pub fn to_many(identifiers: impl IntoIterator<Item = ResourceIdentifier>) -> Self {
        let mut unique: Vec<ResourceIdentifier> = Vec::new();
        for identifier in identifiers {
            if !unique.contains(&identifier) {
                unique.push(identifier);
            }
        }
        ResourceLinkage::ToMany(unique)
    }

    /// Returns true for to-one linkage.
    pub fn is_to_one(&self) -> bool {
        matches!(self, ResourceLinkage::ToOne(_))
    }

    /// Returns a short name of the linkage cardinality.
    pub fn cardinality_name(&self) -> &'static str {
        match self {
            ResourceLinkage::ToOne(_) => "to-one",
            ResourceLinkage::ToMany(_) => "to-many",
        }
    }
}

/// The three shapes a relationship can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    /// Links and/or meta only, no resource linkage.
    Relationship,
    /// Carries to-one resource linkage.
    ToOneRelationship,
    /// Carries to-many resource linkage.
    ToManyRelationship,
}

/// A relationship object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship links (`self`, `related`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    /// Resource linkage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResourceLinkage>,

    /// Relationship meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Relationship {
    /// Creates a relationship that only carries linkage.
    pub fn from_linkage(data: ResourceLinkage) -> Self {
        Self {
            links: None,
            data: Some(data),
            meta: None,
        }
    }

    /// Returns the shape of this relationship.
    pub fn relationship_type(&self) -> RelationshipType {
        match &self.data {
            None => RelationshipType::Relationship,
            Some(ResourceLinkage::ToOne(_)) => RelationshipType::ToOneRelationship,
            Some(ResourceLinkage::ToMany(_)) => RelationshipType::ToManyRelationship,
        }
    }

    /// Returns true when there are no links, data or meta.
    pub fn is_empty(&self) -> bool {
        self.links.as_ref().is_none_or(|l| l.is_empty())
            && self.data.is_none()
            && self.meta.is_none()
    }
}

/// A relationships object, keyed by relationship name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relationships(BTreeMap<String, Relationship>);

impl Relationships {
    /// Creates an empty relationships object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a relationship.
    pub fn insert(&mut self, rel: impl Into<String>, relationship: Relationship) {
        self.0.insert(rel.into(), relationship);
    }

    /// Returns a relationship by name.
    pub fn get(&self, rel: &str) -> Option<&Relationship> {
        self.0.get(rel)
    }

    /// Returns the number of relationships.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(rel, relationship)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Relationship)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Relationship)> for Relationships {
    fn from_iter<I: IntoIterator<Item = (String, Relationship)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person(id: &str) -> ResourceIdentifier {
        ResourceIdentifier::new("people", id)
    }

    #[test]
    fn test_linkage_serialization_shapes() {
        assert_eq!(
            serde_json::to_value(ResourceLinkage::null()).unwrap(),
            json!(null)
        );
        assert_eq!(
            serde_json::to_value(ResourceLinkage::to_one(person("9"))).unwrap(),
            json!({"type": "people", "id": "9"})
        );
        assert_eq!(
            serde_json::to_value(ResourceLinkage::to_many(vec![person("9")])).unwrap(),
            json!([{"type": "people", "id": "9"}])
        );
    }

    #[test]
    fn test_relationship_type() {
        assert_eq!(
            Relationship::default().relationship_type(),
            RelationshipType::Relationship
        );
        assert_eq!(
            Relationship::from_linkage(ResourceLinkage::null()).relationship_type(),
            RelationshipType::ToOneRelationship
        );
        assert_eq!(
            Relationship::from_linkage(ResourceLinkage::to_many(Vec::new())).relationship_type(),
            RelationshipType::ToManyRelationship
        );
        assert!(Relationship::default().is_empty());
    }
}
