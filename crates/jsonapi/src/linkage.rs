//! Linkage recorded by included-resource declarations.

use std::collections::BTreeMap;

use crate::api::{ResourceIdentifier, ResourceLinkage};
use crate::error::{BuildUsageError, LinkageConflictError, LinkageDisplay};

/// Key of a linkage record: the source resource and relationship name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkageKey {
    /// Identity of the resource the relationship belongs to.
    pub from: ResourceIdentifier,
    /// Relationship name.
    pub rel: String,
}

impl LinkageKey {
    /// Creates a key.
    pub fn new(from: ResourceIdentifier, rel: impl Into<String>) -> Self {
        Self {
            from: from.identity(),
            rel: rel.into(),
        }
    }
}

/// Map from `(resource, relationship)` to merged linkage.
///
/// A key holds exactly one record. Re-adding a key merges: equal to-one
/// linkage is idempotent, to-many linkage is unioned without duplicates.
/// Disagreeing to-one linkage keeps the first record and is reported as a
/// conflict when the key is read.
#[derive(Debug, Clone, Default)]
pub struct LinkageMap {
    records: BTreeMap<LinkageKey, ResourceLinkage>,
    conflicts: BTreeMap<LinkageKey, ResourceLinkage>,
}

impl LinkageMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or merges a record.
    pub fn add(&mut self, key: LinkageKey, linkage: ResourceLinkage) -> Result<(), BuildUsageError> {
        let Some(existing) = self.records.get_mut(&key) else {
            self.records.insert(key, linkage);
            return Ok(());
        };
        match (existing, linkage) {
            (ResourceLinkage::ToOne(current), ResourceLinkage::ToOne(incoming)) => {
                if *current != incoming {
                    self.conflicts
                        .entry(key)
                        .or_insert(ResourceLinkage::ToOne(incoming));
                }
            }
            (ResourceLinkage::ToMany(current), ResourceLinkage::ToMany(incoming)) => {
                for identifier in incoming {
                    if !current.contains(&identifier) {
                        current.push(identifier);
                    }
                }
            }
            _ => {
                return Err(BuildUsageError::LinkageCardinalityMismatch {
                    resource: key.from,
                    rel: key.rel,
                });
            }
        }
        Ok(())
    }

    /// Returns the record for a key.
    pub fn get(
        &self,
        from: &ResourceIdentifier,
        rel: &str,
    ) -> Result<Option<&ResourceLinkage>, LinkageConflictError> {
        let key = LinkageKey::new(from.clone(), rel);
        let record = self.records.get(&key);
        if let (Some(first), Some(second)) = (record, self.conflicts.get(&key)) {
            return Err(LinkageConflictError {
                resource: key.from,
                rel: key.rel,
                first: LinkageDisplay(first.clone()),
                second: LinkageDisplay(second.clone()),
            });
        }
        Ok(record)
    }

    /// Returns the relationship names that have records for a resource.
    pub fn rels_of<'a>(&'a self, from: &'a ResourceIdentifier) -> impl Iterator<Item = &'a str> + 'a {
        self.records
            .keys()
            .filter(move |key| &key.from == from)
            .map(|key| key.rel.as_str())
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> ResourceIdentifier {
        ResourceIdentifier::new("articles", "1")
    }

    fn comment(id: &str) -> ResourceIdentifier {
        ResourceIdentifier::new("comments", id)
    }

    #[test]
    fn test_to_one_readd_is_idempotent() {
        let mut map = LinkageMap::new();
        let author = ResourceLinkage::to_one(ResourceIdentifier::new("people", "9"));
        map.add(LinkageKey::new(article(), "author"), author.clone()).unwrap();
        map.add(LinkageKey::new(article(), "author"), author.clone()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&article(), "author").unwrap(), Some(&author));
    }

    #[test]
    fn test_to_many_readd_unions() {
        let mut map = LinkageMap::new();
        map.add(
            LinkageKey::new(article(), "comments"),
            ResourceLinkage::to_many(vec![comment("5"), comment("12")]),
        )
        .unwrap();
        map.add(
            LinkageKey::new(article(), "comments"),
            ResourceLinkage::to_many(vec![comment("12"), comment("13")]),
        )
        .unwrap();
        assert_eq!(
            map.get(&article(), "comments").unwrap(),
            Some(&ResourceLinkage::ToMany(vec![
                comment("5"),
                comment("12"),
                comment("13")
            ]))
        );
    }

    #[test]
    fn test_disagreeing_to_one_readd_conflicts_on_read() {
        let mut map = LinkageMap::new();
        map.add(
            LinkageKey::new(article(), "author"),
            ResourceLinkage::to_one(ResourceIdentifier::new("people", "9")),
        )
        .unwrap();
        map.add(
            LinkageKey::new(article(), "author"),
            ResourceLinkage::to_one(ResourceIdentifier::new("people", "2")),
        )
        .unwrap();

        let err = map.get(&article(), "author").unwrap_err();
        assert_eq!(err.resource, article());
        assert_eq!(err.rel, "author");
        assert_eq!(err.first.to_string(), "people/9");
        assert_eq!(err.second.to_string(), "people/2");
        assert_eq!(map.get(&article(), "comments").unwrap(), None);
    }

    #[test]
    fn test_null_against_identifier_conflicts() {
        let mut map = LinkageMap::new();
        map.add(LinkageKey::new(article(), "author"), ResourceLinkage::null())
            .unwrap();
        map.add(
            LinkageKey::new(article(), "author"),
            ResourceLinkage::to_one(ResourceIdentifier::new("people", "9")),
        )
        .unwrap();
        assert!(map.get(&article(), "author").is_err());
    }

    #[test]
    fn test_mixed_cardinality_is_usage_error() {
        let mut map = LinkageMap::new();
        map.add(LinkageKey::new(article(), "comments"), ResourceLinkage::null())
            .unwrap();
        let err = map
            .add(
                LinkageKey::new(article(), "comments"),
                ResourceLinkage::to_many(vec![comment("5")]),
            )
            .unwrap_err();
        assert!(matches!(err, BuildUsageError::LinkageCardinalityMismatch { .. }));
    }

    #[test]
    fn test_rels_of_resource() {
        let mut map = LinkageMap::new();
        map.add(LinkageKey::new(article(), "comments"), ResourceLinkage::to_many(Vec::new()))
            .unwrap();
        map.add(LinkageKey::new(article(), "author"), ResourceLinkage::null())
            .unwrap();
        map.add(LinkageKey::new(comment("5"), "author"), ResourceLinkage::null())
            .unwrap();
        let article = article();
        let rels: Vec<&str> = map.rels_of(&article).collect();
        assert_eq!(rels, vec!["author", "comments"]);
    }
}
