//! Hypermedia assembly: turning path contexts into links and relationships.

use tracing::trace;

use super::document_path::DocumentPathContext;
use super::path::ResourcePathContext;
use crate::api::{keywords, DocumentType, Link, Links, Meta, Relationship, ResourceLinkage};
use crate::error::BuildResult;
use crate::service_model::RelationshipInfo;

/// A link requested by the builders.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkContext {
    /// Link relation name.
    pub rel: String,
    /// Explicit target; generated from the path context when absent.
    pub href: Option<String>,
    /// Link meta.
    pub meta: Option<Meta>,
}

impl LinkContext {
    /// Creates a context for a generated link.
    pub fn new(rel: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: None,
            meta: None,
        }
    }
}

/// A relationship to resolve.
#[derive(Debug, Clone)]
pub struct RelationshipContext<'a> {
    /// Relationship metadata.
    pub info: &'a RelationshipInfo,
    /// Merged linkage, if any.
    pub linkage: Option<ResourceLinkage>,
    /// Requested relationship links.
    pub links: Vec<LinkContext>,
    /// Relationship meta.
    pub meta: Option<Meta>,
}

/// Produces links and relationships from path contexts.
///
/// Returning `Ok(None)` omits the link or relationship from the document.
pub trait HypermediaAssembler: Send + Sync {
    /// Resolves a resource-level link.
    fn create_resource_link(
        &self,
        document: &DocumentPathContext,
        resource: &ResourcePathContext,
        link: &LinkContext,
    ) -> BuildResult<Option<Link>>;

    /// Resolves a relationship of a resource.
    fn create_resource_relationship(
        &self,
        document: &DocumentPathContext,
        resource: &ResourcePathContext,
        relationship: &RelationshipContext<'_>,
    ) -> BuildResult<Option<Relationship>>;

    /// Resolves a document-level link.
    fn create_document_link(
        &self,
        document: &DocumentPathContext,
        document_type: DocumentType,
        link: &LinkContext,
    ) -> BuildResult<Option<Link>>;
}

/// Assembler producing the standard JSON:API links.
///
/// | Owner | `rel` | href |
/// |-------|-------|------|
/// | resource | `self` | self path of the resource |
/// | resource | `canonical` | canonical path of the resource |
/// | relationship | `self` | `{resource self}/relationships/{rel}` |
/// | relationship | `related` | `{resource self}/{rel}` |
/// | document | `self` | the request URL |
///
/// Links with an explicit href are emitted verbatim. Other relation names
/// without an href are omitted, as are relationships left without links,
/// data and meta.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHypermediaAssembler;

impl DefaultHypermediaAssembler {
    fn explicit(link: &LinkContext) -> Option<Link> {
        link.href.as_ref().map(|href| Link {
            href: href.clone(),
            meta: link.meta.clone(),
        })
    }

    fn generated(href: String, link: &LinkContext) -> Link {
        Link {
            href,
            meta: link.meta.clone(),
        }
    }
}

impl HypermediaAssembler for DefaultHypermediaAssembler {
    fn create_resource_link(
        &self,
        document: &DocumentPathContext,
        resource: &ResourcePathContext,
        link: &LinkContext,
    ) -> BuildResult<Option<Link>> {
        if let Some(explicit) = Self::explicit(link) {
            return Ok(Some(explicit));
        }
        let segments = match link.rel.as_str() {
            keywords::SELF => resource.self_segments(),
            keywords::CANONICAL => resource.canonical_segments(),
            other => {
                trace!(rel = other, "No resource link for relation without href");
                return Ok(None);
            }
        };
        Ok(Some(Self::generated(document.url(&segments)?, link)))
    }

    fn create_resource_relationship(
        &self,
        document: &DocumentPathContext,
        resource: &ResourcePathContext,
        relationship: &RelationshipContext<'_>,
    ) -> BuildResult<Option<Relationship>> {
        let rel_segment = relationship.info.api_rel_path_segment.as_str();
        let mut links = Links::new();
        for link in &relationship.links {
            if let Some(explicit) = Self::explicit(link) {
                links.insert(link.rel.clone(), explicit);
                continue;
            }
            let segments = match link.rel.as_str() {
                keywords::SELF => resource.relationship_segments(rel_segment),
                keywords::RELATED => resource.related_segments(rel_segment),
                other => {
                    trace!(
                        rel = relationship.info.rel.as_str(),
                        link = other,
                        "No relationship link for relation without href"
                    );
                    continue;
                }
            };
            links.insert(
                link.rel.clone(),
                Self::generated(document.url(&segments)?, link),
            );
        }

        let resolved = Relationship {
            links: (!links.is_empty()).then_some(links),
            data: relationship.linkage.clone(),
            meta: relationship.meta.clone(),
        };
        if resolved.is_empty() {
            return Ok(None);
        }
        Ok(Some(resolved))
    }

    fn create_document_link(
        &self,
        document: &DocumentPathContext,
        _document_type: DocumentType,
        link: &LinkContext,
    ) -> BuildResult<Option<Link>> {
        if let Some(explicit) = Self::explicit(link) {
            return Ok(Some(explicit));
        }
        match (link.rel.as_str(), document.request_url()) {
            (keywords::SELF, Some(url)) => Ok(Some(Self::generated(url.to_string(), link))),
            (rel, _) => {
                trace!(rel, "No document link for relation without href");
                Ok(None)
            }
        }
    }
}
