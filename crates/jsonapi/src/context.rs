//! Per-build state shared by every builder of one document.

use std::collections::HashMap;

use tracing::trace;
use url::Url;

use crate::api::{ResourceIdentifier, ResourceLinkage};
use crate::config::DocumentConfig;
use crate::dom::NodeId;
use crate::error::BuildResult;
use crate::hypermedia::PathStep;
use crate::linkage::{LinkageKey, LinkageMap};
use crate::query::QueryParameters;

/// State accumulated while one document is built.
///
/// Maps resource identities to the node added for them, so a resource is
/// inserted at most once however many builder chains present it, and
/// collects the linkage declared through included resources.
#[derive(Debug, Default)]
pub struct BuilderContext {
    resources: HashMap<ResourceIdentifier, NodeId>,
    linkage: LinkageMap,
    reached_by: HashMap<ResourceIdentifier, Vec<PathStep>>,
    request_url: Option<Url>,
    query: QueryParameters,
    sparse_fieldsets: bool,
    nested_paths: bool,
}

impl BuilderContext {
    /// Creates a context from a configuration.
    pub fn new(config: &DocumentConfig) -> BuildResult<Self> {
        let request_url = config.parsed_request_url()?;
        let query = request_url
            .as_ref()
            .map(QueryParameters::from_url)
            .unwrap_or_default();
        Ok(Self {
            request_url,
            query,
            sparse_fieldsets: config.sparse_fieldsets,
            nested_paths: config.nested_paths,
            ..Self::default()
        })
    }

    /// Records the node of a resource identity.
    ///
    /// Returns false, leaving the map untouched, if the identity already
    /// has a node. Callers must then skip attribute mapping.
    pub fn try_add_resource(&mut self, identifier: ResourceIdentifier, node: NodeId) -> bool {
        if self.resources.contains_key(&identifier) {
            trace!(resource = %identifier, "Resource already added");
            return false;
        }
        self.resources.insert(identifier.identity(), node);
        true
    }

    /// Returns the node of a resource identity.
    pub fn resource_node(&self, identifier: &ResourceIdentifier) -> Option<NodeId> {
        self.resources.get(identifier).copied()
    }

    /// Merges included-resource linkage into the linkage map.
    pub fn add_linkage(
        &mut self,
        from: &ResourceIdentifier,
        rel: &str,
        linkage: ResourceLinkage,
    ) -> BuildResult<()> {
        trace!(resource = %from, rel, "Recording included linkage");
        self.linkage.add(LinkageKey::new(from.clone(), rel), linkage)?;
        Ok(())
    }

    /// Returns the included linkage recorded for a resource relationship.
    ///
    /// Fails when included declarations gave disagreeing to-one linkage.
    pub fn try_get_linkage(
        &self,
        from: &ResourceIdentifier,
        rel: &str,
    ) -> BuildResult<Option<&ResourceLinkage>> {
        Ok(self.linkage.get(from, rel)?)
    }

    /// Returns the relationship names with recorded linkage for a resource.
    pub fn linkage_rels(&self, from: &ResourceIdentifier) -> Vec<String> {
        self.linkage.rels_of(from).map(str::to_string).collect()
    }

    /// Records the traversal a resource was first reached through.
    pub fn set_reached_by(&mut self, identifier: &ResourceIdentifier, steps: Vec<PathStep>) {
        self.reached_by
            .entry(identifier.identity())
            .or_insert(steps);
    }

    /// Returns the traversal a resource was first reached through.
    pub fn reached_by(&self, identifier: &ResourceIdentifier) -> &[PathStep] {
        self.reached_by
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the request URL.
    pub fn request_url(&self) -> Option<&Url> {
        self.request_url.as_ref()
    }

    /// Returns the parsed query parameters.
    pub fn query(&self) -> &QueryParameters {
        &self.query
    }

    /// Returns true if sparse fieldsets are honoured.
    pub fn sparse_fieldsets(&self) -> bool {
        self.sparse_fieldsets
    }

    /// Returns true if included resources get nested paths.
    pub fn nested_paths(&self) -> bool {
        self.nested_paths
    }

    /// Returns true if the field of the api type should be emitted.
    pub fn includes_field(&self, api_type: &str, field: &str) -> bool {
        !self.sparse_fieldsets || self.query.contains_field(api_type, field)
    }

    /// Returns the number of distinct resources added.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}
