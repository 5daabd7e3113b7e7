//! Document resolution and compaction.
//!
//! Runs once, when a document is written, in a fixed phase order:
//!
//! 1. Resources of resource-bearing documents get their relationships and
//!    links from the [`HypermediaAssembler`]; direct linkage is merged with
//!    linkage recorded through included resources.
//! 2. Relationships outside an active sparse fieldset are reduced to their
//!    linkage or removed.
//! 3. Resources and resource identifiers are frozen in place.
//! 4. Included resources are sorted by type, then id.
//! 5. Document links are resolved and errors are frozen.
//!
//! After the last phase no read-write node is left in the tree.

mod compact;

pub(crate) use compact::compact_node;

use tracing::{debug, trace, warn};

use crate::api::{
    Link, Links, Meta, Relationship, RelationshipType, Relationships, ResourceIdentifier,
    ResourceLinkage,
};
use crate::builder::DocumentState;
use crate::context::BuilderContext;
use crate::dom::{
    DomTree, IncludedNode, LinksNode, NodeData, NodeId, NodeKind, RelationshipNode,
    RelationshipsNode, ResourceNode,
};
use crate::error::{
    BuildResult, BuildUsageError, InternalError, LinkageConflictError, LinkageDisplay,
};
use crate::hypermedia::{
    DocumentPathContext, HypermediaAssembler, LinkContext, RelationshipContext,
    ResourcePathContext,
};
use crate::service_model::ResourceType;

/// Resolves and compacts the tree of one document.
pub(crate) struct DocumentResolver<'a> {
    dom: &'a mut DomTree,
    context: &'a BuilderContext,
    document_path: &'a DocumentPathContext,
    assembler: &'a dyn HypermediaAssembler,
}

impl<'a> DocumentResolver<'a> {
    pub(crate) fn new(state: &'a mut DocumentState, assembler: &'a dyn HypermediaAssembler) -> Self {
        Self {
            dom: &mut state.dom,
            context: &state.context,
            document_path: &state.document_path,
            assembler,
        }
    }

    /// Runs every phase.
    pub(crate) fn resolve(mut self) -> BuildResult<()> {
        let document_type = self.dom.document_type();
        debug!(%document_type, nodes = self.dom.subtree_len(self.dom.root()), "Resolving document");

        if document_type.is_resource_bearing() {
            self.resolve_resources()?;
            if self.context.sparse_fieldsets() {
                self.prune_sparse_fieldsets()?;
            }
        }
        if document_type.is_resource_bearing() || document_type.is_identifier_bearing() {
            self.compact_data()?;
        }
        if document_type.is_resource_bearing() {
            self.sort_included()?;
        }
        self.resolve_document()?;

        debug!(%document_type, "Resolved document");
        Ok(())
    }

    /// Containers of primary data, then the included container.
    fn containers(&self) -> Vec<NodeId> {
        let root = self.dom.root();
        [NodeKind::Data, NodeKind::DataCollection, NodeKind::Included]
            .into_iter()
            .flat_map(|kind| self.dom.children_of_kind(root, kind))
            .collect()
    }

    /// Read-write resources in primary-then-included order.
    fn read_write_resources(&self) -> Vec<NodeId> {
        self.containers()
            .into_iter()
            .filter(|container| !self.dom.is_read_only(*container))
            .flat_map(|container| self.dom.children_of_kind(container, NodeKind::Resource))
            .filter(|node| !self.dom.is_read_only(*node))
            .collect()
    }

    fn identifier_of(&self, node: NodeId) -> Result<ResourceIdentifier, InternalError> {
        let text = |kind| {
            self.dom
                .child(node, kind)
                .and_then(|child| match self.dom.get(child) {
                    NodeData::Type(text) | NodeData::Id(text) => Some(text.clone()),
                    _ => None,
                })
                .ok_or(InternalError::MissingChild {
                    parent: NodeKind::Resource,
                    child: kind,
                })
        };
        Ok(ResourceIdentifier::new(
            text(NodeKind::Type)?,
            text(NodeKind::Id)?,
        ))
    }

    fn resolve_resources(&mut self) -> BuildResult<()> {
        let resources = self.read_write_resources();
        debug!(resources = resources.len(), "Resolving resource hypermedia");
        for node in resources {
            self.resolve_resource(node)?;
        }
        Ok(())
    }

    fn resolve_resource(&mut self, node: NodeId) -> BuildResult<()> {
        let (resource_type, path) = match self.dom.get(node) {
            NodeData::Resource(ResourceNode::ReadWrite(resource)) => {
                (resource.resource_type.clone(), resource.path_context.clone())
            }
            _ => return Ok(()),
        };
        let identifier = self.identifier_of(node)?;
        let path = path.ok_or_else(|| InternalError::MissingPathContext {
            resource: identifier.clone(),
        })?;
        trace!(resource = %identifier, "Resolving resource");

        self.resolve_relationships(node, &resource_type, &identifier, &path)?;

        let assembler = self.assembler;
        let document_path = self.document_path;
        resolve_links(self.dom, node, |link| {
            assembler.create_resource_link(document_path, &path, link)
        })
    }

    fn resolve_relationships(
        &mut self,
        node: NodeId,
        resource_type: &ResourceType,
        identifier: &ResourceIdentifier,
        path: &ResourcePathContext,
    ) -> BuildResult<()> {
        let included_rels = self.context.linkage_rels(identifier);
        let existing = self.dom.child(node, NodeKind::Relationships);

        if let Some(container) = existing
            && self.dom.is_read_only(container)
        {
            if !included_rels.is_empty() {
                warn!(
                    resource = %identifier,
                    rels = ?included_rels,
                    "Relationships were set verbatim; included linkage is not merged into them"
                );
            }
            return Ok(());
        }
        if existing.is_none() && included_rels.is_empty() {
            return Ok(());
        }

        let container = self.dom.get_or_add_child(node, NodeKind::Relationships, || {
            NodeData::Relationships(RelationshipsNode::ReadWrite)
        })?;
        for rel in included_rels {
            let declared = self.dom.find_child(container, |data| {
                matches!(data, NodeData::Relationship(relationship) if relationship.rel == rel)
            });
            if declared.is_none() {
                trace!(resource = %identifier, rel = rel.as_str(), "Adding relationship from included linkage");
                self.dom.add_child(
                    container,
                    NodeData::Relationship(RelationshipNode { rel, linkage: None }),
                )?;
            }
        }

        let mut resolved = Relationships::new();
        for child in self.dom.children(container).to_vec() {
            let (rel, direct) = match self.dom.get(child) {
                NodeData::Relationship(relationship) => {
                    (relationship.rel.clone(), relationship.linkage.clone())
                }
                other => {
                    return Err(InternalError::UnexpectedNodeKind {
                        expected: NodeKind::Relationship,
                        found: other.kind(),
                    }
                    .into());
                }
            };

            let info = resource_type.relationship(&rel)?;
            let included = self.context.try_get_linkage(identifier, &rel)?.cloned();
            let linkage = merge_linkage(identifier, &rel, direct, included)?;
            if let Some(linkage) = &linkage
                && linkage.is_to_one() != info.is_to_one()
            {
                return Err(BuildUsageError::RelationshipCardinalityMismatch {
                    api_type: resource_type.api_type().to_string(),
                    rel,
                    declared: info.cardinality.as_str(),
                    given: linkage.cardinality_name(),
                }
                .into());
            }

            let relationship = RelationshipContext {
                info,
                linkage,
                links: owned_link_contexts(self.dom, child)?,
                meta: meta_of(self.dom, child),
            };
            match self.assembler.create_resource_relationship(
                self.document_path,
                path,
                &relationship,
            )? {
                Some(value) => {
                    resolved.insert(rel, value);
                }
                None => {
                    trace!(resource = %identifier, rel = rel.as_str(), "Relationship omitted");
                }
            }
        }

        if resolved.is_empty() {
            self.dom.remove_child(node, container)?;
        } else {
            self.dom.replace_child(
                node,
                container,
                NodeData::Relationships(RelationshipsNode::ReadOnly(resolved)),
            )?;
        }
        Ok(())
    }

    fn prune_sparse_fieldsets(&mut self) -> BuildResult<()> {
        let context = self.context;
        let query = context.query();
        for node in self.read_write_resources() {
            let identifier = self.identifier_of(node)?;
            let api_type = identifier.api_type.as_str();
            if !query.is_restricted(api_type) {
                continue;
            }
            let Some(container) = self.dom.child(node, NodeKind::Relationships) else {
                continue;
            };
            let relationships = match self.dom.get(container) {
                NodeData::Relationships(RelationshipsNode::ReadOnly(relationships)) => {
                    relationships
                }
                other => {
                    return Err(InternalError::UnresolvedNode {
                        kind: other.kind(),
                        phase: "sparse fieldset pruning",
                    }
                    .into());
                }
            };

            let mut pruned = Relationships::new();
            for (rel, relationship) in relationships.iter() {
                if query.contains_field(api_type, rel) {
                    pruned.insert(rel.clone(), relationship.clone());
                    continue;
                }
                match relationship.relationship_type() {
                    RelationshipType::ToOneRelationship | RelationshipType::ToManyRelationship => {
                        trace!(resource = %identifier, rel = rel.as_str(), "Reducing unrequested relationship to linkage");
                        pruned.insert(
                            rel.clone(),
                            Relationship {
                                links: None,
                                meta: None,
                                ..relationship.clone()
                            },
                        );
                    }
                    RelationshipType::Relationship => {
                        debug!(resource = %identifier, rel = rel.as_str(), "Removing unrequested relationship");
                    }
                }
            }

            if pruned.is_empty() {
                self.dom.remove_child(node, container)?;
            } else {
                self.dom.replace_child(
                    node,
                    container,
                    NodeData::Relationships(RelationshipsNode::ReadOnly(pruned)),
                )?;
            }
        }
        Ok(())
    }

    fn compact_data(&mut self) -> BuildResult<()> {
        for container in self.containers() {
            if self.dom.is_read_only(container) {
                continue;
            }
            for node in self.dom.children(container).to_vec() {
                compact_node(self.dom, container, node)?;
            }
        }
        debug!("Compacted primary data and included resources");
        Ok(())
    }

    fn sort_included(&mut self) -> BuildResult<()> {
        let root = self.dom.root();
        let Some(included) = self.dom.child(root, NodeKind::Included) else {
            return Ok(());
        };
        if self.dom.is_read_only(included) {
            return Ok(());
        }

        let mut resources = Vec::new();
        for child in self.dom.children(included) {
            match self.dom.get(*child) {
                NodeData::Resource(ResourceNode::ReadOnly(resource)) => {
                    resources.push(resource.clone())
                }
                other => {
                    return Err(InternalError::UnresolvedNode {
                        kind: other.kind(),
                        phase: "included sort",
                    }
                    .into());
                }
            }
        }
        resources.sort_by_key(|resource| resource.identifier());
        debug!(included = resources.len(), "Sorted included resources");

        self.dom.replace_child(
            root,
            included,
            NodeData::Included(IncludedNode::ReadOnly(resources)),
        )?;
        Ok(())
    }

    fn resolve_document(&mut self) -> BuildResult<()> {
        let root = self.dom.root();
        let document_type = self.dom.document_type();
        let assembler = self.assembler;
        let document_path = self.document_path;
        resolve_links(self.dom, root, |link| {
            assembler.create_document_link(document_path, document_type, link)
        })?;

        if let Some(errors) = self.dom.child(root, NodeKind::Errors) {
            compact_node(self.dom, root, errors)?;
        }
        Ok(())
    }
}

/// Merges linkage given through a relationship builder with linkage
/// recorded through included resources.
///
/// Equal to-one linkage is accepted, disagreeing to-one linkage is a
/// conflict, and to-many linkage is unioned in direct-then-included order.
pub(crate) fn merge_linkage(
    resource: &ResourceIdentifier,
    rel: &str,
    direct: Option<ResourceLinkage>,
    included: Option<ResourceLinkage>,
) -> BuildResult<Option<ResourceLinkage>> {
    match (direct, included) {
        (None, None) => Ok(None),
        (Some(linkage), None) | (None, Some(linkage)) => Ok(Some(linkage)),
        (Some(ResourceLinkage::ToOne(direct)), Some(ResourceLinkage::ToOne(included))) => {
            if direct != included {
                return Err(LinkageConflictError {
                    resource: resource.identity(),
                    rel: rel.to_string(),
                    first: LinkageDisplay(ResourceLinkage::ToOne(direct)),
                    second: LinkageDisplay(ResourceLinkage::ToOne(included)),
                }
                .into());
            }
            Ok(Some(ResourceLinkage::ToOne(direct)))
        }
        (Some(ResourceLinkage::ToMany(mut direct)), Some(ResourceLinkage::ToMany(included))) => {
            for identifier in included {
                if !direct.contains(&identifier) {
                    direct.push(identifier);
                }
            }
            Ok(Some(ResourceLinkage::ToMany(direct)))
        }
        _ => Err(BuildUsageError::LinkageCardinalityMismatch {
            resource: resource.identity(),
            rel: rel.to_string(),
        }
        .into()),
    }
}

/// Resolves the read-write links container of `owner` through `create`.
///
/// Omitted links are dropped; an empty result removes the container.
fn resolve_links(
    dom: &mut DomTree,
    owner: NodeId,
    create: impl Fn(&LinkContext) -> BuildResult<Option<Link>>,
) -> BuildResult<()> {
    let Some(container) = dom.child(owner, NodeKind::Links) else {
        return Ok(());
    };
    if dom.is_read_only(container) {
        return Ok(());
    }

    let mut resolved = Links::new();
    for link in link_contexts(dom, container)? {
        match create(&link)? {
            Some(value) => {
                resolved.insert(link.rel, value);
            }
            None => {
                trace!(rel = link.rel.as_str(), "Link omitted");
            }
        }
    }

    if resolved.is_empty() {
        dom.remove_child(owner, container)?;
    } else {
        dom.replace_child(owner, container, NodeData::Links(LinksNode::ReadOnly(resolved)))?;
    }
    Ok(())
}

/// Link requests of the links child of `owner`, if any.
fn owned_link_contexts(dom: &DomTree, owner: NodeId) -> Result<Vec<LinkContext>, InternalError> {
    match dom.child(owner, NodeKind::Links) {
        Some(container) => link_contexts(dom, container),
        None => Ok(Vec::new()),
    }
}

fn link_contexts(dom: &DomTree, container: NodeId) -> Result<Vec<LinkContext>, InternalError> {
    match dom.get(container) {
        NodeData::Links(LinksNode::ReadOnly(links)) => Ok(links
            .iter()
            .map(|(rel, link)| LinkContext {
                rel: rel.clone(),
                href: Some(link.href.clone()),
                meta: link.meta.clone(),
            })
            .collect()),
        NodeData::Links(LinksNode::ReadWrite) => dom
            .children(container)
            .iter()
            .map(|child| match dom.get(*child) {
                NodeData::Link(link) => Ok(LinkContext {
                    rel: link.rel.clone(),
                    href: dom
                        .child(*child, NodeKind::HRef)
                        .and_then(|href| match dom.get(href) {
                            NodeData::HRef(href) => Some(href.clone()),
                            _ => None,
                        }),
                    meta: meta_of(dom, *child),
                }),
                other => Err(InternalError::UnexpectedNodeKind {
                    expected: NodeKind::Link,
                    found: other.kind(),
                }),
            })
            .collect(),
        other => Err(InternalError::UnexpectedNodeKind {
            expected: NodeKind::Links,
            found: other.kind(),
        }),
    }
}

fn meta_of(dom: &DomTree, node: NodeId) -> Option<Meta> {
    dom.child(node, NodeKind::Meta)
        .and_then(|meta| match dom.get(meta) {
            NodeData::Meta(meta) => Some(meta.clone()),
            _ => None,
        })
}
