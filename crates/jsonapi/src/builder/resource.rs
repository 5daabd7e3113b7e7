use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{
    BuilderMode, BuilderScope, DocumentState, LinksBuilder, RelationshipsBuilder,
    require_cardinality, require_count, sealed,
};
use crate::api::{Links, Meta, Relationships, ResourceIdentifier};
use crate::dom::{
    AttributeNode, LinksNode, NodeData, NodeId, NodeKind, ReadWriteResource, RelationshipsNode,
    ResourceNode,
};
use crate::error::{BuildResult, BuilderCardinality};
use crate::hypermedia::{PathStep, ResourcePathContextBuilder};
use crate::service_model::ResourceType;

/// How a resource entered the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceOrigin {
    Primary,
    Included,
}

struct ResourceTarget<T> {
    node: NodeId,
    object: Arc<T>,
    identifier: ResourceIdentifier,
    is_new: bool,
    path: ResourcePathContextBuilder,
}

/// Builds one resource or a collection of resources of the same type.
///
/// A resource that is already part of the document binds the builder to
/// the existing node; its attributes are mapped only once, by the builder
/// that added it.
pub struct ResourceBuilder<P, T> {
    parent: P,
    resource_type: Arc<ResourceType>,
    cardinality: BuilderCardinality,
    targets: Vec<ResourceTarget<T>>,
}

/// A [`ResourceBuilder`] bound to a collection.
pub type ResourceCollectionBuilder<P, T> = ResourceBuilder<P, T>;

impl<P, T> fmt::Debug for ResourceBuilder<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBuilder")
            .field("api_type", &self.resource_type.api_type())
            .field("cardinality", &self.cardinality)
            .field(
                "resources",
                &self
                    .targets
                    .iter()
                    .map(|t| &t.identifier)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<P: BuilderScope, T> sealed::Sealed for ResourceBuilder<P, T> {}

impl<P: BuilderScope, T> BuilderScope for ResourceBuilder<P, T> {
    fn state(&mut self) -> &mut DocumentState {
        self.parent.state()
    }
}

impl<P: BuilderScope, T: Any + Send + Sync> ResourceBuilder<P, T> {
    /// Binds primary resources, continuing the request path for resources
    /// of the request's primary type.
    pub(crate) fn start_primary(
        mut parent: P,
        container: NodeId,
        objects: Vec<T>,
        cardinality: BuilderCardinality,
    ) -> BuildResult<Self> {
        let steps = {
            let state = parent.state();
            let resource_type = state.service_model.resource_type_of::<T>()?;
            state
                .document_path
                .primary_steps(resource_type.api_type())
                .to_vec()
        };
        let items = objects
            .into_iter()
            .map(|object| (object, steps.clone()))
            .collect();
        Self::start(parent, container, items, cardinality, ResourceOrigin::Primary)
    }

    /// Binds resources below `container`, each reached through its steps.
    pub(crate) fn start(
        mut parent: P,
        container: NodeId,
        items: Vec<(T, Vec<PathStep>)>,
        cardinality: BuilderCardinality,
        origin: ResourceOrigin,
    ) -> BuildResult<Self> {
        let state = parent.state();
        let resource_type = state.service_model.resource_type_of::<T>()?.clone();

        let mut targets = Vec::with_capacity(items.len());
        for (object, steps) in items {
            let object = Arc::new(object);
            let identifier = resource_type.identifier(&*object)?;

            let node = match state.context.resource_node(&identifier) {
                Some(node) => node,
                None => {
                    let node = state.dom.add_child(
                        container,
                        NodeData::Resource(ResourceNode::ReadWrite(ReadWriteResource {
                            resource_type: resource_type.clone(),
                            object: object.clone(),
                            path_context: None,
                        })),
                    )?;
                    state
                        .dom
                        .add_child(node, NodeData::Type(identifier.api_type.clone()))?;
                    state
                        .dom
                        .add_child(node, NodeData::Id(identifier.api_id.clone()))?;
                    node
                }
            };
            let is_new = state.context.try_add_resource(identifier.clone(), node);
            if is_new {
                trace!(resource = %identifier, ?origin, "Added resource");
            } else {
                debug!(resource = %identifier, "Resource already in document, reusing node");
            }

            let path = ResourcePathContextBuilder::from_steps(&steps, true);
            if is_new {
                state.context.set_reached_by(&identifier, steps);
            }

            targets.push(ResourceTarget {
                node,
                object,
                identifier,
                is_new,
                path,
            });
        }

        Ok(Self {
            parent,
            resource_type,
            cardinality,
            targets,
        })
    }

    fn api_type(&self) -> &str {
        self.resource_type.api_type()
    }

    fn require(&self, operation: &'static str, expected: BuilderCardinality) -> BuildResult<()> {
        require_cardinality(
            NodeKind::Resource,
            self.api_type(),
            operation,
            expected,
            self.cardinality,
        )?;
        Ok(())
    }

    /// Sets the meta of the resource.
    ///
    /// Like attributes, meta belongs to the builder that added the
    /// resource; a resource already in the document keeps its meta.
    pub fn meta(mut self, meta: Meta) -> BuildResult<Self> {
        self.require("meta", BuilderCardinality::Single)?;
        let nodes = self.new_nodes();
        let dom = &mut self.parent.state().dom;
        for node in nodes {
            dom.set_child(node, NodeData::Meta(meta.clone()))?;
        }
        Ok(self)
    }

    /// Sets one meta value per resource of the collection.
    ///
    /// Values for resources already in the document are skipped.
    pub fn meta_each(mut self, metas: impl IntoIterator<Item = Meta>) -> BuildResult<Self> {
        self.require("meta_each", BuilderCardinality::Collection)?;
        let metas: Vec<Meta> = metas.into_iter().collect();
        require_count(
            NodeKind::Resource,
            self.api_type(),
            self.targets.len(),
            metas.len(),
        )?;
        let targets: Vec<(NodeId, bool)> = self.targets.iter().map(|t| (t.node, t.is_new)).collect();
        let dom = &mut self.parent.state().dom;
        for ((node, is_new), meta) in targets.into_iter().zip(metas) {
            if is_new {
                dom.set_child(node, NodeData::Meta(meta))?;
            }
        }
        Ok(self)
    }

    /// Starts declaring resource links.
    pub fn links(self) -> BuildResult<LinksBuilder<Self>> {
        let nodes = self.nodes();
        self.links_for(nodes)
    }

    /// Starts declaring resource links for the resources `predicate`
    /// accepts.
    pub fn links_if(self, predicate: impl Fn(&T) -> bool) -> BuildResult<LinksBuilder<Self>> {
        let nodes = self.nodes_where(predicate);
        self.links_for(nodes)
    }

    fn links_for(mut self, nodes: Vec<NodeId>) -> BuildResult<LinksBuilder<Self>> {
        let owner = self.api_type().to_string();
        let cardinality = self.cardinality;
        if nodes.is_empty() {
            return Ok(LinksBuilder::new(
                self,
                owner,
                cardinality,
                Vec::new(),
                BuilderMode::Inert,
            ));
        }
        let dom = &mut self.parent.state().dom;
        let mut containers = Vec::with_capacity(nodes.len());
        for node in nodes {
            containers.push(dom.get_or_add_child(node, NodeKind::Links, || {
                NodeData::Links(LinksNode::ReadWrite)
            })?);
        }
        Ok(LinksBuilder::new(
            self,
            owner,
            cardinality,
            containers,
            BuilderMode::Active,
        ))
    }

    /// Sets finished resource links; they are emitted verbatim.
    pub fn set_links(mut self, links: Links) -> BuildResult<Self> {
        self.require("set_links", BuilderCardinality::Single)?;
        let nodes = self.nodes();
        let dom = &mut self.parent.state().dom;
        for node in nodes {
            dom.set_child(node, NodeData::Links(LinksNode::ReadOnly(links.clone())))?;
        }
        Ok(self)
    }

    /// Starts declaring relationships.
    pub fn relationships(mut self) -> BuildResult<RelationshipsBuilder<Self, T>> {
        let bound: Vec<(NodeId, Arc<T>)> = self
            .targets
            .iter()
            .map(|t| (t.node, t.object.clone()))
            .collect();
        let resource_type = self.resource_type.clone();
        let cardinality = self.cardinality;

        let dom = &mut self.parent.state().dom;
        let mut items = Vec::with_capacity(bound.len());
        for (node, object) in bound {
            let container = dom.get_or_add_child(node, NodeKind::Relationships, || {
                NodeData::Relationships(RelationshipsNode::ReadWrite)
            })?;
            items.push((container, object));
        }
        Ok(RelationshipsBuilder::new(
            self,
            resource_type,
            cardinality,
            items,
        ))
    }

    /// Sets finished relationships; they are emitted verbatim.
    pub fn set_relationships(mut self, relationships: Relationships) -> BuildResult<Self> {
        self.require("set_relationships", BuilderCardinality::Single)?;
        let nodes = self.nodes();
        let dom = &mut self.parent.state().dom;
        for node in nodes {
            dom.set_child(
                node,
                NodeData::Relationships(RelationshipsNode::ReadOnly(relationships.clone())),
            )?;
        }
        Ok(self)
    }

    /// Appends a literal segment to the self and canonical paths, before
    /// the segment of the resource itself.
    pub fn path_segment(mut self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        for target in &mut self.targets {
            let segment = segment.clone();
            target
                .path
                .add_path_action(move |path| path.add_literal_path(segment));
        }
        self
    }

    /// Maps attributes, fixes path contexts and returns to the parent.
    pub fn resource_end(self) -> BuildResult<P> {
        let Self {
            mut parent,
            resource_type,
            targets,
            ..
        } = self;
        let state = parent.state();

        for target in targets {
            if !target.is_new {
                continue;
            }

            let path_context = target
                .path
                .build(&resource_type, Some(target.identifier.api_id.clone()));

            let attributes = resource_type.map_attributes(&*target.object, |field| {
                state.context.includes_field(resource_type.api_type(), field)
            })?;
            if !attributes.is_empty() {
                let container = state.dom.add_child(target.node, NodeData::Attributes)?;
                for (name, value) in attributes {
                    state
                        .dom
                        .add_child(container, NodeData::Attribute(AttributeNode { name, value }))?;
                }
            }

            if let NodeData::Resource(ResourceNode::ReadWrite(resource)) =
                state.dom.get_mut(target.node)?
            {
                resource.path_context = Some(path_context);
            }
        }
        Ok(parent)
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.targets.iter().map(|t| t.node).collect()
    }

    fn new_nodes(&self) -> Vec<NodeId> {
        self.targets
            .iter()
            .filter(|t| t.is_new)
            .map(|t| t.node)
            .collect()
    }

    fn nodes_where(&self, predicate: impl Fn(&T) -> bool) -> Vec<NodeId> {
        self.targets
            .iter()
            .filter(|t| predicate(&t.object))
            .map(|t| t.node)
            .collect()
    }
}
