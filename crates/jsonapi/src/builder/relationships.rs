use std::fmt;
use std::sync::Arc;

use super::{
    BuilderMode, BuilderScope, DocumentState, LinksBuilder, require_cardinality, require_count,
    sealed,
};
use crate::api::{Meta, ResourceIdentifier, ResourceLinkage};
use crate::dom::{LinksNode, NodeData, NodeId, NodeKind, RelationshipNode};
use crate::error::{BuildResult, BuildUsageError, BuilderCardinality};
use crate::service_model::{RelationshipCardinality, RelationshipInfo, ResourceType};

/// Declares relationships of the resources bound to a resource builder.
pub struct RelationshipsBuilder<P, T> {
    parent: P,
    resource_type: Arc<ResourceType>,
    cardinality: BuilderCardinality,
    items: Vec<(NodeId, Arc<T>)>,
}

impl<P, T> fmt::Debug for RelationshipsBuilder<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipsBuilder")
            .field("api_type", &self.resource_type.api_type())
            .field("cardinality", &self.cardinality)
            .field("resources", &self.items.len())
            .finish()
    }
}

impl<P: BuilderScope, T> sealed::Sealed for RelationshipsBuilder<P, T> {}

impl<P: BuilderScope, T> BuilderScope for RelationshipsBuilder<P, T> {
    fn state(&mut self) -> &mut DocumentState {
        self.parent.state()
    }
}

impl<P: BuilderScope, T> RelationshipsBuilder<P, T> {
    pub(crate) fn new(
        parent: P,
        resource_type: Arc<ResourceType>,
        cardinality: BuilderCardinality,
        items: Vec<(NodeId, Arc<T>)>,
    ) -> Self {
        Self {
            parent,
            resource_type,
            cardinality,
            items,
        }
    }

    /// Starts declaring a relationship of every bound resource.
    ///
    /// Fails if the resource type does not declare `rel`.
    pub fn relationship(self, rel: &str) -> BuildResult<RelationshipBuilder<Self>> {
        let info = self.resource_type.relationship(rel)?.clone();
        let containers = self.items.iter().map(|(c, _)| *c).collect();
        self.relationship_in(info, containers)
    }

    /// Starts declaring a relationship of the resources `predicate`
    /// accepts. When none does, the returned builder is inert.
    pub fn relationship_if(
        self,
        rel: &str,
        predicate: impl Fn(&T) -> bool,
    ) -> BuildResult<RelationshipBuilder<Self>> {
        let info = self.resource_type.relationship(rel)?.clone();
        let containers = self
            .items
            .iter()
            .filter(|(_, object)| predicate(object))
            .map(|(c, _)| *c)
            .collect();
        self.relationship_in(info, containers)
    }

    fn relationship_in(
        mut self,
        info: RelationshipInfo,
        containers: Vec<NodeId>,
    ) -> BuildResult<RelationshipBuilder<Self>> {
        let api_type = self.resource_type.api_type().to_string();
        let cardinality = self.cardinality;
        if containers.is_empty() {
            return Ok(RelationshipBuilder::new(
                self,
                api_type,
                info,
                cardinality,
                Vec::new(),
                BuilderMode::Inert,
            ));
        }

        let dom = &mut self.parent.state().dom;
        let mut targets = Vec::with_capacity(containers.len());
        for container in containers {
            let existing = dom.find_child(container, |data| {
                matches!(data, NodeData::Relationship(node) if node.rel == info.rel)
            });
            let node = match existing {
                Some(node) => node,
                None => dom.add_child(
                    container,
                    NodeData::Relationship(RelationshipNode {
                        rel: info.rel.clone(),
                        linkage: None,
                    }),
                )?,
            };
            targets.push(node);
        }
        Ok(RelationshipBuilder::new(
            self,
            api_type,
            info,
            cardinality,
            targets,
            BuilderMode::Active,
        ))
    }

    /// Returns to the resource builder.
    pub fn relationships_end(self) -> P {
        self.parent
    }
}

/// Declares one relationship: its linkage, links and meta.
pub struct RelationshipBuilder<P> {
    parent: P,
    api_type: String,
    info: RelationshipInfo,
    cardinality: BuilderCardinality,
    targets: Vec<NodeId>,
    mode: BuilderMode,
}

impl<P> fmt::Debug for RelationshipBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipBuilder")
            .field("api_type", &self.api_type)
            .field("rel", &self.info.rel)
            .field("cardinality", &self.cardinality)
            .field("targets", &self.targets.len())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<P: BuilderScope> sealed::Sealed for RelationshipBuilder<P> {}

impl<P: BuilderScope> BuilderScope for RelationshipBuilder<P> {
    fn state(&mut self) -> &mut DocumentState {
        self.parent.state()
    }
}

impl<P: BuilderScope> RelationshipBuilder<P> {
    fn new(
        parent: P,
        api_type: String,
        info: RelationshipInfo,
        cardinality: BuilderCardinality,
        targets: Vec<NodeId>,
        mode: BuilderMode,
    ) -> Self {
        Self {
            parent,
            api_type,
            info,
            cardinality,
            targets,
            mode,
        }
    }

    fn is_inert(&self) -> bool {
        self.mode == BuilderMode::Inert
    }

    fn require(&self, operation: &'static str, expected: BuilderCardinality) -> BuildResult<()> {
        require_cardinality(
            NodeKind::Relationship,
            &self.api_type,
            operation,
            expected,
            self.cardinality,
        )?;
        Ok(())
    }

    fn require_declared(&self, given: RelationshipCardinality) -> BuildResult<()> {
        if self.info.cardinality != given {
            return Err(BuildUsageError::RelationshipCardinalityMismatch {
                api_type: self.api_type.clone(),
                rel: self.info.rel.clone(),
                declared: self.info.cardinality.as_str(),
                given: given.as_str(),
            }
            .into());
        }
        Ok(())
    }

    fn set_linkage(&mut self, node: NodeId, linkage: ResourceLinkage) -> BuildResult<()> {
        if let NodeData::Relationship(relationship) = self.parent.state().dom.get_mut(node)? {
            relationship.linkage = Some(linkage);
        }
        Ok(())
    }

    /// Starts declaring relationship links.
    pub fn links(mut self) -> BuildResult<LinksBuilder<Self>> {
        let owner = format!("{}.{}", self.api_type, self.info.rel);
        let cardinality = self.cardinality;
        if self.is_inert() {
            return Ok(LinksBuilder::new(
                self,
                owner,
                cardinality,
                Vec::new(),
                BuilderMode::Inert,
            ));
        }

        let targets = self.targets.clone();
        let dom = &mut self.parent.state().dom;
        let mut containers = Vec::with_capacity(targets.len());
        for node in targets {
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

    /// Sets the relationship meta.
    pub fn meta(mut self, meta: Meta) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("meta", BuilderCardinality::Single)?;
        let targets = self.targets.clone();
        let dom = &mut self.parent.state().dom;
        for node in targets {
            dom.set_child(node, NodeData::Meta(meta.clone()))?;
        }
        Ok(self)
    }

    /// Sets one relationship meta value per bound resource.
    pub fn meta_each(mut self, metas: impl IntoIterator<Item = Meta>) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("meta_each", BuilderCardinality::Collection)?;
        let metas: Vec<Meta> = metas.into_iter().collect();
        require_count(
            NodeKind::Relationship,
            &self.api_type,
            self.targets.len(),
            metas.len(),
        )?;
        let targets = self.targets.clone();
        let dom = &mut self.parent.state().dom;
        for (node, meta) in targets.into_iter().zip(metas) {
            dom.set_child(node, NodeData::Meta(meta))?;
        }
        Ok(self)
    }

    /// Sets to-one linkage; `None` emits `"data": null`.
    pub fn data(mut self, identifier: Option<ResourceIdentifier>) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("data", BuilderCardinality::Single)?;
        self.require_declared(RelationshipCardinality::ToOne)?;
        for node in self.targets.clone() {
            self.set_linkage(node, ResourceLinkage::ToOne(identifier.clone()))?;
        }
        Ok(self)
    }

    /// Sets to-many linkage.
    pub fn data_many(
        mut self,
        identifiers: impl IntoIterator<Item = ResourceIdentifier>,
    ) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("data_many", BuilderCardinality::Single)?;
        self.require_declared(RelationshipCardinality::ToMany)?;
        let linkage = ResourceLinkage::to_many(identifiers);
        for node in self.targets.clone() {
            self.set_linkage(node, linkage.clone())?;
        }
        Ok(self)
    }

    /// Sets to-one linkage per bound resource.
    pub fn data_each(
        mut self,
        identifiers: impl IntoIterator<Item = Option<ResourceIdentifier>>,
    ) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("data_each", BuilderCardinality::Collection)?;
        self.require_declared(RelationshipCardinality::ToOne)?;
        let identifiers: Vec<_> = identifiers.into_iter().collect();
        require_count(
            NodeKind::Relationship,
            &self.api_type,
            self.targets.len(),
            identifiers.len(),
        )?;
        for (node, identifier) in self.targets.clone().into_iter().zip(identifiers) {
            self.set_linkage(node, ResourceLinkage::ToOne(identifier))?;
        }
        Ok(self)
    }

    /// Sets to-many linkage per bound resource.
    pub fn data_many_each(
        mut self,
        identifiers: impl IntoIterator<Item = Vec<ResourceIdentifier>>,
    ) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("data_many_each", BuilderCardinality::Collection)?;
        self.require_declared(RelationshipCardinality::ToMany)?;
        let identifiers: Vec<_> = identifiers.into_iter().collect();
        require_count(
            NodeKind::Relationship,
            &self.api_type,
            self.targets.len(),
            identifiers.len(),
        )?;
        for (node, identifiers) in self.targets.clone().into_iter().zip(identifiers) {
            self.set_linkage(node, ResourceLinkage::to_many(identifiers))?;
        }
        Ok(self)
    }

    /// Returns to the relationships builder.
    pub fn relationship_end(self) -> P {
        self.parent
    }
}
