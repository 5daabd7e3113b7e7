use std::fmt;

use super::{
    BuilderMode, BuilderScope, DocumentState, require_cardinality, require_count, sealed,
};
use crate::api::{Meta, keywords};
use crate::dom::{LinkNode, NodeData, NodeId, NodeKind};
use crate::error::{BuildResult, BuilderCardinality};

/// Declares links of a document, resource or relationship.
///
/// A link is only a request here: its href is generated during resolution
/// unless one is given explicitly. Adding a link with a relation name that
/// is already present replaces it.
pub struct LinksBuilder<P> {
    parent: P,
    owner: String,
    cardinality: BuilderCardinality,
    targets: Vec<NodeId>,
    mode: BuilderMode,
}

impl<P> fmt::Debug for LinksBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinksBuilder")
            .field("owner", &self.owner)
            .field("cardinality", &self.cardinality)
            .field("targets", &self.targets.len())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<P: BuilderScope> sealed::Sealed for LinksBuilder<P> {}

impl<P: BuilderScope> BuilderScope for LinksBuilder<P> {
    fn state(&mut self) -> &mut DocumentState {
        self.parent.state()
    }
}

impl<P: BuilderScope> LinksBuilder<P> {
    pub(crate) fn new(
        parent: P,
        owner: impl Into<String>,
        cardinality: BuilderCardinality,
        targets: Vec<NodeId>,
        mode: BuilderMode,
    ) -> Self {
        Self {
            parent,
            owner: owner.into(),
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
            NodeKind::Links,
            &self.owner,
            operation,
            expected,
            self.cardinality,
        )?;
        Ok(())
    }

    fn require_len<V>(&self, values: &[V]) -> BuildResult<()> {
        require_count(NodeKind::Links, &self.owner, self.targets.len(), values.len())?;
        Ok(())
    }

    /// Adds or replaces the link in every target container and returns the
    /// link nodes.
    fn upsert(&mut self, rel: &str) -> BuildResult<Vec<NodeId>> {
        let targets = self.targets.clone();
        let dom = &mut self.parent.state().dom;
        let mut links = Vec::with_capacity(targets.len());
        for container in targets {
            let data = NodeData::Link(LinkNode {
                rel: rel.to_string(),
            });
            let existing = dom.find_child(container, |node| {
                matches!(node, NodeData::Link(link) if link.rel == rel)
            });
            let link = match existing {
                Some(existing) => dom.replace_child(container, existing, data)?,
                None => dom.add_child(container, data)?,
            };
            links.push(link);
        }
        Ok(links)
    }

    fn add_children(&mut self, links: Vec<NodeId>, values: Vec<NodeData>) -> BuildResult<()> {
        let dom = &mut self.parent.state().dom;
        for (link, value) in links.into_iter().zip(values) {
            dom.add_child(link, value)?;
        }
        Ok(())
    }

    /// Requests a link generated from the owner's path context.
    pub fn add_link(mut self, rel: &str) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.upsert(rel)?;
        Ok(self)
    }

    /// Requests a generated link carrying meta.
    pub fn add_link_with_meta(mut self, rel: &str, meta: Meta) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("add_link_with_meta", BuilderCardinality::Single)?;
        let links = self.upsert(rel)?;
        let values = links.iter().map(|_| NodeData::Meta(meta.clone())).collect();
        self.add_children(links, values)?;
        Ok(self)
    }

    /// Requests a generated link per bound owner, each with its own meta.
    pub fn add_link_with_meta_each(
        mut self,
        rel: &str,
        metas: impl IntoIterator<Item = Meta>,
    ) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("add_link_with_meta_each", BuilderCardinality::Collection)?;
        let metas: Vec<Meta> = metas.into_iter().collect();
        self.require_len(&metas)?;
        let links = self.upsert(rel)?;
        self.add_children(links, metas.into_iter().map(NodeData::Meta).collect())?;
        Ok(self)
    }

    /// Adds a link with an explicit href.
    pub fn add_link_href(mut self, rel: &str, href: impl Into<String>) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("add_link_href", BuilderCardinality::Single)?;
        let href = href.into();
        let links = self.upsert(rel)?;
        let values = links.iter().map(|_| NodeData::HRef(href.clone())).collect();
        self.add_children(links, values)?;
        Ok(self)
    }

    /// Adds a link per bound owner, each with its own explicit href.
    pub fn add_link_href_each(
        mut self,
        rel: &str,
        hrefs: impl IntoIterator<Item = impl Into<String>>,
    ) -> BuildResult<Self> {
        if self.is_inert() {
            return Ok(self);
        }
        self.require("add_link_href_each", BuilderCardinality::Collection)?;
        let hrefs: Vec<String> = hrefs.into_iter().map(Into::into).collect();
        self.require_len(&hrefs)?;
        let links = self.upsert(rel)?;
        self.add_children(links, hrefs.into_iter().map(NodeData::HRef).collect())?;
        Ok(self)
    }

    /// Requests the `self` link.
    pub fn add_self_link(self) -> BuildResult<Self> {
        self.add_link(keywords::SELF)
    }

    /// Requests the `related` link.
    pub fn add_related_link(self) -> BuildResult<Self> {
        self.add_link(keywords::RELATED)
    }

    /// Requests the `canonical` link.
    pub fn add_canonical_link(self) -> BuildResult<Self> {
        self.add_link(keywords::CANONICAL)
    }

    /// Returns to the owner's builder.
    pub fn links_end(self) -> P {
        self.parent
    }
}
