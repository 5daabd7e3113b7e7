use super::{BuilderScope, DocumentState, require_cardinality, require_count, sealed};
use crate::api::Meta;
use crate::dom::{NodeData, NodeId, NodeKind};
use crate::error::{BuildResult, BuilderCardinality};

/// Builds resource identifiers given as primary data.
#[derive(Debug)]
pub struct ResourceIdentifierBuilder<P> {
    parent: P,
    api_type: String,
    cardinality: BuilderCardinality,
    targets: Vec<NodeId>,
}

impl<P: BuilderScope> sealed::Sealed for ResourceIdentifierBuilder<P> {}

impl<P: BuilderScope> BuilderScope for ResourceIdentifierBuilder<P> {
    fn state(&mut self) -> &mut DocumentState {
        self.parent.state()
    }
}

impl<P: BuilderScope> ResourceIdentifierBuilder<P> {
    pub(crate) fn new(
        parent: P,
        api_type: String,
        cardinality: BuilderCardinality,
        targets: Vec<NodeId>,
    ) -> Self {
        Self {
            parent,
            api_type,
            cardinality,
            targets,
        }
    }

    /// Sets the meta of the identifier.
    pub fn meta(mut self, meta: Meta) -> BuildResult<Self> {
        require_cardinality(
            NodeKind::ResourceIdentifier,
            &self.api_type,
            "meta",
            BuilderCardinality::Single,
            self.cardinality,
        )?;
        let targets = self.targets.clone();
        let dom = &mut self.parent.state().dom;
        for node in targets {
            dom.set_child(node, NodeData::Meta(meta.clone()))?;
        }
        Ok(self)
    }

    /// Sets one meta value per identifier of the collection.
    pub fn meta_each(mut self, metas: impl IntoIterator<Item = Meta>) -> BuildResult<Self> {
        require_cardinality(
            NodeKind::ResourceIdentifier,
            &self.api_type,
            "meta_each",
            BuilderCardinality::Collection,
            self.cardinality,
        )?;
        let metas: Vec<Meta> = metas.into_iter().collect();
        require_count(
            NodeKind::ResourceIdentifier,
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

    /// Returns to the document builder.
    pub fn resource_identifier_end(self) -> P {
        self.parent
    }
}
