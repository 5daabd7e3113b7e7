use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use super::resource::ResourceOrigin;
use super::{BuilderScope, DocumentState, ResourceBuilder, ResourceCollectionBuilder, sealed};
use crate::api::{ResourceIdentifier, ResourceLinkage};
use crate::dom::NodeId;
use crate::error::{BuildResult, BuildUsageError, BuilderCardinality};
use crate::hypermedia::PathStep;
use crate::service_model::{RelationshipCardinality, RelationshipInfo, ResourceType};

/// Adds included resources.
///
/// Resources added through [`to_one`](Self::to_one), [`to_many`](Self::to_many)
/// and their variants also record the linkage from the resource they hang
/// off, so the relationship appears on that resource without being
/// declared through its relationship builder. A resource already in the
/// document is not included a second time.
#[derive(Debug)]
pub struct IncludedBuilder<P> {
    parent: P,
    container: NodeId,
}

impl<P: BuilderScope> sealed::Sealed for IncludedBuilder<P> {}

impl<P: BuilderScope> BuilderScope for IncludedBuilder<P> {
    fn state(&mut self) -> &mut DocumentState {
        self.parent.state()
    }
}

struct Source {
    resource_type: Arc<ResourceType>,
    identifier: ResourceIdentifier,
    info: RelationshipInfo,
}

impl<P: BuilderScope> IncludedBuilder<P> {
    pub(crate) fn new(parent: P, container: NodeId) -> Self {
        Self { parent, container }
    }

    /// Includes a resource without recording linkage to it.
    pub fn resource<T: Any + Send + Sync>(
        self,
        object: T,
    ) -> BuildResult<ResourceBuilder<Self, T>> {
        let container = self.container;
        ResourceBuilder::start(
            self,
            container,
            vec![(object, Vec::new())],
            BuilderCardinality::Single,
            ResourceOrigin::Included,
        )
    }

    fn source<F: Any>(
        &mut self,
        from: &F,
        rel: &str,
        given: RelationshipCardinality,
    ) -> BuildResult<Source> {
        let state = self.parent.state();
        let resource_type = state.service_model.resource_type_of::<F>()?.clone();
        let identifier = resource_type.identifier(from)?;
        let info = resource_type.relationship(rel)?.clone();
        if info.cardinality != given {
            return Err(BuildUsageError::RelationshipCardinalityMismatch {
                api_type: resource_type.api_type().to_string(),
                rel: rel.to_string(),
                declared: info.cardinality.as_str(),
                given: given.as_str(),
            }
            .into());
        }
        Ok(Source {
            resource_type,
            identifier,
            info,
        })
    }

    fn identifier_of<T: Any>(&mut self, object: &T) -> BuildResult<ResourceIdentifier> {
        let state = self.parent.state();
        state.service_model.resource_type_of::<T>()?.identifier(object)
    }

    /// The traversal that reaches resources over `source`'s relationship.
    fn steps(&mut self, source: &Source) -> Vec<PathStep> {
        let context = &self.parent.state().context;
        if !context.nested_paths() {
            return Vec::new();
        }
        let mut steps = context.reached_by(&source.identifier).to_vec();
        steps.push(PathStep {
            resource_type: source.resource_type.clone(),
            api_id: (!source.resource_type.is_singleton())
                .then(|| source.identifier.api_id.clone()),
            rel: source.info.clone(),
        });
        steps
    }

    fn record(&mut self, source: &Source, linkage: ResourceLinkage) -> BuildResult<()> {
        trace!(
            resource = %source.identifier,
            rel = source.info.rel.as_str(),
            "Linking included resource"
        );
        self.parent
            .state()
            .context
            .add_linkage(&source.identifier, &source.info.rel, linkage)
    }

    /// Includes the resource a to-one relationship of `from` points to.
    pub fn to_one<F: Any, T: Any + Send + Sync>(
        mut self,
        from: &F,
        rel: &str,
        to: T,
    ) -> BuildResult<ResourceBuilder<Self, T>> {
        let source = self.source(from, rel, RelationshipCardinality::ToOne)?;
        let to_id = self.identifier_of(&to)?;
        self.record(&source, ResourceLinkage::to_one(to_id))?;
        let steps = self.steps(&source);

        let container = self.container;
        ResourceBuilder::start(
            self,
            container,
            vec![(to, steps)],
            BuilderCardinality::Single,
            ResourceOrigin::Included,
        )
    }

    /// Records that a to-one relationship of `from` is empty.
    pub fn to_one_null<F: Any>(mut self, from: &F, rel: &str) -> BuildResult<Self> {
        let source = self.source(from, rel, RelationshipCardinality::ToOne)?;
        self.record(&source, ResourceLinkage::null())?;
        Ok(self)
    }

    /// Includes the to-one targets of several resources at once.
    pub fn to_one_each<'a, F: Any + 'a, T: Any + Send + Sync>(
        mut self,
        rel: &str,
        pairs: impl IntoIterator<Item = (&'a F, T)>,
    ) -> BuildResult<ResourceCollectionBuilder<Self, T>> {
        let mut items = Vec::new();
        for (from, to) in pairs {
            let source = self.source(from, rel, RelationshipCardinality::ToOne)?;
            let to_id = self.identifier_of(&to)?;
            self.record(&source, ResourceLinkage::to_one(to_id))?;
            let steps = self.steps(&source);
            items.push((to, steps));
        }

        let container = self.container;
        ResourceBuilder::start(
            self,
            container,
            items,
            BuilderCardinality::Collection,
            ResourceOrigin::Included,
        )
    }

    /// Includes the resources a to-many relationship of `from` points to.
    ///
    /// Records the linkage even when `to` is empty, producing `"data": []`.
    pub fn to_many<F: Any, T: Any + Send + Sync>(
        mut self,
        from: &F,
        rel: &str,
        to: impl IntoIterator<Item = T>,
    ) -> BuildResult<ResourceCollectionBuilder<Self, T>> {
        let source = self.source(from, rel, RelationshipCardinality::ToMany)?;
        let to: Vec<T> = to.into_iter().collect();
        let identifiers = to
            .iter()
            .map(|object| self.identifier_of(object))
            .collect::<BuildResult<Vec<_>>>()?;
        self.record(&source, ResourceLinkage::to_many(identifiers))?;
        let steps = self.steps(&source);

        let container = self.container;
        let items = to.into_iter().map(|object| (object, steps.clone())).collect();
        ResourceBuilder::start(
            self,
            container,
            items,
            BuilderCardinality::Collection,
            ResourceOrigin::Included,
        )
    }

    /// Returns to the document builder.
    pub fn included_end(self) -> P {
        self.parent
    }
}
