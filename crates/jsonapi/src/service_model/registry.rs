//! Service model registry.
//!
//! The registry holds every resource type of an API, indexed by Rust type,
//! api type and collection path segment.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::resource_type::ResourceType;
use crate::error::ServiceModelError;

/// The resource types of an API.
#[derive(Debug, Default)]
pub struct ServiceModel {
    resource_types: Vec<Arc<ResourceType>>,
    by_type_id: HashMap<TypeId, usize>,
    by_api_type: HashMap<String, usize>,
    by_path_segment: HashMap<String, usize>,
}

impl ServiceModel {
    /// Creates an empty service model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a service model.
    pub fn builder() -> ServiceModelBuilder {
        ServiceModelBuilder::default()
    }

    /// Registers a resource type, replacing any earlier one for the same
    /// api type or Rust type.
    pub fn register(&mut self, resource_type: ResourceType) {
        if let Some(index) = self.by_api_type.get(resource_type.api_type()).copied() {
            warn!(
                api_type = resource_type.api_type(),
                "Replacing registered resource type"
            );
            self.by_type_id.remove(&self.resource_types[index].type_id());
            self.by_path_segment
                .remove(self.resource_types[index].path_segment());
            self.index(index, &resource_type);
            self.resource_types[index] = Arc::new(resource_type);
            return;
        }

        let index = self.resource_types.len();
        self.index(index, &resource_type);
        self.resource_types.push(Arc::new(resource_type));
    }

    fn index(&mut self, index: usize, resource_type: &ResourceType) {
        self.by_type_id.insert(resource_type.type_id(), index);
        self.by_api_type
            .insert(resource_type.api_type().to_string(), index);
        self.by_path_segment
            .insert(resource_type.path_segment().to_string(), index);
    }

    /// Returns the resource type registered for domain type `T`.
    pub fn resource_type_of<T: Any>(&self) -> Result<&Arc<ResourceType>, ServiceModelError> {
        self.by_type_id
            .get(&TypeId::of::<T>())
            .map(|index| &self.resource_types[*index])
            .ok_or(ServiceModelError::UnknownDomainType {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Returns the resource type registered for an api type.
    pub fn resource_type(&self, api_type: &str) -> Result<&Arc<ResourceType>, ServiceModelError> {
        self.by_api_type
            .get(api_type)
            .map(|index| &self.resource_types[*index])
            .ok_or_else(|| ServiceModelError::UnknownApiType {
                api_type: api_type.to_string(),
            })
    }

    /// Returns the resource type addressed by a collection path segment.
    pub fn resource_type_by_path_segment(&self, segment: &str) -> Option<&Arc<ResourceType>> {
        self.by_path_segment
            .get(segment)
            .map(|index| &self.resource_types[*index])
    }

    /// Iterates over all resource types in registration order.
    pub fn resource_types(&self) -> impl Iterator<Item = &Arc<ResourceType>> {
        self.resource_types.iter()
    }

    /// Returns the number of registered resource types.
    pub fn len(&self) -> usize {
        self.resource_types.len()
    }

    /// Returns true if no resource type is registered.
    pub fn is_empty(&self) -> bool {
        self.resource_types.is_empty()
    }
}

/// Builder for [`ServiceModel`].
#[derive(Debug, Default)]
pub struct ServiceModelBuilder {
    model: ServiceModel,
}

impl ServiceModelBuilder {
    /// Adds a resource type.
    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.model.register(resource_type);
        self
    }

    /// Finishes the model.
    pub fn build(self) -> ServiceModel {
        self.model
    }
}
