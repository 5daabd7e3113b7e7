//! Service model: metadata about the resource types of an API.
//!
//! A [`ResourceType`] binds an api type to a Rust domain type and knows how
//! to read the id and attributes of a domain object, which relationships
//! the type declares, and which path segment addresses its collection.

mod registry;
mod resource_type;

pub use registry::{ServiceModel, ServiceModelBuilder};
pub use resource_type::{
    CanonicalPathMode, RelationshipCardinality, RelationshipInfo, ResourceType,
    ResourceTypeBuilder,
};
