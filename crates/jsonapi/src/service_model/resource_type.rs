//! Resource type metadata.

use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::ResourceIdentifier;
use crate::error::{BuildResult, InternalError, ServiceModelError};

/// Declared cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipCardinality {
    /// Points at zero or one resource.
    ToOne,
    /// Points at any number of resources.
    ToMany,
}

impl RelationshipCardinality {
    /// Returns the cardinality name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipCardinality::ToOne => "to-one",
            RelationshipCardinality::ToMany => "to-many",
        }
    }
}

impl FromStr for RelationshipCardinality {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to-one" | "ToOne" => Ok(RelationshipCardinality::ToOne),
            "to-many" | "ToMany" => Ok(RelationshipCardinality::ToMany),
            other => Err(InternalError::UnknownEnumValue {
                enum_name: "RelationshipCardinality",
                value: other.to_string(),
            }),
        }
    }
}

/// How a relationship affects the canonical path of the resource it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CanonicalPathMode {
    /// The canonical path keeps growing along the traversal.
    #[default]
    Accumulate,
    /// The canonical path restarts at the reached resource.
    DropPreviousPathSegments,
}

/// Metadata of one relationship of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// Relationship name.
    pub rel: String,
    /// Path segment used in URLs, defaults to `rel`.
    pub api_rel_path_segment: String,
    /// Declared cardinality.
    pub cardinality: RelationshipCardinality,
    /// Api type of the related resources.
    pub to_api_type: String,
    /// Canonical path behaviour.
    pub canonical_path_mode: CanonicalPathMode,
}

impl RelationshipInfo {
    /// Declares a to-one relationship.
    pub fn to_one(rel: impl Into<String>, to_api_type: impl Into<String>) -> Self {
        Self::new(rel, to_api_type, RelationshipCardinality::ToOne)
    }

    /// Declares a to-many relationship.
    pub fn to_many(rel: impl Into<String>, to_api_type: impl Into<String>) -> Self {
        Self::new(rel, to_api_type, RelationshipCardinality::ToMany)
    }

    fn new(
        rel: impl Into<String>,
        to_api_type: impl Into<String>,
        cardinality: RelationshipCardinality,
    ) -> Self {
        let rel = rel.into();
        Self {
            api_rel_path_segment: rel.clone(),
            rel,
            cardinality,
            to_api_type: to_api_type.into(),
            canonical_path_mode: CanonicalPathMode::Accumulate,
        }
    }

    /// Sets the URL path segment.
    pub fn with_path_segment(mut self, segment: impl Into<String>) -> Self {
        self.api_rel_path_segment = segment.into();
        self
    }

    /// Makes the reached resource's canonical path start over.
    pub fn drop_previous_path_segments(mut self) -> Self {
        self.canonical_path_mode = CanonicalPathMode::DropPreviousPathSegments;
        self
    }

    /// Returns true for to-one relationships.
    pub fn is_to_one(&self) -> bool {
        self.cardinality == RelationshipCardinality::ToOne
    }
}

type IdAccessor = Box<dyn Fn(&dyn Any) -> Result<String, InternalError> + Send + Sync>;
type AttributeAccessor = Box<dyn Fn(&dyn Any) -> BuildResult<Value> + Send + Sync>;

struct AttributeInfo {
    name: String,
    accessor: AttributeAccessor,
}

/// Metadata of a resource type: identity, attributes, relationships and
/// path segment, bound to one Rust domain type.
pub struct ResourceType {
    api_type: String,
    type_id: TypeId,
    type_name: &'static str,
    path_segment: String,
    singleton: bool,
    id_accessor: Option<IdAccessor>,
    attributes: Vec<AttributeInfo>,
    relationships: Vec<RelationshipInfo>,
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("api_type", &self.api_type)
            .field("type_name", &self.type_name)
            .field("path_segment", &self.path_segment)
            .field("singleton", &self.singleton)
            .field(
                "attributes",
                &self.attributes.iter().map(|a| &a.name).collect::<Vec<_>>(),
            )
            .field("relationships", &self.relationships)
            .finish()
    }
}

impl ResourceType {
    /// Starts describing the resource type for domain type `T`.
    pub fn builder<T: Any + Send + Sync>(api_type: impl Into<String>) -> ResourceTypeBuilder<T> {
        ResourceTypeBuilder::new(api_type.into())
    }

    /// Returns the api type.
    pub fn api_type(&self) -> &str {
        &self.api_type
    }

    /// Returns the Rust type id of the domain type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust type name of the domain type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the collection path segment.
    pub fn path_segment(&self) -> &str {
        &self.path_segment
    }

    /// Returns true for singleton resources, addressed without an id.
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Returns the declared relationships.
    pub fn relationships(&self) -> &[RelationshipInfo] {
        &self.relationships
    }

    /// Looks up a relationship by name.
    pub fn relationship(&self, rel: &str) -> Result<&RelationshipInfo, ServiceModelError> {
        self.relationships
            .iter()
            .find(|info| info.rel == rel)
            .ok_or_else(|| ServiceModelError::UnknownRelationship {
                api_type: self.api_type.clone(),
                rel: rel.to_string(),
            })
    }

    /// Looks up a relationship by its URL path segment.
    pub fn relationship_by_path_segment(&self, segment: &str) -> Option<&RelationshipInfo> {
        self.relationships
            .iter()
            .find(|info| info.api_rel_path_segment == segment)
    }

    /// Returns the attribute names in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    /// Extracts the api id of a domain object.
    pub fn api_id(&self, object: &dyn Any) -> BuildResult<String> {
        let accessor = self
            .id_accessor
            .as_ref()
            .ok_or_else(|| ServiceModelError::MissingApiId {
                api_type: self.api_type.clone(),
            })?;
        Ok(accessor(object)?)
    }

    /// Extracts the identifier of a domain object.
    pub fn identifier(&self, object: &dyn Any) -> BuildResult<ResourceIdentifier> {
        Ok(ResourceIdentifier::new(
            self.api_type.clone(),
            self.api_id(object)?,
        ))
    }

    /// Maps the attributes accepted by `include` into a JSON object.
    pub fn map_attributes(
        &self,
        object: &dyn Any,
        include: impl Fn(&str) -> bool,
    ) -> BuildResult<Map<String, Value>> {
        let mut attributes = Map::new();
        for attribute in self.attributes.iter().filter(|a| include(&a.name)) {
            let value = (attribute.accessor)(object)?;
            attributes.insert(attribute.name.clone(), value);
        }
        Ok(attributes)
    }
}

/// Typed builder for [`ResourceType`].
///
/// # Example
///
/// ```
/// use helios_jsonapi::service_model::{RelationshipInfo, ResourceType};
///
/// #[derive(Clone)]
/// struct Article {
///     id: u64,
///     title: String,
/// }
///
/// let articles = ResourceType::builder::<Article>("articles")
///     .id(|a| a.id.to_string())
///     .attribute("title", |a| a.title.clone())
///     .relationship(RelationshipInfo::to_one("author", "people").drop_previous_path_segments())
///     .build();
///
/// assert_eq!(articles.path_segment(), "articles");
/// ```
pub struct ResourceTypeBuilder<T> {
    api_type: String,
    path_segment: Option<String>,
    singleton: bool,
    id_accessor: Option<IdAccessor>,
    attributes: Vec<AttributeInfo>,
    relationships: Vec<RelationshipInfo>,
    _domain: std::marker::PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ResourceTypeBuilder<T> {
    fn new(api_type: String) -> Self {
        Self {
            api_type,
            path_segment: None,
            singleton: false,
            id_accessor: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
            _domain: std::marker::PhantomData,
        }
    }

    /// Sets the id accessor.
    pub fn id<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.id_accessor = Some(Box::new(move |object: &dyn Any| {
            downcast::<T>(object).map(&accessor)
        }));
        self
    }

    /// Adds an attribute.
    pub fn attribute<V, F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.attributes.push(AttributeInfo {
            name: name.into(),
            accessor: Box::new(move |object: &dyn Any| {
                let value = accessor(downcast::<T>(object)?);
                Ok(serde_json::to_value(value)?)
            }),
        });
        self
    }

    /// Adds a relationship.
    pub fn relationship(mut self, info: RelationshipInfo) -> Self {
        self.relationships.push(info);
        self
    }

    /// Sets the collection path segment, which defaults to the api type.
    pub fn path_segment(mut self, segment: impl Into<String>) -> Self {
        self.path_segment = Some(segment.into());
        self
    }

    /// Marks the resource as a singleton.
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Builds the resource type.
    pub fn build(self) -> ResourceType {
        ResourceType {
            path_segment: self.path_segment.unwrap_or_else(|| self.api_type.clone()),
            api_type: self.api_type,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            singleton: self.singleton,
            id_accessor: self.id_accessor,
            attributes: self.attributes,
            relationships: self.relationships,
        }
    }
}

fn downcast<T: Any>(object: &dyn Any) -> Result<&T, InternalError> {
    object
        .downcast_ref::<T>()
        .ok_or(InternalError::DomainTypeMismatch {
            type_name: std::any::type_name::<T>(),
        })
}
