//! Node payloads.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use super::{NodeKind, NodeMode};
use crate::api::{
    DocumentType, ErrorObject, JsonApiVersion, Links, Meta, Relationships, Resource,
    ResourceIdentifier, ResourceLinkage,
};
use crate::hypermedia::ResourcePathContext;
use crate::service_model::ResourceType;

/// A type-erased reference to the domain object a resource was built from.
pub type DomainObject = Arc<dyn Any + Send + Sync>;

/// Payload of a node; the variant is the node kind.
///
/// Kinds that go through compaction carry a payload enum whose variant is
/// the node mode. Leaf values (meta, attribute, error, type, id, href,
/// version) are read-only from the moment they are created.
#[derive(Debug)]
pub enum NodeData {
    /// The root.
    Document(DocumentNode),
    /// Holder of single primary data; empty means `null`.
    Data,
    /// Holder of collection primary data.
    DataCollection,
    /// A resource.
    Resource(ResourceNode),
    /// A resource identifier.
    ResourceIdentifier(ResourceIdentifierNode),
    /// A relationships container.
    Relationships(RelationshipsNode),
    /// A single relationship under construction.
    Relationship(RelationshipNode),
    /// A links container.
    Links(LinksNode),
    /// A single link under construction.
    Link(LinkNode),
    /// A meta value.
    Meta(Meta),
    /// An attributes container.
    Attributes,
    /// A single attribute.
    Attribute(AttributeNode),
    /// The included resources container.
    Included(IncludedNode),
    /// The errors container.
    Errors(ErrorsNode),
    /// A single error object.
    Error(ErrorObject),
    /// The api type of a resource or identifier.
    Type(String),
    /// The api id of a resource or identifier.
    Id(String),
    /// The explicit target of a link.
    HRef(String),
    /// The `jsonapi` member.
    JsonApiVersion(JsonApiVersion),
}

impl NodeData {
    /// Returns the node kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document(_) => NodeKind::Document,
            NodeData::Data => NodeKind::Data,
            NodeData::DataCollection => NodeKind::DataCollection,
            NodeData::Resource(_) => NodeKind::Resource,
            NodeData::ResourceIdentifier(_) => NodeKind::ResourceIdentifier,
            NodeData::Relationships(_) => NodeKind::Relationships,
            NodeData::Relationship(_) => NodeKind::Relationship,
            NodeData::Links(_) => NodeKind::Links,
            NodeData::Link(_) => NodeKind::Link,
            NodeData::Meta(_) => NodeKind::Meta,
            NodeData::Attributes => NodeKind::Attributes,
            NodeData::Attribute(_) => NodeKind::Attribute,
            NodeData::Included(_) => NodeKind::Included,
            NodeData::Errors(_) => NodeKind::Errors,
            NodeData::Error(_) => NodeKind::Error,
            NodeData::Type(_) => NodeKind::Type,
            NodeData::Id(_) => NodeKind::Id,
            NodeData::HRef(_) => NodeKind::HRef,
            NodeData::JsonApiVersion(_) => NodeKind::JsonApiVersion,
        }
    }

    /// Returns the node mode.
    pub fn mode(&self) -> NodeMode {
        match self {
            NodeData::Document(_)
            | NodeData::Data
            | NodeData::DataCollection
            | NodeData::Relationship(_)
            | NodeData::Link(_)
            | NodeData::Attributes => NodeMode::ReadWrite,

            NodeData::Meta(_)
            | NodeData::Attribute(_)
            | NodeData::Error(_)
            | NodeData::Type(_)
            | NodeData::Id(_)
            | NodeData::HRef(_)
            | NodeData::JsonApiVersion(_) => NodeMode::ReadOnly,

            NodeData::Resource(ResourceNode::ReadWrite(_))
            | NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadWrite)
            | NodeData::Relationships(RelationshipsNode::ReadWrite)
            | NodeData::Links(LinksNode::ReadWrite)
            | NodeData::Included(IncludedNode::ReadWrite)
            | NodeData::Errors(ErrorsNode::ReadWrite) => NodeMode::ReadWrite,

            NodeData::Resource(ResourceNode::ReadOnly(_))
            | NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadOnly(_))
            | NodeData::Relationships(RelationshipsNode::ReadOnly(_))
            | NodeData::Links(LinksNode::ReadOnly(_))
            | NodeData::Included(IncludedNode::ReadOnly(_))
            | NodeData::Errors(ErrorsNode::ReadOnly(_)) => NodeMode::ReadOnly,
        }
    }

    /// Returns true if the node is read-only.
    pub fn is_read_only(&self) -> bool {
        self.mode() == NodeMode::ReadOnly
    }
}

/// Payload of the root node.
#[derive(Debug, Clone, Copy)]
pub struct DocumentNode {
    /// The document shape, fixed by the first primary data or errors call.
    pub document_type: DocumentType,
}

/// A resource node.
#[derive(Debug)]
pub enum ResourceNode {
    /// Under construction.
    ReadWrite(ReadWriteResource),
    /// Frozen.
    ReadOnly(ResolvedResource),
}

/// State of a resource under construction.
///
/// The api type and id live in `Type` and `Id` children; attributes,
/// relationships, links and meta are children as well.
#[derive(Debug)]
pub struct ReadWriteResource {
    /// Metadata of the resource's type.
    pub resource_type: Arc<ResourceType>,
    /// The domain object the resource is built from.
    pub object: DomainObject,
    /// Set when the resource builder ends.
    pub path_context: Option<ResourcePathContext>,
}

/// A frozen resource.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    /// The resolved API value.
    pub value: Resource,
    /// The domain object the resource was built from.
    pub object: DomainObject,
}

impl ResolvedResource {
    /// Returns the identifier of the resolved resource.
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.value.identifier()
    }

    /// Downcasts the domain object.
    pub fn object_as<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }
}

/// A resource identifier node.
#[derive(Debug)]
pub enum ResourceIdentifierNode {
    /// Under construction; type, id and meta are children.
    ReadWrite,
    /// Frozen.
    ReadOnly(ResourceIdentifier),
}

/// A relationships container.
#[derive(Debug)]
pub enum RelationshipsNode {
    /// Holds `Relationship` children.
    ReadWrite,
    /// Resolved relationships.
    ReadOnly(Relationships),
}

/// A relationship under construction.
#[derive(Debug)]
pub struct RelationshipNode {
    /// Relationship name.
    pub rel: String,
    /// Linkage given directly through the relationship builder.
    pub linkage: Option<ResourceLinkage>,
}

/// A links container.
#[derive(Debug)]
pub enum LinksNode {
    /// Holds `Link` children.
    ReadWrite,
    /// Resolved links.
    ReadOnly(Links),
}

/// A link under construction; an explicit href and meta are children.
#[derive(Debug)]
pub struct LinkNode {
    /// Link relation name.
    pub rel: String,
}

/// A single attribute.
#[derive(Debug)]
pub struct AttributeNode {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: Value,
}

/// The included resources container.
#[derive(Debug)]
pub enum IncludedNode {
    /// Holds `Resource` children in first-add order.
    ReadWrite,
    /// Sorted, frozen resources.
    ReadOnly(Vec<ResolvedResource>),
}

/// The errors container.
#[derive(Debug)]
pub enum ErrorsNode {
    /// Holds `Error` children.
    ReadWrite,
    /// Frozen error objects.
    ReadOnly(Vec<ErrorObject>),
}
