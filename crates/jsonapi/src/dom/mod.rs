//! The document object model.
//!
//! Documents are assembled as a tree of nodes stored in an arena
//! ([`DomTree`]). Nodes start out read-write while the fluent builders add
//! children to them and are compacted into read-only nodes carrying a
//! finalized API value before the document is written. Compaction is always
//! a replace-in-parent that keeps the node's position among its siblings;
//! a read-only node never changes again.

mod node;
mod tree;

pub use node::{
    AttributeNode, DocumentNode, DomainObject, ErrorsNode, IncludedNode, LinkNode, LinksNode,
    NodeData, ReadWriteResource, RelationshipNode, RelationshipsNode, ResolvedResource,
    ResourceIdentifierNode, ResourceNode,
};
pub use tree::DomTree;

use std::fmt;

/// Index of a node in a [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The closed set of node kinds.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Data,
    DataCollection,
    Resource,
    ResourceIdentifier,
    Relationships,
    Relationship,
    Links,
    Link,
    Meta,
    Attributes,
    Attribute,
    Included,
    Errors,
    Error,
    Type,
    Id,
    HRef,
    JsonApiVersion,
}

impl NodeKind {
    /// Returns the kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "Document",
            NodeKind::Data => "Data",
            NodeKind::DataCollection => "DataCollection",
            NodeKind::Resource => "Resource",
            NodeKind::ResourceIdentifier => "ResourceIdentifier",
            NodeKind::Relationships => "Relationships",
            NodeKind::Relationship => "Relationship",
            NodeKind::Links => "Links",
            NodeKind::Link => "Link",
            NodeKind::Meta => "Meta",
            NodeKind::Attributes => "Attributes",
            NodeKind::Attribute => "Attribute",
            NodeKind::Included => "Included",
            NodeKind::Errors => "Errors",
            NodeKind::Error => "Error",
            NodeKind::Type => "Type",
            NodeKind::Id => "Id",
            NodeKind::HRef => "HRef",
            NodeKind::JsonApiVersion => "JsonApiVersion",
        }
    }

    /// Returns true if a node of this kind may hold a child of `child` kind.
    pub fn can_contain(&self, child: NodeKind) -> bool {
        use NodeKind::*;
        match self {
            Document => matches!(
                child,
                JsonApiVersion | Meta | Links | Data | DataCollection | Included | Errors
            ),
            Data | DataCollection => matches!(child, Resource | ResourceIdentifier),
            Resource => matches!(child, Type | Id | Attributes | Relationships | Links | Meta),
            ResourceIdentifier => matches!(child, Type | Id | Meta),
            Relationships => child == Relationship,
            Relationship => matches!(child, Links | Meta),
            Links => child == Link,
            Link => matches!(child, HRef | Meta),
            Attributes => child == Attribute,
            Included => child == Resource,
            Errors => child == Error,
            Meta | Attribute | Error | Type | Id | HRef | JsonApiVersion => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Under construction; children may be added, replaced and removed.
    ReadWrite,
    /// Finalized; refuses every mutation.
    ReadOnly,
}
