//! Error types for document building.
//!
//! Every error raised while building or writing a document is fatal to that
//! build. The hierarchy separates caller mistakes (usage errors), data
//! disagreements between linkage sources (linkage conflicts), missing service
//! model metadata, and defects in the core or in a collaborator (internal
//! errors).

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::api::{ResourceIdentifier, ResourceLinkage};
use crate::dom::NodeKind;

/// The primary error type for all document build operations.
#[derive(Error, Debug)]
pub enum DocumentBuildError {
    /// The fluent builder API was misused.
    #[error(transparent)]
    Usage(#[from] BuildUsageError),

    /// Direct and included linkage disagree.
    #[error(transparent)]
    LinkageConflict(#[from] LinkageConflictError),

    /// The core or a collaborator broke an invariant.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// Service model metadata is missing.
    #[error(transparent)]
    ServiceModel(#[from] ServiceModelError),

    /// An attribute value could not be converted to JSON.
    #[error("attribute serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request or base URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl DocumentBuildError {
    /// Returns true if the caller misused the builder API.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, DocumentBuildError::Usage(_))
    }

    /// Returns true if this is a linkage conflict.
    pub fn is_linkage_conflict(&self) -> bool {
        matches!(self, DocumentBuildError::LinkageConflict(_))
    }

    /// Returns true if this indicates a defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, DocumentBuildError::Internal(_))
    }
}

/// Errors caused by misuse of the fluent builders.
#[derive(Error, Debug)]
pub enum BuildUsageError {
    /// A collection overload was called on a single-object builder or vice versa.
    #[error(
        "{operation} expects a {expected} builder but the {node_kind} builder for '{api_type}' is bound to a {actual}"
    )]
    CardinalityMismatch {
        node_kind: NodeKind,
        api_type: String,
        operation: &'static str,
        expected: BuilderCardinality,
        actual: BuilderCardinality,
    },

    /// The number of literal values does not match the number of bound resources.
    #[error(
        "{node_kind} builder for '{api_type}' is bound to {expected} resources but {actual} values were given"
    )]
    ItemCountMismatch {
        node_kind: NodeKind,
        api_type: String,
        expected: usize,
        actual: usize,
    },

    /// Linkage data does not match the declared relationship cardinality.
    #[error(
        "relationship '{rel}' of '{api_type}' is declared {declared} but {given} linkage was given"
    )]
    RelationshipCardinalityMismatch {
        api_type: String,
        rel: String,
        declared: &'static str,
        given: &'static str,
    },

    /// ToOne and ToMany linkage were recorded for the same relationship.
    #[error("linkage for {resource} relationship '{rel}' mixes to-one and to-many records")]
    LinkageCardinalityMismatch {
        resource: ResourceIdentifier,
        rel: String,
    },

    /// The document already has a different primary content.
    #[error("document is already a {existing} and cannot become a {requested}")]
    DocumentTypeConflict {
        existing: &'static str,
        requested: &'static str,
    },

    /// Primary data was declared twice.
    #[error("primary data of the {document_type} has already been declared")]
    PrimaryDataAlreadySet { document_type: &'static str },

    /// Included resources were requested on a document without primary resources.
    #[error("included resources are not allowed in a {document_type}")]
    IncludedNotAllowed { document_type: &'static str },
}

/// Whether a builder is bound to a single resource or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderCardinality {
    /// Bound to exactly one resource.
    Single,
    /// Bound to a collection of resources.
    Collection,
}

impl std::fmt::Display for BuilderCardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderCardinality::Single => write!(f, "single resource"),
            BuilderCardinality::Collection => write!(f, "resource collection"),
        }
    }
}

/// Disagreeing to-one linkage for the same resource and relationship.
///
/// `first` is the relationship builder's linkage when there is one, and
/// otherwise the first included declaration.
#[derive(Error, Debug)]
#[error("conflicting to-one linkage for {resource} relationship '{rel}': {first} and {second}")]
pub struct LinkageConflictError {
    pub resource: ResourceIdentifier,
    pub rel: String,
    pub first: LinkageDisplay,
    pub second: LinkageDisplay,
}

/// Display wrapper for linkage values used in conflict messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageDisplay(pub ResourceLinkage);

impl std::fmt::Display for LinkageDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            ResourceLinkage::ToOne(None) => write!(f, "null"),
            ResourceLinkage::ToOne(Some(identifier)) => write!(f, "{}", identifier),
            ResourceLinkage::ToMany(identifiers) => {
                let parts: Vec<String> = identifiers.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Errors that indicate a defect in the core or a collaborator contract violation.
#[derive(Error, Debug)]
pub enum InternalError {
    /// A read-only node was asked to change.
    #[error("{kind} node is read-only and cannot {operation}")]
    ReadOnlyNode {
        kind: NodeKind,
        operation: &'static str,
    },

    /// A read-write parent already holds a read-only child where fluent building expects a read-write one.
    #[error(
        "read-write {parent} node already holds a read-only {child} child; manual read-only values cannot be mixed with fluent building"
    )]
    MixedNodeModes { parent: NodeKind, child: NodeKind },

    /// A child kind is not allowed under the parent kind.
    #[error("{child} node cannot be a child of a {parent} node")]
    InvalidChild { parent: NodeKind, child: NodeKind },

    /// A node had an unexpected kind.
    #[error("expected a {expected} node but found a {found} node")]
    UnexpectedNodeKind { expected: NodeKind, found: NodeKind },

    /// A node lacks a child every node of its kind must have.
    #[error("{parent} node has no {child} child")]
    MissingChild { parent: NodeKind, child: NodeKind },

    /// A node id did not refer to a child of the given parent.
    #[error("{child} node is not attached to the given {parent} node")]
    NotAChild { parent: NodeKind, child: NodeKind },

    /// A read-write node survived into a phase that requires read-only nodes.
    #[error("{kind} node is still read-write during {phase}")]
    UnresolvedNode { kind: NodeKind, phase: &'static str },

    /// A resource was finalized without a path context.
    #[error("resource {resource} has no path context")]
    MissingPathContext { resource: ResourceIdentifier },

    /// A domain object did not have the Rust type its resource type expects.
    #[error("domain object is not a {type_name}")]
    DomainTypeMismatch { type_name: &'static str },

    /// A value outside a closed set was encountered.
    #[error("unknown {enum_name} value '{value}'")]
    UnknownEnumValue {
        enum_name: &'static str,
        value: String,
    },
}

/// Errors raised by service model lookups.
#[derive(Error, Debug)]
pub enum ServiceModelError {
    /// No resource type is registered for a Rust type.
    #[error("no resource type registered for Rust type {type_name}")]
    UnknownDomainType { type_name: &'static str },

    /// No resource type is registered for an api type.
    #[error("no resource type registered for api type '{api_type}'")]
    UnknownApiType { api_type: String },

    /// The resource type does not declare the relationship.
    #[error("resource type '{api_type}' has no relationship '{rel}'")]
    UnknownRelationship { api_type: String, rel: String },

    /// The id accessor returned no id.
    #[error("resource of type '{api_type}' has no api id")]
    MissingApiId { api_type: String },
}

/// Result type for document build operations.
pub type BuildResult<T> = Result<T, DocumentBuildError>;
