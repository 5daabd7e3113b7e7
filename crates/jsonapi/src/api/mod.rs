//! API-level JSON:API values.
//!
//! These are the finalized values produced by the resolution engine and
//! handed to the [`DocumentWriter`](crate::writer::DocumentWriter). They
//! derive serde so callers can encode the finished [`Document`] with any
//! serde backend.
//!
//! - [`document`] - Top-level document and document types
//! - [`resource`] - Resources and resource identifiers
//! - [`relationship`] - Relationships and resource linkage
//! - [`link`] - Links and meta
//! - [`error_object`] - Error objects
//! - [`keywords`] - Reserved member and link names

pub mod document;
pub mod error_object;
pub mod keywords;
pub mod link;
pub mod relationship;
pub mod resource;

pub use document::{Document, DocumentType, JsonApiVersion, PrimaryData};
pub use error_object::{ErrorObject, ErrorSource};
pub use link::{Link, Links, Meta};
pub use relationship::{Relationship, RelationshipType, Relationships, ResourceLinkage};
pub use resource::{Resource, ResourceIdentifier};
