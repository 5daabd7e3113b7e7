//! Fluent document builders.
//!
//! A build starts at [`DocumentBuilder`] and descends into child builders
//! that own their parent: [`ResourceBuilder::resource_end`] and the other
//! `*_end` calls hand the parent back. Every step returns a
//! [`BuildResult`], so a whole chain reads as one expression with `?`:
//!
//! ```
//! use std::sync::Arc;
//! use helios_jsonapi::builder::DocumentBuilder;
//! use helios_jsonapi::service_model::{RelationshipInfo, ResourceType, ServiceModel};
//! use helios_jsonapi::DocumentConfig;
//!
//! #[derive(Clone)]
//! struct Article { id: u64, title: String }
//! struct Person { id: u64, name: String }
//!
//! # fn main() -> helios_jsonapi::BuildResult<()> {
//! let model = Arc::new(
//!     ServiceModel::builder()
//!         .resource_type(
//!             ResourceType::builder::<Article>("articles")
//!                 .id(|a| a.id.to_string())
//!                 .attribute("title", |a| a.title.clone())
//!                 .relationship(RelationshipInfo::to_one("author", "people"))
//!                 .build(),
//!         )
//!         .resource_type(
//!             ResourceType::builder::<Person>("people")
//!                 .id(|p| p.id.to_string())
//!                 .attribute("name", |p| p.name.clone())
//!                 .build(),
//!         )
//!         .build(),
//! );
//!
//! let article = Article { id: 1, title: "JSON:API paints my bikeshed!".into() };
//! let author = Person { id: 9, name: "Dan Gebhardt".into() };
//!
//! let config = DocumentConfig::for_request("http://example.com/articles/1");
//! let document = DocumentBuilder::new(model, &config)?
//!     .resource(article.clone())?
//!         .links()?.add_self_link()?.links_end()
//!     .resource_end()?
//!     .included()?
//!         .to_one(&article, "author", author)?
//!         .resource_end()?
//!     .included_end()
//!     .write_document()?;
//!
//! let data = document.resource().unwrap();
//! assert_eq!(data.links.as_ref().unwrap().get("self").unwrap().href, "http://example.com/articles/1");
//! assert_eq!(document.included().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Builders bound to several resources (collections, or the items that
//! passed a `*_if` predicate) accept the `*_each` overloads, which take one
//! value per bound resource. A `*_if` call that no item passes yields an
//! inert builder that accepts the same calls and changes nothing.

mod identifier;
mod included;
mod links;
mod relationships;
mod resource;

pub use identifier::ResourceIdentifierBuilder;
pub use included::IncludedBuilder;
pub use links::LinksBuilder;
pub use relationships::{RelationshipBuilder, RelationshipsBuilder};
pub use resource::{ResourceBuilder, ResourceCollectionBuilder};

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::api::{
    Document, DocumentType, ErrorObject, JsonApiVersion, Links, Meta, ResourceIdentifier,
};
use crate::config::DocumentConfig;
use crate::context::BuilderContext;
use crate::dom::{
    DomTree, ErrorsNode, IncludedNode, LinksNode, NodeData, NodeId, NodeKind,
    ResourceIdentifierNode,
};
use crate::error::{BuildResult, BuildUsageError, BuilderCardinality};
use crate::hypermedia::{DefaultHypermediaAssembler, DocumentPathContext, HypermediaAssembler};
use crate::resolve::DocumentResolver;
use crate::service_model::ServiceModel;
use crate::writer::{DefaultDocumentWriter, DocumentWriter};

/// Everything one document build mutates.
#[doc(hidden)]
#[derive(Debug)]
pub struct DocumentState {
    pub(crate) dom: DomTree,
    pub(crate) context: BuilderContext,
    pub(crate) service_model: Arc<ServiceModel>,
    pub(crate) document_path: DocumentPathContext,
}

mod sealed {
    pub trait Sealed {}
}

/// Implemented by every builder; gives child builders access to the state
/// of the document being built.
pub trait BuilderScope: sealed::Sealed {
    #[doc(hidden)]
    fn state(&mut self) -> &mut DocumentState;
}

/// Whether a builder mutates the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuilderMode {
    Active,
    Inert,
}

pub(crate) fn require_cardinality(
    node_kind: NodeKind,
    api_type: &str,
    operation: &'static str,
    expected: BuilderCardinality,
    actual: BuilderCardinality,
) -> Result<(), BuildUsageError> {
    if expected != actual {
        return Err(BuildUsageError::CardinalityMismatch {
            node_kind,
            api_type: api_type.to_string(),
            operation,
            expected,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn require_count(
    node_kind: NodeKind,
    api_type: &str,
    expected: usize,
    actual: usize,
) -> Result<(), BuildUsageError> {
    if expected != actual {
        return Err(BuildUsageError::ItemCountMismatch {
            node_kind,
            api_type: api_type.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Root builder of a document.
#[derive(Debug)]
pub struct DocumentBuilder {
    state: DocumentState,
}

impl sealed::Sealed for DocumentBuilder {}

impl BuilderScope for DocumentBuilder {
    fn state(&mut self) -> &mut DocumentState {
        &mut self.state
    }
}

impl DocumentBuilder {
    /// Starts a document build.
    ///
    /// Fails if the configured request or base URL does not parse.
    pub fn new(service_model: Arc<ServiceModel>, config: &DocumentConfig) -> BuildResult<Self> {
        let context = BuilderContext::new(config)?;
        let base_url = config.parsed_base_url()?;
        let document_path =
            DocumentPathContext::new(&service_model, context.request_url(), base_url.as_ref());

        let mut dom = DomTree::new();
        if let Some(version) = config.jsonapi_version() {
            dom.add_child(dom.root(), NodeData::JsonApiVersion(version))?;
        }

        Ok(Self {
            state: DocumentState {
                dom,
                context,
                service_model,
                document_path,
            },
        })
    }

    /// Returns the document type declared so far.
    pub fn document_type(&self) -> DocumentType {
        self.state.dom.document_type()
    }

    fn declare(&mut self, requested: DocumentType) -> Result<(), BuildUsageError> {
        let existing = self.state.dom.document_type();
        if existing == DocumentType::Document {
            debug!(document_type = %requested, "Declared document type");
            self.state.dom.set_document_type(requested);
            return Ok(());
        }
        if existing == requested {
            if requested == DocumentType::ErrorsDocument {
                return Ok(());
            }
            return Err(BuildUsageError::PrimaryDataAlreadySet {
                document_type: existing.as_str(),
            });
        }
        Err(BuildUsageError::DocumentTypeConflict {
            existing: existing.as_str(),
            requested: requested.as_str(),
        })
    }

    fn add_container(&mut self, data: NodeData) -> BuildResult<NodeId> {
        let root = self.state.dom.root();
        Ok(self.state.dom.add_child(root, data)?)
    }

    /// Sets the `jsonapi` member, replacing a configured one.
    pub fn jsonapi_version(mut self, version: JsonApiVersion) -> BuildResult<Self> {
        let root = self.state.dom.root();
        self.state
            .dom
            .set_child(root, NodeData::JsonApiVersion(version))?;
        Ok(self)
    }

    /// Sets the top-level meta.
    pub fn meta(mut self, meta: Meta) -> BuildResult<Self> {
        let root = self.state.dom.root();
        self.state.dom.set_child(root, NodeData::Meta(meta))?;
        Ok(self)
    }

    /// Starts declaring top-level links.
    pub fn links(mut self) -> BuildResult<LinksBuilder<Self>> {
        let root = self.state.dom.root();
        let links = self
            .state
            .dom
            .get_or_add_child(root, NodeKind::Links, || {
                NodeData::Links(LinksNode::ReadWrite)
            })?;
        Ok(LinksBuilder::new(
            self,
            "document",
            BuilderCardinality::Single,
            vec![links],
            BuilderMode::Active,
        ))
    }

    /// Sets finished top-level links; they are emitted verbatim.
    pub fn set_links(mut self, links: Links) -> BuildResult<Self> {
        let root = self.state.dom.root();
        self.state
            .dom
            .set_child(root, NodeData::Links(LinksNode::ReadOnly(links)))?;
        Ok(self)
    }

    /// Declares a single primary resource.
    pub fn resource<T: Any + Send + Sync>(
        mut self,
        object: T,
    ) -> BuildResult<ResourceBuilder<Self, T>> {
        self.declare(DocumentType::ResourceDocument)?;
        let data = self.add_container(NodeData::Data)?;
        ResourceBuilder::start_primary(self, data, vec![object], BuilderCardinality::Single)
    }

    /// Declares a collection of primary resources.
    pub fn resource_collection<T: Any + Send + Sync>(
        mut self,
        objects: impl IntoIterator<Item = T>,
    ) -> BuildResult<ResourceCollectionBuilder<Self, T>> {
        self.declare(DocumentType::ResourceCollectionDocument)?;
        let data = self.add_container(NodeData::DataCollection)?;
        ResourceBuilder::start_primary(
            self,
            data,
            objects.into_iter().collect(),
            BuilderCardinality::Collection,
        )
    }

    /// Declares `"data": null`.
    pub fn null_resource(mut self) -> BuildResult<Self> {
        self.declare(DocumentType::NullDocument)?;
        self.add_container(NodeData::Data)?;
        Ok(self)
    }

    /// Declares `"data": []`.
    pub fn empty(mut self) -> BuildResult<Self> {
        self.declare(DocumentType::EmptyDocument)?;
        self.add_container(NodeData::DataCollection)?;
        Ok(self)
    }

    /// Declares a single resource identifier as primary data.
    pub fn resource_identifier(
        mut self,
        identifier: ResourceIdentifier,
    ) -> BuildResult<ResourceIdentifierBuilder<Self>> {
        self.declare(DocumentType::ResourceIdentifierDocument)?;
        let data = self.add_container(NodeData::Data)?;
        self.start_identifiers(data, vec![identifier], BuilderCardinality::Single)
    }

    /// Declares a collection of resource identifiers as primary data.
    pub fn resource_identifier_collection(
        mut self,
        identifiers: impl IntoIterator<Item = ResourceIdentifier>,
    ) -> BuildResult<ResourceIdentifierBuilder<Self>> {
        self.declare(DocumentType::ResourceIdentifierCollectionDocument)?;
        let data = self.add_container(NodeData::DataCollection)?;
        self.start_identifiers(
            data,
            identifiers.into_iter().collect(),
            BuilderCardinality::Collection,
        )
    }

    fn start_identifiers(
        mut self,
        container: NodeId,
        identifiers: Vec<ResourceIdentifier>,
        cardinality: BuilderCardinality,
    ) -> BuildResult<ResourceIdentifierBuilder<Self>> {
        let api_type = identifiers
            .first()
            .map(|i| i.api_type.clone())
            .unwrap_or_default();
        let mut targets = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let dom = &mut self.state.dom;
            let node = dom.add_child(
                container,
                NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadWrite),
            )?;
            dom.add_child(node, NodeData::Type(identifier.api_type))?;
            dom.add_child(node, NodeData::Id(identifier.api_id))?;
            if let Some(meta) = identifier.meta {
                dom.add_child(node, NodeData::Meta(meta))?;
            }
            targets.push(node);
        }
        Ok(ResourceIdentifierBuilder::new(
            self,
            api_type,
            cardinality,
            targets,
        ))
    }

    /// Adds an error object, making this an errors document.
    pub fn error(self, error: ErrorObject) -> BuildResult<Self> {
        self.errors([error])
    }

    /// Adds error objects, making this an errors document.
    pub fn errors(mut self, errors: impl IntoIterator<Item = ErrorObject>) -> BuildResult<Self> {
        self.declare(DocumentType::ErrorsDocument)?;
        let root = self.state.dom.root();
        let container = self
            .state
            .dom
            .get_or_add_child(root, NodeKind::Errors, || {
                NodeData::Errors(ErrorsNode::ReadWrite)
            })?;
        for error in errors {
            self.state.dom.add_child(container, NodeData::Error(error))?;
        }
        Ok(self)
    }

    /// Starts declaring included resources.
    ///
    /// Only resource and resource collection documents carry included
    /// resources, and primary data must be declared first.
    pub fn included(mut self) -> BuildResult<IncludedBuilder<Self>> {
        let document_type = self.state.dom.document_type();
        if !document_type.is_resource_bearing() {
            return Err(BuildUsageError::IncludedNotAllowed {
                document_type: document_type.as_str(),
            }
            .into());
        }
        let root = self.state.dom.root();
        let container = self
            .state
            .dom
            .get_or_add_child(root, NodeKind::Included, || {
                NodeData::Included(IncludedNode::ReadWrite)
            })?;
        Ok(IncludedBuilder::new(self, container))
    }

    /// Resolves and compacts the tree with a custom assembler and returns
    /// it without writing a document.
    pub fn resolve_with(mut self, assembler: &dyn HypermediaAssembler) -> BuildResult<DomTree> {
        DocumentResolver::new(&mut self.state, assembler).resolve()?;
        Ok(self.state.dom)
    }

    /// Resolves the document with the default collaborators and writes it.
    pub fn write_document(self) -> BuildResult<Document> {
        self.write_document_with(&DefaultHypermediaAssembler, &DefaultDocumentWriter)
    }

    /// Resolves the document with a custom assembler and writer.
    pub fn write_document_with(
        self,
        assembler: &dyn HypermediaAssembler,
        writer: &dyn DocumentWriter,
    ) -> BuildResult<Document> {
        let dom = self.resolve_with(assembler)?;
        writer.write(&dom)
    }
}
