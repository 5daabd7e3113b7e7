//! Turning a resolved tree into a [`Document`].

use crate::api::{Document, DocumentType, PrimaryData};
use crate::dom::{
    DomTree, ErrorsNode, IncludedNode, LinksNode, NodeData, NodeId, ResourceIdentifierNode,
    ResourceNode,
};
use crate::error::{BuildResult, InternalError};

const PHASE: &str = "document writing";

/// Produces the API-level document from a resolved, compacted tree.
pub trait DocumentWriter: Send + Sync {
    /// Writes the document.
    ///
    /// The tree must hold no read-write node other than the root and the
    /// primary data containers.
    fn write(&self, dom: &DomTree) -> BuildResult<Document>;
}

/// Writer mapping each top-level node to the matching document member.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDocumentWriter;

fn unresolved(data: &NodeData) -> InternalError {
    InternalError::UnresolvedNode {
        kind: data.kind(),
        phase: PHASE,
    }
}

impl DefaultDocumentWriter {
    fn single(dom: &DomTree, container: NodeId) -> Result<PrimaryData, InternalError> {
        let Some(child) = dom.children(container).first() else {
            return Ok(PrimaryData::Null);
        };
        match dom.get(*child) {
            NodeData::Resource(ResourceNode::ReadOnly(resource)) => {
                Ok(PrimaryData::Resource(Box::new(resource.value.clone())))
            }
            NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadOnly(identifier)) => {
                Ok(PrimaryData::Identifier(identifier.clone()))
            }
            other => Err(unresolved(other)),
        }
    }

    fn collection(
        dom: &DomTree,
        container: NodeId,
        document_type: DocumentType,
    ) -> Result<PrimaryData, InternalError> {
        if document_type == DocumentType::ResourceIdentifierCollectionDocument {
            let identifiers = dom
                .children(container)
                .iter()
                .map(|child| match dom.get(*child) {
                    NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadOnly(identifier)) => {
                        Ok(identifier.clone())
                    }
                    other => Err(unresolved(other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(PrimaryData::Identifiers(identifiers));
        }

        let resources = dom
            .children(container)
            .iter()
            .map(|child| match dom.get(*child) {
                NodeData::Resource(ResourceNode::ReadOnly(resource)) => Ok(resource.value.clone()),
                other => Err(unresolved(other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PrimaryData::Resources(resources))
    }
}

impl DocumentWriter for DefaultDocumentWriter {
    fn write(&self, dom: &DomTree) -> BuildResult<Document> {
        let document_type = dom.document_type();
        let mut document = Document::new(document_type);

        for child in dom.children(dom.root()) {
            match dom.get(*child) {
                NodeData::JsonApiVersion(version) => document.jsonapi = Some(version.clone()),
                NodeData::Meta(meta) => document.meta = Some(meta.clone()),
                NodeData::Links(LinksNode::ReadOnly(links)) => {
                    document.links = (!links.is_empty()).then(|| links.clone());
                }
                NodeData::Data => document.data = Some(Self::single(dom, *child)?),
                NodeData::DataCollection => {
                    document.data = Some(Self::collection(dom, *child, document_type)?);
                }
                NodeData::Included(IncludedNode::ReadOnly(resources)) => {
                    document.included = (!resources.is_empty())
                        .then(|| resources.iter().map(|r| r.value.clone()).collect());
                }
                NodeData::Errors(ErrorsNode::ReadOnly(errors)) => {
                    document.errors = Some(errors.clone());
                }
                other => return Err(unresolved(other).into()),
            }
        }
        Ok(document)
    }
}
