//! Freezing read-write nodes into their read-only equivalents.

use serde_json::{Map, Value};

use crate::api::{ErrorObject, Links, Meta, Relationships, Resource, ResourceIdentifier};
use crate::dom::{
    DomTree, ErrorsNode, LinksNode, NodeData, NodeId, NodeKind, RelationshipsNode,
    ResolvedResource, ResourceIdentifierNode, ResourceNode,
};
use crate::error::InternalError;

const PHASE: &str = "compaction";

/// Replaces a read-write resource, resource identifier or errors node with
/// its read-only equivalent, in place.
///
/// Returns the id of the node now at that position. Read-only nodes are
/// left untouched. Compaction performs no hypermedia calls, so links and
/// relationships below a resource must already be resolved.
pub(crate) fn compact_node(
    dom: &mut DomTree,
    parent: NodeId,
    node: NodeId,
) -> Result<NodeId, InternalError> {
    if dom.is_read_only(node) {
        return Ok(node);
    }

    let frozen = match dom.get(node) {
        NodeData::Resource(ResourceNode::ReadWrite(resource)) => {
            NodeData::Resource(ResourceNode::ReadOnly(ResolvedResource {
                value: freeze_resource(dom, node)?,
                object: resource.object.clone(),
            }))
        }
        NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadWrite) => NodeData::ResourceIdentifier(
            ResourceIdentifierNode::ReadOnly(freeze_identifier(dom, node)?),
        ),
        NodeData::Errors(ErrorsNode::ReadWrite) => {
            NodeData::Errors(ErrorsNode::ReadOnly(freeze_errors(dom, node)))
        }
        other => {
            return Err(InternalError::UnresolvedNode {
                kind: other.kind(),
                phase: PHASE,
            });
        }
    };
    dom.replace_child(parent, node, frozen)
}

fn leaf_text(dom: &DomTree, node: NodeId, kind: NodeKind) -> Result<String, InternalError> {
    let child = dom.child(node, kind).ok_or(InternalError::MissingChild {
        parent: dom.kind(node),
        child: kind,
    })?;
    match dom.get(child) {
        NodeData::Type(text) | NodeData::Id(text) => Ok(text.clone()),
        other => Err(InternalError::UnexpectedNodeKind {
            expected: kind,
            found: other.kind(),
        }),
    }
}

fn meta(dom: &DomTree, node: NodeId) -> Option<Meta> {
    dom.child(node, NodeKind::Meta)
        .and_then(|child| match dom.get(child) {
            NodeData::Meta(meta) => Some(meta.clone()),
            _ => None,
        })
}

fn attributes(dom: &DomTree, node: NodeId) -> Option<Map<String, Value>> {
    let container = dom.child(node, NodeKind::Attributes)?;
    let attributes: Map<String, Value> = dom
        .children(container)
        .iter()
        .filter_map(|child| match dom.get(*child) {
            NodeData::Attribute(attribute) => {
                Some((attribute.name.clone(), attribute.value.clone()))
            }
            _ => None,
        })
        .collect();
    (!attributes.is_empty()).then_some(attributes)
}

fn relationships(dom: &DomTree, node: NodeId) -> Result<Option<Relationships>, InternalError> {
    let Some(container) = dom.child(node, NodeKind::Relationships) else {
        return Ok(None);
    };
    match dom.get(container) {
        NodeData::Relationships(RelationshipsNode::ReadOnly(relationships)) => {
            Ok((!relationships.is_empty()).then(|| relationships.clone()))
        }
        other => Err(InternalError::UnresolvedNode {
            kind: other.kind(),
            phase: PHASE,
        }),
    }
}

fn links(dom: &DomTree, node: NodeId) -> Result<Option<Links>, InternalError> {
    let Some(container) = dom.child(node, NodeKind::Links) else {
        return Ok(None);
    };
    match dom.get(container) {
        NodeData::Links(LinksNode::ReadOnly(links)) => {
            Ok((!links.is_empty()).then(|| links.clone()))
        }
        other => Err(InternalError::UnresolvedNode {
            kind: other.kind(),
            phase: PHASE,
        }),
    }
}

fn freeze_resource(dom: &DomTree, node: NodeId) -> Result<Resource, InternalError> {
    Ok(Resource {
        api_type: leaf_text(dom, node, NodeKind::Type)?,
        api_id: Some(leaf_text(dom, node, NodeKind::Id)?),
        attributes: attributes(dom, node),
        relationships: relationships(dom, node)?,
        links: links(dom, node)?,
        meta: meta(dom, node),
    })
}

fn freeze_identifier(dom: &DomTree, node: NodeId) -> Result<ResourceIdentifier, InternalError> {
    let identifier = ResourceIdentifier::new(
        leaf_text(dom, node, NodeKind::Type)?,
        leaf_text(dom, node, NodeKind::Id)?,
    );
    Ok(match meta(dom, node) {
        Some(meta) => identifier.with_meta(meta),
        None => identifier,
    })
}

fn freeze_errors(dom: &DomTree, node: NodeId) -> Vec<ErrorObject> {
    dom.children(node)
        .iter()
        .filter_map(|child| match dom.get(*child) {
            NodeData::Error(error) => Some(error.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Link;
    use crate::dom::AttributeNode;
    use serde_json::json;

    fn identifier_tree() -> (DomTree, NodeId, NodeId) {
        let mut dom = DomTree::new();
        let root = dom.root();
        let data = dom.add_child(root, NodeData::Data).unwrap();
        let node = dom
            .add_child(
                data,
                NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadWrite),
            )
            .unwrap();
        dom.add_child(node, NodeData::Type("people".to_string()))
            .unwrap();
        dom.add_child(node, NodeData::Id("9".to_string())).unwrap();
        (dom, data, node)
    }

    #[test]
    fn test_compact_identifier_is_terminal() {
        let (mut dom, data, node) = identifier_tree();
        dom.add_child(node, NodeData::Meta(json!({"primary": true})))
            .unwrap();

        let frozen = compact_node(&mut dom, data, node).unwrap();
        assert_ne!(frozen, node);
        assert_eq!(dom.children(data), &[frozen]);
        match dom.get(frozen) {
            NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadOnly(identifier)) => {
                assert_eq!(identifier, &ResourceIdentifier::new("people", "9"));
                assert_eq!(identifier.meta, Some(json!({"primary": true})));
            }
            other => panic!("unexpected node {:?}", other.kind()),
        }

        // A second pass is a no-op and the frozen node refuses children.
        assert_eq!(compact_node(&mut dom, data, frozen).unwrap(), frozen);
        assert!(matches!(
            dom.add_child(frozen, NodeData::Meta(json!({}))),
            Err(InternalError::ReadOnlyNode { .. })
        ));
    }

    #[test]
    fn test_missing_id_is_reported() {
        let mut dom = DomTree::new();
        let root = dom.root();
        let data = dom.add_child(root, NodeData::Data).unwrap();
        let node = dom
            .add_child(
                data,
                NodeData::ResourceIdentifier(ResourceIdentifierNode::ReadWrite),
            )
            .unwrap();
        dom.add_child(node, NodeData::Type("people".to_string()))
            .unwrap();

        let err = compact_node(&mut dom, data, node).unwrap_err();
        assert!(matches!(
            err,
            InternalError::MissingChild {
                parent: NodeKind::ResourceIdentifier,
                child: NodeKind::Id
            }
        ));
    }

    #[test]
    fn test_unresolved_links_block_resource_compaction() {
        use crate::dom::ReadWriteResource;
        use crate::service_model::ResourceType;
        use std::sync::Arc;

        struct Article;

        let mut dom = DomTree::new();
        let root = dom.root();
        let data = dom.add_child(root, NodeData::Data).unwrap();
        let node = dom
            .add_child(
                data,
                NodeData::Resource(ResourceNode::ReadWrite(ReadWriteResource {
                    resource_type: Arc::new(ResourceType::builder::<Article>("articles").build()),
                    object: Arc::new(Article),
                    path_context: None,
                })),
            )
            .unwrap();
        dom.add_child(node, NodeData::Type("articles".to_string()))
            .unwrap();
        dom.add_child(node, NodeData::Id("1".to_string())).unwrap();
        let attributes = dom.add_child(node, NodeData::Attributes).unwrap();
        dom.add_child(
            attributes,
            NodeData::Attribute(AttributeNode {
                name: "title".to_string(),
                value: json!("Rails is Omakase"),
            }),
        )
        .unwrap();
        let links = dom
            .add_child(node, NodeData::Links(LinksNode::ReadWrite))
            .unwrap();

        let err = compact_node(&mut dom, data, node).unwrap_err();
        assert!(matches!(
            err,
            InternalError::UnresolvedNode {
                kind: NodeKind::Links,
                ..
            }
        ));

        dom.replace_child(
            node,
            links,
            NodeData::Links(LinksNode::ReadOnly(
                Links::new().with("self", Link::new("/articles/1")),
            )),
        )
        .unwrap();
        let frozen = compact_node(&mut dom, data, node).unwrap();
        match dom.get(frozen) {
            NodeData::Resource(ResourceNode::ReadOnly(resolved)) => {
                assert_eq!(resolved.value.attribute("title"), Some(&json!("Rails is Omakase")));
                assert!(resolved.value.relationships.is_none());
                assert!(resolved.object_as::<Article>().is_some());
            }
            other => panic!("unexpected node {:?}", other.kind()),
        }
    }

    #[test]
    fn test_compact_errors() {
        let mut dom = DomTree::new();
        let root = dom.root();
        let errors = dom
            .add_child(root, NodeData::Errors(ErrorsNode::ReadWrite))
            .unwrap();
        dom.add_child(errors, NodeData::Error(ErrorObject::new("422", "Invalid")))
            .unwrap();

        let frozen = compact_node(&mut dom, root, errors).unwrap();
        assert!(matches!(
            dom.get(frozen),
            NodeData::Errors(ErrorsNode::ReadOnly(errors)) if errors.len() == 1
        ));
    }
}
