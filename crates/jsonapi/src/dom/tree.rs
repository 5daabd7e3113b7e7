//! Arena-backed node tree.

use super::node::{DocumentNode, NodeData};
use super::{NodeId, NodeKind, NodeMode};
use crate::api::DocumentType;
use crate::error::InternalError;

#[derive(Debug)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A document tree.
///
/// Nodes are owned by the arena and addressed by [`NodeId`]. Every node
/// except the root is owned by exactly one parent; replaced and removed
/// nodes are detached and never reachable from the root again.
#[derive(Debug)]
pub struct DomTree {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Creates a tree holding only a plain `Document` root.
    pub fn new() -> Self {
        let root = Slot {
            data: NodeData::Document(DocumentNode {
                document_type: DocumentType::Document,
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            slots: vec![root],
            root: NodeId(0),
        }
    }

    /// Returns the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the document type recorded on the root.
    pub fn document_type(&self) -> DocumentType {
        match &self.slots[self.root.0].data {
            NodeData::Document(document) => document.document_type,
            _ => DocumentType::Document,
        }
    }

    pub(crate) fn set_document_type(&mut self, document_type: DocumentType) {
        if let NodeData::Document(document) = &mut self.slots[self.root.0].data {
            document.document_type = document_type;
        }
    }

    /// Returns the payload of a node.
    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.slots[id.0].data
    }

    /// Returns the payload of a read-write node for mutation.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeData, InternalError> {
        let data = &mut self.slots[id.0].data;
        if data.is_read_only() {
            return Err(InternalError::ReadOnlyNode {
                kind: data.kind(),
                operation: "change its payload",
            });
        }
        Ok(data)
    }

    /// Returns the kind of a node.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind()
    }

    /// Returns the mode of a node.
    pub fn mode(&self, id: NodeId) -> NodeMode {
        self.get(id).mode()
    }

    /// Returns true if the node is read-only.
    pub fn is_read_only(&self, id: NodeId) -> bool {
        self.get(id).is_read_only()
    }

    /// Returns the parent of an attached node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    /// Returns the children of a node in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    /// Returns the first child of the given kind.
    pub fn child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.kind(*child) == kind)
    }

    /// Returns every child of the given kind in insertion order.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.kind(*child) == kind)
            .collect()
    }

    /// Returns the first child whose payload matches.
    pub fn find_child(&self, id: NodeId, predicate: impl Fn(&NodeData) -> bool) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| predicate(self.get(*child)))
    }

    /// Returns the number of nodes attached below `id`, including `id`.
    pub fn subtree_len(&self, id: NodeId) -> usize {
        1 + self
            .children(id)
            .iter()
            .map(|child| self.subtree_len(*child))
            .sum::<usize>()
    }

    /// Appends a child.
    pub fn add_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, InternalError> {
        self.check_mutable(parent, "add a child")?;
        self.check_contains(parent, data.kind())?;

        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.0].children.push(id);
        Ok(id)
    }

    /// Replaces `old` with a new node in the same position among its siblings.
    ///
    /// The old node and its subtree are detached.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        data: NodeData,
    ) -> Result<NodeId, InternalError> {
        self.check_mutable(parent, "replace a child")?;
        self.check_contains(parent, data.kind())?;
        let position = self.position(parent, old)?;

        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.0].children[position] = id;
        self.slots[old.0].parent = None;
        Ok(id)
    }

    /// Detaches a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), InternalError> {
        self.check_mutable(parent, "remove a child")?;
        let position = self.position(parent, child)?;
        self.slots[parent.0].children.remove(position);
        self.slots[child.0].parent = None;
        Ok(())
    }

    /// Returns the read-write child of the given kind, adding it if missing.
    ///
    /// A read-write parent already holding a read-only child of that kind
    /// means read-only values were injected where fluent building continues,
    /// which is an internal error.
    pub fn get_or_add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        make: impl FnOnce() -> NodeData,
    ) -> Result<NodeId, InternalError> {
        if let Some(existing) = self.child(parent, kind) {
            if self.is_read_only(existing) {
                self.check_mutable(parent, "add a child")?;
                return Err(InternalError::MixedNodeModes {
                    parent: self.kind(parent),
                    child: kind,
                });
            }
            return Ok(existing);
        }
        let data = make();
        if data.kind() != kind {
            return Err(InternalError::UnexpectedNodeKind {
                expected: kind,
                found: data.kind(),
            });
        }
        self.add_child(parent, data)
    }

    /// Replaces the first child of the same kind, or appends a new one.
    pub fn set_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, InternalError> {
        match self.child(parent, data.kind()) {
            Some(existing) => self.replace_child(parent, existing, data),
            None => self.add_child(parent, data),
        }
    }

    fn check_mutable(&self, id: NodeId, operation: &'static str) -> Result<(), InternalError> {
        if self.is_read_only(id) {
            return Err(InternalError::ReadOnlyNode {
                kind: self.kind(id),
                operation,
            });
        }
        Ok(())
    }

    fn check_contains(&self, parent: NodeId, child: NodeKind) -> Result<(), InternalError> {
        let parent_kind = self.kind(parent);
        if !parent_kind.can_contain(child) {
            return Err(InternalError::InvalidChild {
                parent: parent_kind,
                child,
            });
        }
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, InternalError> {
        self.children(parent)
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| InternalError::NotAChild {
                parent: self.kind(parent),
                child: self.kind(child),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Link, Links};
    use crate::dom::{LinkNode, LinksNode};
    use serde_json::json;

    fn link(rel: &str) -> NodeData {
        NodeData::Link(LinkNode {
            rel: rel.to_string(),
        })
    }

    #[test]
    fn test_replace_child_preserves_position() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let links = tree
            .add_child(root, NodeData::Links(LinksNode::ReadWrite))
            .unwrap();
        let first = tree.add_child(links, link("self")).unwrap();
        let second = tree.add_child(links, link("related")).unwrap();
        let third = tree.add_child(links, link("canonical")).unwrap();

        let replacement = tree.replace_child(links, second, link("describedby")).unwrap();

        assert_eq!(tree.children(links), &[first, replacement, third]);
        assert_eq!(tree.parent(second), None);
        assert_eq!(tree.parent(replacement), Some(links));
    }

    #[test]
    fn test_read_only_node_refuses_mutation() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let links = tree
            .add_child(
                root,
                NodeData::Links(LinksNode::ReadOnly(
                    Links::new().with("self", Link::new("/articles")),
                )),
            )
            .unwrap();

        let err = tree.add_child(links, link("self")).unwrap_err();
        assert!(matches!(err, InternalError::ReadOnlyNode { kind: NodeKind::Links, .. }));
        assert!(tree.get_mut(links).is_err());
    }

    #[test]
    fn test_get_or_add_rejects_read_only_child_under_read_write_parent() {
        let mut tree = DomTree::new();
        let root = tree.root();
        tree.add_child(root, NodeData::Links(LinksNode::ReadOnly(Links::new())))
            .unwrap();

        let err = tree
            .get_or_add_child(root, NodeKind::Links, || {
                NodeData::Links(LinksNode::ReadWrite)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            InternalError::MixedNodeModes {
                parent: NodeKind::Document,
                child: NodeKind::Links
            }
        ));
    }

    #[test]
    fn test_get_or_add_returns_existing_read_write_child() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let make = || NodeData::Links(LinksNode::ReadWrite);
        let first = tree.get_or_add_child(root, NodeKind::Links, make).unwrap();
        let second = tree.get_or_add_child(root, NodeKind::Links, make).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn test_invalid_child_kind_is_rejected() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let err = tree.add_child(root, NodeData::HRef("/x".to_string())).unwrap_err();
        assert!(matches!(
            err,
            InternalError::InvalidChild {
                parent: NodeKind::Document,
                child: NodeKind::HRef
            }
        ));
    }

    #[test]
    fn test_set_child_replaces_same_kind() {
        let mut tree = DomTree::new();
        let root = tree.root();
        tree.set_child(root, NodeData::Meta(json!({"a": 1}))).unwrap();
        let meta = tree.set_child(root, NodeData::Meta(json!({"b": 2}))).unwrap();

        assert_eq!(tree.children_of_kind(root, NodeKind::Meta), vec![meta]);
        assert!(matches!(tree.get(meta), NodeData::Meta(value) if value == &json!({"b": 2})));
    }

    #[test]
    fn test_remove_child_detaches() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let meta = tree.add_child(root, NodeData::Meta(json!({}))).unwrap();
        tree.remove_child(root, meta).unwrap();
        assert!(tree.children(root).is_empty());
        assert!(matches!(
            tree.remove_child(root, meta),
            Err(InternalError::NotAChild { .. })
        ));
    }
}
