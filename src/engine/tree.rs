//! Constructed-node tree.
//!
//! Each built node owns one element handle plus its structural links: a
//! parent back-reference and an ordered child list. Nodes live in a slot map
//! addressed by versioned [`BuiltId`] keys, so a handle to a replaced or torn
//! down node stops resolving instead of aliasing a newer node.

use std::fmt;

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::dom::NodeId;
use crate::types::Value;

// =============================================================================
// Handles
// =============================================================================

new_key_type! {
    /// Handle to a constructed node inside one engine.
    pub struct BuiltId;
}

impl fmt::Display for BuiltId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:?}", self.0)
    }
}

/// Back-reference from a constructed node to whatever holds its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Top-level node of the engine. Its visual parent is the host container.
    Root,
    /// Built through `add_node` without a parent.
    Detached,
    Node(BuiltId),
}

/// Result of interpreting content: one node, or the ordered nodes of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Built {
    One(BuiltId),
    Many(Vec<BuiltId>),
}

impl Built {
    pub fn ids(&self) -> &[BuiltId] {
        match self {
            Built::One(id) => std::slice::from_ref(id),
            Built::Many(ids) => ids,
        }
    }

    pub(crate) fn ids_mut(&mut self) -> &mut [BuiltId] {
        match self {
            Built::One(id) => std::slice::from_mut(id),
            Built::Many(ids) => ids,
        }
    }

    /// Position of `id` among these nodes.
    pub fn position(&self, id: BuiltId) -> Option<usize> {
        self.ids().iter().position(|slot| *slot == id)
    }

    /// The single node, if this is not a list.
    pub fn single(&self) -> Option<BuiltId> {
        match self {
            Built::One(id) => Some(*id),
            Built::Many(_) => None,
        }
    }
}

// =============================================================================
// Constructed Node
// =============================================================================

/// The runtime record of one interpreted definition.
#[derive(Debug)]
pub struct ConstructedNode {
    pub(crate) element: NodeId,
    pub(crate) parent: Parent,
    /// Ref names currently bound to this node. Usually zero or one; a
    /// replacement also inherits the names of the node it replaced.
    pub(crate) ref_names: SmallVec<[String; 1]>,
    /// The definition's `events` map, kept until the node is removed.
    pub(crate) events: IndexMap<String, Value>,
    pub(crate) children: Vec<BuiltId>,
}

impl ConstructedNode {
    pub(crate) fn new(element: NodeId, parent: Parent) -> Self {
        Self {
            element,
            parent,
            ref_names: SmallVec::new(),
            events: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn ref_names(&self) -> &[String] {
        &self.ref_names
    }

    pub fn events(&self) -> &IndexMap<String, Value> {
        &self.events
    }

    pub fn children(&self) -> &[BuiltId] {
        &self.children
    }
}

// =============================================================================
// Tree
// =============================================================================

#[derive(Default)]
pub(crate) struct Tree {
    nodes: SlotMap<BuiltId, ConstructedNode>,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("len", &self.nodes.len()).finish()
    }
}

impl Tree {
    pub(crate) fn insert(&mut self, node: ConstructedNode) -> BuiltId {
        self.nodes.insert(node)
    }

    pub(crate) fn get(&self, id: BuiltId) -> Option<&ConstructedNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: BuiltId) -> Option<&mut ConstructedNode> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn contains(&self, id: BuiltId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn element(&self, id: BuiltId) -> Option<NodeId> {
        self.get(id).map(|node| node.element)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Free the node and every descendant. Returns the subtree's root
    /// element so the caller can release it from the document.
    pub(crate) fn free_subtree(&mut self, id: BuiltId) -> Option<NodeId> {
        let root = self.nodes.remove(id)?;
        let mut stack = root.children;
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.remove(child) {
                stack.extend(node.children);
            }
        }
        Some(root.element)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_free_subtree() {
        let doc = Document::new();
        let mut tree = Tree::default();

        let list = doc.create_element("ul");
        let root = tree.insert(ConstructedNode::new(list, Parent::Root));
        let a = tree.insert(ConstructedNode::new(doc.create_element("li"), Parent::Node(root)));
        let b = tree.insert(ConstructedNode::new(doc.create_element("li"), Parent::Node(root)));
        tree.get_mut(root).unwrap().children.extend([a, b]);
        let other = tree.insert(ConstructedNode::new(doc.create_element("p"), Parent::Detached));

        assert_eq!(tree.free_subtree(root), Some(list));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert!(tree.contains(other));
        assert_eq!(tree.free_subtree(root), None);
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let doc = Document::new();
        let mut tree = Tree::default();

        let first = tree.insert(ConstructedNode::new(doc.create_element("div"), Parent::Root));
        tree.free_subtree(first);
        let second = tree.insert(ConstructedNode::new(doc.create_element("div"), Parent::Root));

        assert_ne!(first, second);
        assert!(tree.get(first).is_none());
        assert!(tree.get(second).is_some());
    }

    #[test]
    fn test_built_ids() {
        let doc = Document::new();
        let mut tree = Tree::default();
        let a = tree.insert(ConstructedNode::new(doc.create_element("div"), Parent::Root));
        let b = tree.insert(ConstructedNode::new(doc.create_element("div"), Parent::Root));

        assert_eq!(Built::One(a).ids(), &[a]);
        assert_eq!(Built::One(a).single(), Some(a));
        assert_eq!(Built::Many(vec![a, b]).ids(), &[a, b]);
        assert_eq!(Built::Many(vec![a]).single(), None);
    }
}
