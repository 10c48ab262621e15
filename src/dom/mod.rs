//! In-memory element platform.
//!
//! The engine builds into a [`Document`]: an arena of element and text nodes
//! addressed by versioned [`NodeId`] slot-map keys. It covers the subset of a
//! browser document the engine relies on:
//!
//! - HTML and SVG element creation, text nodes
//! - Tree mutation (`append_child`, `replace_child`, `remove`)
//! - Per-kind property schemas with read-only properties ([`schema`])
//! - Attributes, inline style and dataset
//! - Listener registration and synchronous dispatch with bubbling
//! - Explicit release of detached subtrees
//!
//! `Document` is a cheap-clone handle; every clone sees the same nodes.
//! Dispatch runs handlers outside the internal borrow, so a handler may call
//! back into the document.
//!
//! # Example
//!
//! ```
//! use spark_dom::dom::{Document, Event};
//! use spark_dom::Handler;
//!
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! doc.append_child(doc.body(), button).unwrap();
//! doc.add_event_listener(button, "click", Handler::new(|_| {})).unwrap();
//!
//! assert_eq!(doc.dispatch_event(button, Event::new("click")).unwrap(), 1);
//! ```

mod element;
mod error;
mod properties;
pub mod schema;
mod serialize;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use crate::types::{Handler, Value};

use element::{ElementData, NodeData, NodeKind};

pub use error::DomError;
pub use schema::{PropDescriptor, PropFlags, PropKind, Prototype};

pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

// =============================================================================
// Handles
// =============================================================================

/// Element namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    Svg,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => HTML_NS,
            Namespace::Svg => SVG_NS,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            HTML_NS => Some(Namespace::Html),
            SVG_NS => Some(Namespace::Svg),
            _ => None,
        }
    }
}

/// Identity of a node in a [`Document`].
///
/// Copyable and hashable. Holding a `NodeId` does not keep the node alive;
/// once the node is released the id stops resolving, even if its slot is
/// reused.
new_key_type! {
    pub struct NodeId;
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:?}", self.0)
    }
}

// =============================================================================
// Event
// =============================================================================

/// An event being dispatched.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    /// A non-bubbling event.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
        }
    }

    /// A bubbling event.
    pub fn bubbling(event_type: impl Into<String>) -> Self {
        Self {
            bubbles: true,
            ..Self::new(event_type)
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// The node the event was dispatched to.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// The node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Stop after the current node's listeners have run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

// =============================================================================
// Document
// =============================================================================

pub(crate) struct DocumentInner {
    nodes: SlotMap<NodeId, NodeData>,
    body: NodeId,
}

/// Handle to an element document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("body", &inner.body)
            .field("live_nodes", &inner.nodes.len())
            .finish()
    }
}

impl Document {
    /// Create a document with an empty `<body>`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeData::new(NodeKind::Element(ElementData::new(
            Namespace::Html,
            "body",
        ))));
        Self {
            inner: Rc::new(RefCell::new(DocumentInner { nodes, body })),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Create a detached HTML element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.create_element_ns(Namespace::Html, tag)
    }

    /// Create a detached element in the given namespace.
    pub fn create_element_ns(&self, namespace: Namespace, tag: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.create(NodeKind::Element(ElementData::new(namespace, tag)));
        trace!(node = %id, tag, ?namespace, "create element");
        id
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.inner
            .borrow_mut()
            .create(NodeKind::Text(text.to_string()))
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Whether the node is still alive.
    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(node)
    }

    /// Number of nodes alive in the document, body included.
    pub fn live_nodes(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).ok().and_then(|n| n.parent)
    }

    pub fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(
            self.inner.borrow().node(node).map(|n| &n.kind),
            Ok(NodeKind::Text(_))
        )
    }

    /// Namespace of an element; `None` for text nodes.
    pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
        let inner = self.inner.borrow();
        inner.node(node).ok()?.element().map(|el| el.namespace)
    }

    /// Local name of an element (`div`, `foreignObject`).
    pub fn local_name(&self, node: NodeId) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .node(node)
            .ok()?
            .element()
            .map(|el| el.local_name.clone())
    }

    /// `tagName` of an element (`DIV`, `foreignObject`).
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        let inner = self.inner.borrow();
        inner.node(node).ok()?.element().map(ElementData::tag_name)
    }

    pub fn prototype(&self, node: NodeId) -> Option<&'static Prototype> {
        self.inner.borrow().node(node).ok().map(NodeData::prototype)
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: NodeId) -> Option<String> {
        let inner = self.inner.borrow();
        inner.node(node).ok()?;
        Some(inner.text_content(node))
    }

    /// Markup for the node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().outer_html(node)
    }

    // -------------------------------------------------------------------------
    // Tree mutation
    // -------------------------------------------------------------------------

    /// Append `child` to `parent`, moving it out of its current parent.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.inner.borrow_mut().append_child(parent, child)
    }

    /// Put `new_child` in `old_child`'s position under `parent`. `old_child`
    /// ends up detached.
    pub fn replace_child(
        &self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        self.inner
            .borrow_mut()
            .replace_child(parent, new_child, old_child)
    }

    /// Detach the node from its parent. No-op when already detached.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.inner.borrow_mut().detach(node)
    }

    /// Detach and free the node and its whole subtree, listeners included.
    /// Returns the number of nodes freed.
    pub fn release(&self, node: NodeId) -> Result<usize, DomError> {
        self.inner.borrow_mut().release(node)
    }

    // -------------------------------------------------------------------------
    // Properties and attributes
    // -------------------------------------------------------------------------

    /// Whether the node's kind exposes a property with this name.
    pub fn has_property(&self, node: NodeId, name: &str) -> bool {
        self.prototype(node)
            .is_some_and(|proto| proto.find(name).is_some())
    }

    pub fn get_property(&self, node: NodeId, name: &str) -> Result<Value, DomError> {
        self.inner.borrow().get_property(node, name)
    }

    /// Assign a property. Read-only properties reject the assignment with
    /// [`DomError::ReadOnlyProperty`].
    pub fn set_property(&self, node: NodeId, name: &str, value: Value) -> Result<(), DomError> {
        self.inner.borrow_mut().set_property(node, name, value)
    }

    /// Assign through a dotted path such as `style.color` or
    /// `dataset.userId`.
    pub fn assign_path(&self, node: NodeId, path: &str, value: Value) -> Result<(), DomError> {
        self.inner.borrow_mut().assign_path(node, path, value)
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        inner.node(node).ok()?.element()?.get_attribute(name)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let el = inner
            .node_mut(node)?
            .element_mut()
            .ok_or(DomError::NotAnElement)?;
        el.set_attribute(name, value);
        Ok(())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<bool, DomError> {
        let mut inner = self.inner.borrow_mut();
        let el = inner
            .node_mut(node)?
            .element_mut()
            .ok_or(DomError::NotAnElement)?;
        Ok(el.remove_attribute(name))
    }

    /// One inline style declaration (`color`, `backgroundColor`).
    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .node(node)
            .ok()?
            .element()?
            .style_property(name)
            .map(str::to_string)
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Register a listener. Registering the same handler twice for the same
    /// event type is ignored; returns whether it was added.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        handler: Handler,
    ) -> Result<bool, DomError> {
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(node)?;
        let handlers = data.listeners.entry(event_type.to_string()).or_default();
        if handlers.iter().any(|h| h.ptr_eq(&handler)) {
            return Ok(false);
        }
        handlers.push(handler);
        Ok(true)
    }

    /// Remove a listener. Returns whether one was removed; unknown nodes and
    /// handlers are a no-op.
    pub fn remove_event_listener(&self, node: NodeId, event_type: &str, handler: &Handler) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Ok(data) = inner.node_mut(node) else {
            return false;
        };
        let Some(handlers) = data.listeners.get_mut(event_type) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|h| !h.ptr_eq(handler));
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            data.listeners.shift_remove(event_type);
        }
        removed
    }

    /// Listeners registered on the node for one event type.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.inner
            .borrow()
            .node(node)
            .ok()
            .and_then(|n| n.listeners_for(event_type))
            .map_or(0, Vec::len)
    }

    /// Listeners registered on the node for all event types.
    pub fn total_listener_count(&self, node: NodeId) -> usize {
        self.inner.borrow().node(node).map_or(0, |n| {
            n.listeners.values().map(Vec::len).sum()
        })
    }

    /// Dispatch an event at `target`.
    ///
    /// Listeners run in registration order, followed by the node's `on*`
    /// handler property if one is set. Bubbling events then visit each
    /// ancestor. Returns the number of handlers invoked.
    pub fn dispatch_event(&self, target: NodeId, event: Event) -> Result<usize, DomError> {
        let path = {
            let inner = self.inner.borrow();
            inner.node(target)?;
            let mut path = vec![target];
            if event.bubbles {
                let mut current = inner.node(target)?.parent;
                while let Some(id) = current {
                    path.push(id);
                    current = inner.node(id).ok().and_then(|n| n.parent);
                }
            }
            path
        };

        event.target.set(Some(target));
        let handler_prop = format!("on{}", event.event_type);
        let mut invoked = 0;

        for node in path {
            // Snapshot so handlers can mutate the document.
            let handlers: Vec<Handler> = {
                let inner = self.inner.borrow();
                let Ok(data) = inner.node(node) else {
                    continue;
                };
                let mut handlers = data
                    .listeners_for(&event.event_type)
                    .cloned()
                    .unwrap_or_default();
                if let Some(Value::Handler(h)) =
                    data.element().and_then(|el| el.prop(&handler_prop))
                {
                    handlers.push(h.clone());
                }
                handlers
            };

            event.current_target.set(Some(node));
            for handler in &handlers {
                handler.call(&event);
                invoked += 1;
            }
            if event.propagation_stopped.get() {
                break;
            }
        }

        event.current_target.set(None);
        Ok(invoked)
    }
}

// =============================================================================
// Inner tree operations
// =============================================================================

impl DocumentInner {
    fn create(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(NodeData::new(kind))
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id).ok_or(DomError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::StaleNode(id))
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_data = self.node(parent)?;
        self.node(child)?;
        if parent_data.element().is_none() {
            return Err(DomError::HierarchyRequest("text nodes cannot have children"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest(
                "the new child is an ancestor of the parent",
            ));
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.node_mut(id)?.parent.take();
        if let Some(parent) = parent {
            if let Ok(parent_data) = self.node_mut(parent) {
                parent_data.children.retain(|c| *c != id);
            }
        }
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, new_child)?;
        if self.node(old_child)?.parent != Some(parent) {
            return Err(DomError::NotAChild);
        }
        if new_child == old_child {
            return Ok(());
        }

        // Detaching may shift the old child's index when both share a parent.
        self.detach(new_child)?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == old_child)
            .ok_or(DomError::NotAChild)?;

        self.node_mut(parent)?.children[index] = new_child;
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(old_child)?.parent = None;
        Ok(())
    }

    fn release(&mut self, id: NodeId) -> Result<usize, DomError> {
        if id == self.body {
            return Err(DomError::HierarchyRequest("the body cannot be released"));
        }
        self.detach(id)?;

        let mut stack = vec![id];
        let mut released = 0;
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.remove(current) {
                stack.extend(data.children);
                released += 1;
            }
        }
        trace!(node = %id, released, "release subtree");
        Ok(released)
    }

    fn text_content(&self, id: NodeId) -> String {
        let Ok(data) = self.node(id) else {
            return String::new();
        };
        match &data.kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element(_) => data
                .children
                .iter()
                .map(|child| self.text_content(*child))
                .collect(),
        }
    }

    fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.body, id)
    }
}
