//! Tree Engine - builds element trees from node definitions and owns their
//! lifecycle.
//!
//! The engine is split the way the work is:
//! - [`interpret`]: Node Interpreter, definition → constructed node
//! - [`registry`]: Reference Registry, `ref` name → constructed node
//! - [`events`]: Event Registry, element → handlers per event name
//! - [`lifecycle`]: mount, unmount, replace, remove, teardown
//! - [`introspect`]: supported event names per element kind
//! - [`tree`]: arena of constructed nodes
//!
//! # Architecture
//!
//! Elements live in the [`Document`]. The engine keeps its own arena of
//! constructed nodes that mirror the definition tree, each owning one element
//! handle. Both registries are side tables keyed by handles, so nothing in
//! the engine keeps an element alive by reference.
//!
//! ```text
//! Engine
//! ├── root ─────────► Built::One(@0) | Built::Many([@0, @3])
//! ├── tree:   @0 ul ──► [@1 li, @2 li]
//! ├── refs:   "second" → @2
//! └── events: #5 → [("click", [h1, h2])]
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Constructed ──mount──► Mounted ◄──mount/unmount──► Unmounted
//!      └──────────────────────┴────────teardown───────────┴──► TornDown
//! ```

pub mod events;
pub mod interpret;
pub mod introspect;
pub mod lifecycle;
pub mod registry;
pub mod tree;

use tracing::debug;

use crate::definition::Content;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::types::{Handler, Value};

use events::EventRegistry;
use registry::RefRegistry;
use tree::{Parent, Tree};

pub use events::Target;
pub use introspect::supported_events;
pub use registry::{is_reserved_member, RESERVED_MEMBERS};
pub use tree::{Built, BuiltId, ConstructedNode};

/// Lifecycle phase of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built, never mounted.
    Constructed,
    Mounted,
    Unmounted,
    /// Terminal. Every mutating operation fails with [`Error::TornDown`].
    TornDown,
}

/// Builds and owns one element tree.
///
/// # Example
///
/// ```
/// use spark_dom::{Document, Engine, NodeDef};
///
/// let doc = Document::new();
/// let engine = Engine::new(
///     doc.clone(),
///     NodeDef::tag("ul").nodes(vec![
///         NodeDef::tag("li").text("a"),
///         NodeDef::tag("li").text("b").with_ref("second"),
///     ]),
///     Some(doc.body()),
/// )
/// .unwrap();
///
/// let second = engine.get("second").unwrap();
/// assert_eq!(doc.text_content(second).as_deref(), Some("b"));
/// ```
#[derive(Debug)]
pub struct Engine {
    doc: Document,
    tree: Tree,
    refs: RefRegistry,
    events: EventRegistry,
    root: Option<Built>,
    /// Nodes built through `add_node` without a parent.
    loose: Vec<BuiltId>,
    host: Option<NodeId>,
    phase: Phase,
}

impl Engine {
    /// Build `content` into `doc`, then mount it into `host` when one is
    /// given.
    ///
    /// A failed construction leaves no refs, listeners or elements behind.
    pub fn new(doc: Document, content: impl Into<Content>, host: Option<NodeId>) -> Result<Self> {
        let mut engine = Self {
            doc,
            tree: Tree::default(),
            refs: RefRegistry::default(),
            events: EventRegistry::default(),
            root: None,
            loose: Vec::new(),
            host,
            phase: Phase::Constructed,
        };

        let root = engine.build_content(content.into(), Parent::Root)?;
        debug!(nodes = engine.tree.len(), top_level = root.ids().len(), "engine constructed");
        engine.root = Some(root);

        if host.is_some() {
            if let Err(err) = engine.mount(None) {
                engine.teardown();
                return Err(err);
            }
        }
        Ok(engine)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Element bound to a ref name.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.refs.get(name).and_then(|id| self.tree.element(id))
    }

    /// Constructed node bound to a ref name.
    pub fn get_node(&self, name: &str) -> Option<BuiltId> {
        self.refs.get(name).filter(|id| self.tree.contains(*id))
    }

    pub fn node(&self, id: BuiltId) -> Option<&ConstructedNode> {
        self.tree.get(id)
    }

    /// Top-level node(s). `None` once torn down.
    pub fn root(&self) -> Option<&Built> {
        self.root.as_ref()
    }

    pub fn host(&self) -> Option<NodeId> {
        self.host
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bound ref names, sorted.
    pub fn ref_names(&self) -> Vec<&str> {
        self.refs.names()
    }

    /// Handlers the engine has attached to `element`, grouped by event name
    /// in attachment order.
    pub fn bound_events(&self, element: NodeId) -> Vec<(&str, &[Handler])> {
        self.events.bound(element)
    }

    /// Number of elements with at least one handler attached by the engine.
    pub fn bound_element_count(&self) -> usize {
        self.events.len()
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Attach one handler or a list of handlers to an element or ref.
    ///
    /// A null value is ignored. Every entry must be a handler; nothing is
    /// attached when one is not.
    pub fn add_event<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        event: &str,
        handlers: impl Into<Value>,
    ) -> Result<()> {
        self.ensure_live()?;
        let handlers = handlers.into();
        if handlers.is_null() {
            return Ok(());
        }
        let element = self.resolve(target.into())?;
        self.events.add(&self.doc, element, event, &handlers)
    }

    /// Detach handlers from an element or ref: one handler, every handler
    /// for `event`, or everything when `event` is `None`.
    ///
    /// An element given directly is accepted even after the document released
    /// it, so its record can still be dropped. Records of released elements
    /// are pruned on every call.
    pub fn remove_event<'a>(
        &mut self,
        target: impl Into<Target<'a>>,
        event: Option<&str>,
        handler: Option<&Handler>,
    ) -> Result<()> {
        self.ensure_live()?;
        let element = match target.into() {
            Target::Element(id) => id,
            target => self.resolve(target)?,
        };
        self.events.remove(&self.doc, element, event, handler);
        self.events.prune_released(&self.doc);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_live(&self) -> Result<()> {
        if self.phase == Phase::TornDown {
            return Err(Error::TornDown);
        }
        Ok(())
    }

    /// Element for a target. Released elements and unbound names do not
    /// resolve.
    fn resolve(&self, target: Target<'_>) -> Result<NodeId> {
        let element = match target {
            Target::Element(id) => Some(id),
            Target::Ref(name) => self.get(name),
        };
        element
            .filter(|id| self.doc.contains(*id))
            .ok_or_else(|| Error::UnresolvedTarget(target.to_string()))
    }

    /// Element that a node in this slot sits under.
    fn parent_element(&self, parent: Parent) -> Option<NodeId> {
        match parent {
            Parent::Root => self.host,
            Parent::Detached => None,
            Parent::Node(id) => self.tree.element(id),
        }
    }

    /// Child list that holds nodes with this parent.
    fn slots_mut(&mut self, parent: Parent) -> Option<&mut [BuiltId]> {
        match parent {
            Parent::Root => self.root.as_mut().map(Built::ids_mut),
            Parent::Detached => Some(self.loose.as_mut_slice()),
            Parent::Node(id) => self.tree.get_mut(id).map(|node| node.children.as_mut_slice()),
        }
    }

    fn top_level(&self) -> Vec<BuiltId> {
        self.root.as_ref().map(|r| r.ids().to_vec()).unwrap_or_default()
    }
}
