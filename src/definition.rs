//! Node definitions - the declarative input.
//!
//! A [`NodeDef`] describes one element (or text node) and its children. The
//! well-known fields (`tag`, `text`, `ref`, `events`, `nodes`) are typed; every
//! other key goes into an ordered extension list that the interpreter turns
//! into event bindings, path assignments, properties or attributes, in
//! insertion order.
//!
//! [`Content`] is anything the interpreter accepts: a definition, a plain
//! string, a list of either, or an empty entry.
//!
//! # Example
//!
//! ```
//! use spark_dom::{Handler, NodeDef};
//!
//! let list = NodeDef::tag("ul")
//!     .prop("className", "todo")
//!     .child(NodeDef::tag("li").text("a"))
//!     .child(
//!         NodeDef::tag("li")
//!             .text("b")
//!             .with_ref("second")
//!             .on("click", Handler::new(|_| {})),
//!     );
//! assert_eq!(list.nodes.len(), 2);
//! ```

use indexmap::IndexMap;

use crate::types::{Handler, Value};

// =============================================================================
// Reserved Keys
// =============================================================================

/// Definition keys that are structural and never dispatched as properties.
pub const STRUCTURAL_KEYS: &[&str] = &["tag", "text", "ref", "events", "nodes", "_element"];

pub fn is_structural_key(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
}

// =============================================================================
// Node Definition
// =============================================================================

/// Declarative description of one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDef {
    /// Element kind. `None` builds the generic container.
    pub tag: Option<String>,
    /// Literal text. When set, the node is a text node whatever `tag` says.
    pub text: Option<String>,
    /// Symbolic name bound to the built element.
    pub ref_name: Option<String>,
    /// Event name → one handler or a list of handlers, in declaration order.
    pub events: IndexMap<String, Value>,
    /// Child content, in order.
    pub nodes: Vec<Content>,
    /// Extension keys, in insertion order.
    pub props: IndexMap<String, Value>,
}

impl NodeDef {
    /// A generic container.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_ref(mut self, name: impl Into<String>) -> Self {
        self.ref_name = Some(name.into());
        self
    }

    /// Add handlers to the `events` map. Repeated names append to the
    /// existing entry.
    pub fn on(mut self, event: impl Into<String>, handlers: impl Into<Value>) -> Self {
        let event = event.into();
        let handlers = handlers.into();
        match self.events.get_mut(&event) {
            Some(existing) => {
                let mut merged = match std::mem::take(existing) {
                    Value::Null => Vec::new(),
                    Value::List(items) => items,
                    single => vec![single],
                };
                match handlers {
                    Value::List(items) => merged.extend(items),
                    Value::Null => {}
                    single => merged.push(single),
                }
                *existing = Value::List(merged);
            }
            None => {
                self.events.insert(event, handlers);
            }
        }
        self
    }

    /// Set an extension key. Re-setting a key keeps its original position.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Shorthand for an ad-hoc event key (`click`, `input`) holding a handler.
    pub fn handler(self, event: impl Into<String>, handler: Handler) -> Self {
        self.prop(event, Value::Handler(handler))
    }

    /// Append one child.
    pub fn child(mut self, child: impl Into<Content>) -> Self {
        self.nodes.push(child.into());
        self
    }

    /// Replace the children. A single definition or string becomes a
    /// one-element list.
    pub fn nodes(mut self, nodes: impl Into<Content>) -> Self {
        self.nodes = match nodes.into() {
            Content::Empty => Vec::new(),
            Content::List(items) => items,
            single => vec![single],
        };
        self
    }
}

// =============================================================================
// Content
// =============================================================================

/// Interpretable input.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Content {
    /// A falsy entry. Skipped in child lists; builds a default container
    /// elsewhere.
    #[default]
    Empty,
    Text(String),
    Node(NodeDef),
    List(Vec<Content>),
}

impl Content {
    /// Empty entries and empty strings.
    pub fn is_falsy(&self) -> bool {
        match self {
            Content::Empty => true,
            Content::Text(text) => text.is_empty(),
            Content::Node(_) | Content::List(_) => false,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Content::List(_))
    }
}

impl From<NodeDef> for Content {
    fn from(def: NodeDef) -> Self {
        Content::Node(def)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Content::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Content>, const N: usize> From<[T; N]> for Content {
    fn from(items: [T; N]) -> Self {
        Content::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(item: Option<T>) -> Self {
        item.map_or(Content::Empty, Into::into)
    }
}
