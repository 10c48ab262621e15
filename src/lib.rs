//! # spark-dom
//!
//! Declarative element trees for Rust.
//!
//! Describe a tree of elements as nested [`NodeDef`]s, hand it to an
//! [`Engine`], and get back a live tree in a [`Document`] with every `ref`
//! name and event handler tracked, so any subtree can be replaced in place
//! and the whole thing torn down without leaving listeners behind.
//!
//! ## Architecture
//!
//! ```text
//! NodeDef / Content ──► Node Interpreter ──► Document elements
//!                            │
//!                            ├──► constructed-node tree (parent links, child slots)
//!                            ├──► Reference Registry   (ref name → node)
//!                            └──► Event Registry       (element → event → handlers)
//! ```
//!
//! The [`dom`] module is the element platform the engine builds into: an
//! arena document with HTML and SVG elements, per-kind property schemas,
//! attributes, inline style, dataset and event dispatch.
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use spark_dom::{Document, Engine, Event, Handler, NodeDef};
//!
//! let doc = Document::new();
//! let clicks = Rc::new(Cell::new(0));
//! let counter = clicks.clone();
//!
//! let mut engine = Engine::new(
//!     doc.clone(),
//!     NodeDef::tag("button")
//!         .with_ref("save")
//!         .child("Save")
//!         .on("click", Handler::new(move |_| counter.set(counter.get() + 1))),
//!     Some(doc.body()),
//! )
//! .unwrap();
//!
//! let button = engine.get("save").unwrap();
//! doc.dispatch_event(button, Event::new("click")).unwrap();
//! assert_eq!(clicks.get(), 1);
//!
//! engine.teardown();
//! assert!(doc.child_nodes(doc.body()).is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Values and handlers carried by definitions
//! - [`definition`] - Node definitions and content
//! - [`engine`] - Interpreter, registries, lifecycle
//! - [`dom`] - In-memory element platform
//! - [`error`] - Error type

pub mod definition;
pub mod dom;
pub mod engine;
pub mod error;
pub mod types;

pub use definition::{Content, NodeDef, STRUCTURAL_KEYS};
pub use dom::{Document, DomError, Event, Namespace, NodeId};
pub use engine::interpret::{plan_assignment, Assignment};
pub use engine::{
    supported_events, Built, BuiltId, ConstructedNode, Engine, Phase, Target, RESERVED_MEMBERS,
};
pub use engine::tree::Parent;
pub use error::{Error, Result};
pub use types::{Handler, Value};
