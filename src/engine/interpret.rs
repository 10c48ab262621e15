//! Node Interpreter - turns content into constructed nodes.
//!
//! Interpretation is top-down and recursive. Each definition produces one
//! element (or text node) and one constructed node; its extension keys are
//! applied in insertion order through [`plan_assignment`], then its `events`
//! map, then its `ref`, then its children.
//!
//! A definition that fails part way is rolled back: whatever the partial
//! subtree registered is released again before the error is returned.

use tracing::{trace, warn};

use super::introspect::events_for;
use super::tree::{Built, BuiltId, ConstructedNode, Parent};
use super::Engine;
use crate::definition::{is_structural_key, Content, NodeDef};
use crate::dom::{DomError, Namespace, NodeId, Prototype};
use crate::error::{Error, Result};
use crate::types::Value;

// =============================================================================
// Assignment Planning
// =============================================================================

/// How one extension key is applied to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Structural key, or a null value with nowhere to go.
    Skip,
    /// Key is a supported event name: attach the value as handlers.
    Event,
    /// Dotted key: assign through an object path.
    Path,
    /// Key names a schema property: set it directly, falling back to an
    /// attribute if the element rejects the set.
    Property,
    Attribute,
}

/// Pick the strategy for one key. `events` must be sorted.
pub fn plan_assignment(proto: &Prototype, events: &[&str], key: &str, value: &Value) -> Assignment {
    if is_structural_key(key) {
        Assignment::Skip
    } else if events.binary_search(&key).is_ok() {
        Assignment::Event
    } else if key.contains('.') {
        Assignment::Path
    } else if proto.find(key).is_some() {
        Assignment::Property
    } else if value.is_null() {
        Assignment::Skip
    } else {
        Assignment::Attribute
    }
}

// =============================================================================
// Interpreter
// =============================================================================

/// Falsy entries dropped, nested lists flattened in order.
fn flatten_children(nodes: Vec<Content>, out: &mut Vec<Content>) {
    for node in nodes {
        match node {
            Content::List(items) => flatten_children(items, out),
            node if node.is_falsy() => {}
            node => out.push(node),
        }
    }
}

impl Engine {
    /// Interpret `content` and attach the result under `parent`.
    ///
    /// With a parent, every built node is appended to the parent's child
    /// list and its element to the parent's element. Without one, the nodes
    /// stay detached but remain owned by the engine, so `teardown` still
    /// releases them.
    pub fn add_node(&mut self, content: impl Into<Content>, parent: Option<BuiltId>) -> Result<Built> {
        self.ensure_live()?;

        let Some(parent) = parent else {
            let built = self.build_content(content.into(), Parent::Detached)?;
            self.loose.extend_from_slice(built.ids());
            return Ok(built);
        };

        let parent_element = self
            .tree
            .element(parent)
            .ok_or_else(|| Error::UnresolvedTarget(parent.to_string()))?;
        if self.doc.is_text(parent_element) {
            return Err(DomError::HierarchyRequest("text nodes cannot have children").into());
        }

        let built = self.build_content(content.into(), Parent::Node(parent))?;
        let ids = built.ids();
        for (i, id) in ids.iter().enumerate() {
            if let Err(err) = self.attach_child(parent, parent_element, *id) {
                for rest in &ids[i + 1..] {
                    self.discard(*rest);
                }
                return Err(err);
            }
        }
        Ok(built)
    }

    /// Build a list as a list, anything else as a single node.
    pub(crate) fn build_content(&mut self, content: Content, parent: Parent) -> Result<Built> {
        match content {
            Content::List(items) => {
                let mut built = Vec::with_capacity(items.len());
                for item in items {
                    match self.build_content(item, parent) {
                        Ok(result) => built.extend_from_slice(result.ids()),
                        Err(err) => {
                            for id in built {
                                self.discard(id);
                            }
                            return Err(err);
                        }
                    }
                }
                Ok(Built::Many(built))
            }
            single => self.build_single(single, parent).map(Built::One),
        }
    }

    /// Build exactly one node. Falsy content builds a default container.
    pub(crate) fn build_single(&mut self, content: Content, parent: Parent) -> Result<BuiltId> {
        match content {
            Content::Text(text) if !text.is_empty() => {
                let element = self.doc.create_text_node(&text);
                Ok(self.tree.insert(ConstructedNode::new(element, parent)))
            }
            Content::Node(def) => self.build_node(def, parent),
            Content::Empty | Content::Text(_) => self.build_node(NodeDef::default(), parent),
            Content::List(_) => Err(Error::ReplaceWithList),
        }
    }

    fn build_node(&mut self, def: NodeDef, parent: Parent) -> Result<BuiltId> {
        // Refs are checked before anything is created for this node.
        if let Some(name) = &def.ref_name {
            self.refs.check(name)?;
        }

        let element = self.create_element(&def, parent);
        let id = self.tree.insert(ConstructedNode::new(element, parent));
        trace!(node = %id, element = %element, tag = def.tag.as_deref(), "build node");

        if let Err(err) = self.populate(id, element, def) {
            self.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    fn create_element(&self, def: &NodeDef, parent: Parent) -> NodeId {
        if let Some(text) = &def.text {
            return self.doc.create_text_node(text);
        }

        let parent_element = self.parent_element(parent);
        let in_foreign_object = parent_element
            .and_then(|el| self.doc.local_name(el))
            .is_some_and(|name| name.eq_ignore_ascii_case("foreignObject"));
        let is_svg_tag = def
            .tag
            .as_deref()
            .is_some_and(|tag| tag.eq_ignore_ascii_case("svg"));
        let parent_is_svg = parent_element
            .and_then(|el| self.doc.namespace(el))
            .is_some_and(|ns| ns == Namespace::Svg);

        if !in_foreign_object && (is_svg_tag || parent_is_svg) {
            self.doc
                .create_element_ns(Namespace::Svg, def.tag.as_deref().unwrap_or("g"))
        } else {
            self.doc.create_element(def.tag.as_deref().unwrap_or("div"))
        }
    }

    fn populate(&mut self, id: BuiltId, element: NodeId, def: NodeDef) -> Result<()> {
        let NodeDef {
            tag,
            ref_name,
            events,
            nodes,
            props,
            ..
        } = def;

        let proto = self
            .doc
            .prototype(element)
            .ok_or(DomError::StaleNode(element))?;
        let supported = events_for(tag.as_deref());

        for (key, value) in props {
            match plan_assignment(proto, &supported, &key, &value) {
                Assignment::Skip => {}
                Assignment::Event => self.events.add(&self.doc, element, &key, &value)?,
                Assignment::Path => self.doc.assign_path(element, &key, value)?,
                Assignment::Property => self.assign_property(element, &key, value)?,
                Assignment::Attribute => {
                    self.doc
                        .set_attribute(element, &key, &value.to_js_string())?
                }
            }
        }

        for (name, handlers) in &events {
            self.events.add(&self.doc, element, name, handlers)?;
        }
        if let Some(node) = self.tree.get_mut(id) {
            node.events = events;
        }

        if let Some(name) = ref_name {
            self.refs.bind(&name, id)?;
            if let Some(node) = self.tree.get_mut(id) {
                node.ref_names.push(name);
            }
        }

        let mut children = Vec::new();
        flatten_children(nodes, &mut children);
        for child in children {
            let child_id = self.build_single(child, Parent::Node(id))?;
            self.attach_child(id, element, child_id)?;
        }
        Ok(())
    }

    /// Direct set, falling back to an attribute when the element rejects the
    /// property as read-only.
    fn assign_property(&mut self, element: NodeId, key: &str, value: Value) -> Result<()> {
        match self.doc.set_property(element, key, value.clone()) {
            Err(DomError::ReadOnlyProperty { tag, .. }) => {
                if value.is_null() {
                    return Ok(());
                }
                warn!(%element, key, tag = %tag, "read-only property, falling back to attribute");
                self.doc
                    .set_attribute(element, key, &value.to_js_string())?;
                Ok(())
            }
            other => Ok(other?),
        }
    }

    /// Append a built child under its parent, in both trees. The child is
    /// discarded if the document refuses it.
    fn attach_child(&mut self, parent: BuiltId, parent_element: NodeId, child: BuiltId) -> Result<()> {
        let Some(child_element) = self.tree.element(child) else {
            return Ok(());
        };
        if let Err(err) = self.doc.append_child(parent_element, child_element) {
            self.discard(child);
            return Err(err.into());
        }
        if let Some(node) = self.tree.get_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Roll back a node that is not linked into any slot: release its
    /// bookkeeping, free its constructed subtree and its elements.
    pub(crate) fn discard(&mut self, id: BuiltId) {
        self.strip(id);
        if let Some(element) = self.tree.free_subtree(id) {
            if let Err(err) = self.doc.release(element) {
                trace!(%element, %err, "discard: element already gone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::schema::prototype_for;
    use crate::dom::Document;
    use crate::engine::introspect::supported_events;
    use crate::types::Handler;
    use pretty_assertions::assert_eq;

    fn build(content: impl Into<Content>) -> (Document, Engine) {
        let doc = Document::new();
        let engine = Engine::new(doc.clone(), content, Some(doc.body())).unwrap();
        (doc, engine)
    }

    fn root_element(engine: &Engine) -> NodeId {
        let id = engine.root().and_then(Built::single).unwrap();
        engine.node(id).unwrap().element()
    }

    // -------------------------------------------------------------------------
    // Planning
    // -------------------------------------------------------------------------

    #[test]
    fn test_plan_assignment_order() {
        let div = prototype_for(Namespace::Html, "div");
        let events = supported_events("div");
        let plan = |key: &str, value: Value| plan_assignment(div, &events, key, &value);

        assert_eq!(plan("nodes", Value::from("x")), Assignment::Skip);
        assert_eq!(plan("_element", Value::from("x")), Assignment::Skip);
        assert_eq!(plan("click", Value::Null), Assignment::Event);
        assert_eq!(plan("style.color", Value::from("red")), Assignment::Path);
        assert_eq!(plan("className", Value::from("a")), Assignment::Property);
        assert_eq!(plan("onclick", Value::Null), Assignment::Property);
        assert_eq!(plan("aria-label", Value::from("a")), Assignment::Attribute);
        assert_eq!(plan("aria-label", Value::Null), Assignment::Skip);
    }

    #[test]
    fn test_plan_uses_element_schema() {
        let events = supported_events("div");
        let svg = prototype_for(Namespace::Svg, "svg");
        let div = prototype_for(Namespace::Html, "div");

        assert_eq!(
            plan_assignment(svg, &events, "width", &Value::from(10)),
            Assignment::Property
        );
        assert_eq!(
            plan_assignment(div, &events, "width", &Value::from(10)),
            Assignment::Attribute
        );
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_with_text() {
        let (doc, engine) = build(
            NodeDef::tag("ul").nodes(vec![NodeDef::tag("li").text("a"), NodeDef::tag("li").text("b")]),
        );
        let ul = root_element(&engine);

        // `text` wins over `tag`.
        assert_eq!(doc.outer_html(ul).as_deref(), Some("<ul>ab</ul>"));
    }

    #[test]
    fn test_string_children_and_falsy_skipped() {
        let (doc, engine) = build(NodeDef::tag("p").nodes(vec![
            Content::from("hello "),
            Content::Empty,
            Content::from(""),
            Content::from(NodeDef::tag("b").nodes("world")),
        ]));
        let p = root_element(&engine);

        assert_eq!(doc.outer_html(p).as_deref(), Some("<p>hello <b>world</b></p>"));
        let root = engine.root().and_then(Built::single).unwrap();
        assert_eq!(engine.node(root).unwrap().children().len(), 2);
    }

    #[test]
    fn test_nested_child_lists_flatten() {
        let (doc, engine) = build(NodeDef::tag("ol").nodes(vec![
            Content::from(NodeDef::tag("li").nodes("1")),
            Content::from(vec![NodeDef::tag("li").nodes("2"), NodeDef::tag("li").nodes("3")]),
        ]));

        assert_eq!(
            doc.outer_html(root_element(&engine)).as_deref(),
            Some("<ol><li>1</li><li>2</li><li>3</li></ol>")
        );
    }

    #[test]
    fn test_default_tag_and_empty_root() {
        let (doc, engine) = build(Content::Empty);
        assert_eq!(doc.tag_name(root_element(&engine)).as_deref(), Some("DIV"));

        let (doc, engine) = build(vec![Content::Empty, Content::from("x")]);
        let ids = engine.root().unwrap().ids().to_vec();
        assert_eq!(ids.len(), 2);
        let first = engine.node(ids[0]).unwrap().element();
        let second = engine.node(ids[1]).unwrap().element();
        assert_eq!(doc.tag_name(first).as_deref(), Some("DIV"));
        assert!(doc.is_text(second));
    }

    #[test]
    fn test_properties_and_attributes() {
        let (doc, engine) = build(
            NodeDef::tag("input")
                .prop("className", "field")
                .prop("value", "hi")
                .prop("disabled", true)
                .prop("aria-label", "name")
                .prop("data-skip", Value::Null),
        );
        let input = root_element(&engine);

        assert_eq!(doc.get_attribute(input, "class").as_deref(), Some("field"));
        assert_eq!(doc.get_property(input, "value").unwrap(), Value::from("hi"));
        assert_eq!(doc.get_attribute(input, "disabled").as_deref(), Some(""));
        assert_eq!(doc.get_attribute(input, "aria-label").as_deref(), Some("name"));
        assert_eq!(doc.get_attribute(input, "data-skip"), None);
    }

    #[test]
    fn test_path_assignment() {
        let (doc, engine) = build(
            NodeDef::new()
                .prop("style.backgroundColor", "red")
                .prop("dataset.userId", "7"),
        );
        let div = root_element(&engine);

        assert_eq!(doc.style_property(div, "backgroundColor").as_deref(), Some("red"));
        assert_eq!(doc.get_attribute(div, "data-user-id").as_deref(), Some("7"));
    }

    #[test]
    fn test_invalid_path_leaves_nothing() {
        let doc = Document::new();
        let before = doc.live_nodes();

        let err = Engine::new(
            doc.clone(),
            NodeDef::new()
                .with_ref("outer")
                .child(NodeDef::tag("span").prop("foo.bar", "x")),
            Some(doc.body()),
        )
        .unwrap_err();

        assert_eq!(err, Error::InvalidPath("foo.bar".into()));
        assert_eq!(doc.live_nodes(), before);
    }

    #[test]
    fn test_svg_namespace_and_read_only_fallback() {
        let (doc, engine) = build(
            NodeDef::tag("svg")
                .prop("width", 100)
                .prop("height", Value::Null)
                .child(NodeDef::tag("circle").prop("r", 5).prop("className", "dot"))
                .child(NodeDef::new()),
        );
        let svg = root_element(&engine);
        let children = doc.child_nodes(svg);

        assert_eq!(doc.namespace(svg), Some(Namespace::Svg));
        assert_eq!(doc.get_attribute(svg, "width").as_deref(), Some("100"));
        assert_eq!(doc.get_attribute(svg, "height"), None);
        assert_eq!(doc.namespace(children[0]), Some(Namespace::Svg));
        assert_eq!(doc.get_attribute(children[0], "r").as_deref(), Some("5"));
        assert_eq!(doc.get_attribute(children[0], "className").as_deref(), Some("dot"));
        assert_eq!(doc.local_name(children[1]).as_deref(), Some("g"));
    }

    #[test]
    fn test_foreign_object_breaks_to_html() {
        let (doc, engine) = build(NodeDef::tag("svg").child(
            NodeDef::tag("foreignObject").child(NodeDef::tag("div").child(NodeDef::tag("span"))),
        ));
        let svg = root_element(&engine);
        let foreign = doc.child_nodes(svg)[0];
        let div = doc.child_nodes(foreign)[0];
        let span = doc.child_nodes(div)[0];

        assert_eq!(doc.namespace(foreign), Some(Namespace::Svg));
        assert_eq!(doc.namespace(div), Some(Namespace::Html));
        assert_eq!(doc.namespace(span), Some(Namespace::Html));
    }

    #[test]
    fn test_svg_host_puts_top_level_in_svg() {
        let doc = Document::new();
        let host = doc.create_element_ns(Namespace::Svg, "svg");
        let engine = Engine::new(doc.clone(), NodeDef::tag("rect"), Some(host)).unwrap();

        assert_eq!(doc.namespace(root_element(&engine)), Some(Namespace::Svg));
    }

    #[test]
    fn test_event_keys_and_events_map() {
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let make = |label: &'static str| {
            let order = order.clone();
            Handler::new(move |_| order.borrow_mut().push(label))
        };

        let (doc, engine) = build(
            NodeDef::tag("button")
                .on("click", vec![make("map-1"), make("map-2")])
                .handler("click", make("key")),
        );
        let button = root_element(&engine);
        doc.dispatch_event(button, crate::dom::Event::new("click"))
            .unwrap();

        // Extension keys first, then the events map in its own order.
        assert_eq!(*order.borrow(), vec!["key", "map-1", "map-2"]);
        assert_eq!(engine.bound_events(button)[0].1.len(), 3);
        let root = engine.root().and_then(Built::single).unwrap();
        assert_eq!(engine.node(root).unwrap().events().len(), 1);
    }

    #[test]
    fn test_media_event_keys() {
        let (_, engine) = build(NodeDef::tag("video").handler("encrypted", Handler::new(|_| {})));
        let video = root_element(&engine);
        assert_eq!(engine.bound_events(video)[0].0, "encrypted");

        // Not an event on a div: stored as a plain attribute.
        let (doc, engine) = build(NodeDef::new().prop("encrypted", "yes"));
        let div = root_element(&engine);
        assert_eq!(doc.get_attribute(div, "encrypted").as_deref(), Some("yes"));
        assert!(engine.bound_events(div).is_empty());
    }

    #[test]
    fn test_invalid_handler_rolls_back() {
        let doc = Document::new();
        let before = doc.live_nodes();

        let err = Engine::new(
            doc.clone(),
            NodeDef::tag("ul").with_ref("list").nodes(vec![
                NodeDef::tag("li").on("click", Handler::new(|_| {})).with_ref("a"),
                NodeDef::tag("li").on("click", Value::from("not a function")),
            ]),
            Some(doc.body()),
        )
        .unwrap_err();

        assert_eq!(
            err,
            Error::InvalidHandler {
                event: "click".into()
            }
        );
        assert_eq!(doc.live_nodes(), before);
    }

    #[test]
    fn test_duplicate_ref_stops_before_second_node() {
        let doc = Document::new();
        let before = doc.live_nodes();

        let err = Engine::new(
            doc.clone(),
            NodeDef::new().nodes(vec![
                NodeDef::tag("span").with_ref("x"),
                NodeDef::tag("em").with_ref("x"),
            ]),
            None,
        )
        .unwrap_err();

        assert_eq!(err, Error::DuplicateRef("x".into()));
        assert_eq!(doc.live_nodes(), before);
    }

    #[test]
    fn test_reserved_ref() {
        let doc = Document::new();
        let err = Engine::new(doc, NodeDef::new().with_ref("teardown"), None).unwrap_err();
        assert_eq!(err, Error::ReservedRef("teardown".into()));
    }

    // -------------------------------------------------------------------------
    // add_node
    // -------------------------------------------------------------------------

    #[test]
    fn test_add_node_under_parent() {
        let (doc, mut engine) = build(NodeDef::tag("ul").with_ref("list"));
        let list = engine.get_node("list").unwrap();

        let built = engine
            .add_node(vec![NodeDef::tag("li").text("a"), NodeDef::tag("li").text("b")], Some(list))
            .unwrap();

        assert_eq!(built.ids().len(), 2);
        assert_eq!(engine.node(list).unwrap().children(), built.ids());
        assert_eq!(
            doc.outer_html(engine.get("list").unwrap()).as_deref(),
            Some("<ul>ab</ul>")
        );
        for id in built.ids() {
            assert_eq!(engine.node(*id).unwrap().parent(), Parent::Node(list));
        }
    }

    #[test]
    fn test_add_node_detached() {
        let (doc, mut engine) = build(NodeDef::new());

        let built = engine.add_node(NodeDef::tag("aside").with_ref("side"), None).unwrap();
        let id = built.single().unwrap();
        let aside = engine.get("side").unwrap();

        assert_eq!(engine.node(id).unwrap().parent(), Parent::Detached);
        assert_eq!(doc.parent_node(aside), None);
    }

    #[test]
    fn test_add_node_under_text_is_rejected() {
        let (_, mut engine) = build(NodeDef::new().child("text"));
        let root = engine.root().and_then(Built::single).unwrap();
        let text = engine.node(root).unwrap().children()[0];

        assert!(matches!(
            engine.add_node(NodeDef::new(), Some(text)),
            Err(Error::Dom(DomError::HierarchyRequest(_)))
        ));
    }
}
