//! Lifecycle Controller - mount, unmount, replace, remove, teardown.
//!
//! Mounting only relates top-level elements to the host container; it never
//! touches the registries. Removal is the reverse: it releases bookkeeping
//! (listeners and refs) without detaching anything. Replace and teardown
//! combine the two.

use tracing::{debug, trace};

use super::tree::{BuiltId, Parent};
use super::{Engine, Phase};
use crate::definition::Content;
use crate::dom::NodeId;
use crate::error::{Error, Result};

impl Engine {
    /// Attach every top-level element to the host, updating the host first
    /// when one is given. Elements already under the host stay where they
    /// are, so mounting twice is a no-op.
    pub fn mount(&mut self, host: Option<NodeId>) -> Result<()> {
        self.ensure_live()?;
        if host.is_some() {
            self.host = host;
        }
        let host = self.host.ok_or(Error::NoHost)?;

        for id in self.top_level() {
            let Some(element) = self.tree.element(id) else {
                continue;
            };
            if self.doc.parent_node(element) != Some(host) {
                self.doc.append_child(host, element)?;
            }
        }
        self.phase = Phase::Mounted;
        debug!(%host, "mount");
        Ok(())
    }

    /// Detach every top-level element from whatever it is attached to.
    pub fn unmount(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.detach_top_level()?;
        if self.phase == Phase::Mounted {
            self.phase = Phase::Unmounted;
        }
        debug!("unmount");
        Ok(())
    }

    /// Rebuild the node bound to `name` from `content`, in place.
    ///
    /// The old node's listeners and refs are released first. The new node is
    /// built against the old node's parent and takes its exact position in
    /// both the parent's child list and the parent element. Every name bound
    /// to the old node is rebound to the new one. The old subtree is freed.
    pub fn replace_node(&mut self, name: &str, content: impl Into<Content>) -> Result<BuiltId> {
        self.ensure_live()?;
        let content = content.into();
        if content.is_list() {
            return Err(Error::ReplaceWithList);
        }
        let old_id = self
            .get_node(name)
            .ok_or_else(|| Error::InvalidReplaceRef(name.to_string()))?;
        let (old_element, parent, old_names) = match self.tree.get(old_id) {
            Some(node) => (node.element, node.parent, node.ref_names.clone()),
            None => return Err(Error::InvalidReplaceRef(name.to_string())),
        };

        self.strip(old_id);

        let new_id = self.build_single(content, parent)?;
        let Some(new_element) = self.tree.element(new_id) else {
            return Err(Error::InvalidReplaceRef(name.to_string()));
        };

        let visual_parent = match parent {
            Parent::Node(id) => self.tree.element(id),
            Parent::Root | Parent::Detached => self.doc.parent_node(old_element),
        };
        if let Some(visual_parent) = visual_parent {
            if let Err(err) = self.doc.replace_child(visual_parent, new_element, old_element) {
                self.discard(new_id);
                return Err(err.into());
            }
        }

        if let Some(slot) = self
            .slots_mut(parent)
            .and_then(|slots| slots.iter_mut().find(|slot| **slot == old_id))
        {
            *slot = new_id;
        }

        for old_name in old_names {
            let already_bound = self
                .tree
                .get(new_id)
                .is_some_and(|node| node.ref_names.contains(&old_name));
            if already_bound {
                continue;
            }
            self.refs.rebind(&old_name, new_id);
            if let Some(node) = self.tree.get_mut(new_id) {
                node.ref_names.push(old_name);
            }
        }

        if let Some(element) = self.tree.free_subtree(old_id) {
            if let Err(err) = self.doc.release(element) {
                trace!(%element, %err, "replace: old element already gone");
            }
        }
        debug!(name, old = %old_id, new = %new_id, "replace node");
        Ok(new_id)
    }

    /// Release listeners and refs of a subtree, depth first. `None` means
    /// every top-level node. Elements stay where they are.
    pub fn remove_node(&mut self, node: Option<BuiltId>) -> Result<()> {
        self.ensure_live()?;
        match node {
            Some(id) => {
                if !self.tree.contains(id) {
                    return Err(Error::UnresolvedTarget(id.to_string()));
                }
                self.strip(id);
            }
            None => {
                for id in self.top_level() {
                    self.strip(id);
                }
            }
        }
        Ok(())
    }

    /// Release everything the engine holds: listeners, refs, the host link,
    /// every constructed node and its elements. The engine is unusable
    /// afterwards; calling `teardown` again does nothing.
    pub fn teardown(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }

        let mut owned = self.top_level();
        owned.append(&mut self.loose);
        for id in &owned {
            self.strip(*id);
        }
        if let Err(err) = self.detach_top_level() {
            trace!(%err, "teardown: detach failed");
        }

        for id in owned {
            if let Some(element) = self.tree.free_subtree(id) {
                if let Err(err) = self.doc.release(element) {
                    trace!(%element, %err, "teardown: element already gone");
                }
            }
        }

        self.tree.clear();
        self.refs.clear();
        self.events.clear();
        self.root = None;
        self.host = None;
        self.phase = Phase::TornDown;
        debug!("teardown");
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Remove bookkeeping for a node and its descendants: every listener the
    /// engine attached, the `events` record, and bound ref names.
    pub(crate) fn strip(&mut self, id: BuiltId) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        let element = node.element;
        node.events.clear();
        let names = std::mem::take(&mut node.ref_names);
        let children = node.children.clone();

        self.events.remove(&self.doc, element, None, None);
        for name in &names {
            self.refs.unbind(name, id);
        }
        for child in children {
            self.strip(child);
        }
    }

    fn detach_top_level(&mut self) -> Result<()> {
        for id in self.top_level() {
            if let Some(element) = self.tree.element(id) {
                self.doc.remove(element)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::NodeDef;
    use crate::dom::{Document, Event};
    use crate::engine::tree::Built;
    use crate::types::Handler;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<usize>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let handler = Handler::new(move |_| count_clone.set(count_clone.get() + 1));
        (count, handler)
    }

    fn list_engine(doc: &Document) -> Engine {
        Engine::new(
            doc.clone(),
            NodeDef::tag("ul").with_ref("list").nodes(vec![
                NodeDef::tag("li").nodes("a").with_ref("first"),
                NodeDef::tag("li").nodes("b").with_ref("second"),
                NodeDef::tag("li").nodes("c"),
            ]),
            Some(doc.body()),
        )
        .unwrap()
    }

    fn top_elements(engine: &Engine) -> Vec<NodeId> {
        engine
            .root()
            .map(|root| {
                root.ids()
                    .iter()
                    .filter_map(|id| engine.node(*id).map(|n| n.element()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Mount / unmount
    // -------------------------------------------------------------------------

    #[test]
    fn test_mount_is_idempotent() {
        let doc = Document::new();
        let mut engine = Engine::new(
            doc.clone(),
            vec![NodeDef::tag("header"), NodeDef::tag("main")],
            Some(doc.body()),
        )
        .unwrap();

        engine.mount(None).unwrap();
        engine.mount(Some(doc.body())).unwrap();

        assert_eq!(doc.child_nodes(doc.body()), top_elements(&engine));
    }

    #[test]
    fn test_mount_without_host() {
        let doc = Document::new();
        let mut engine = Engine::new(doc, NodeDef::new(), None).unwrap();
        assert_eq!(engine.mount(None), Err(Error::NoHost));
        assert_eq!(engine.phase(), Phase::Constructed);
    }

    #[test]
    fn test_mount_into_new_host_moves_elements() {
        let doc = Document::new();
        let mut engine = Engine::new(doc.clone(), NodeDef::tag("nav"), Some(doc.body())).unwrap();
        let other = doc.create_element("aside");

        engine.mount(Some(other)).unwrap();

        assert_eq!(engine.host(), Some(other));
        assert!(doc.child_nodes(doc.body()).is_empty());
        assert_eq!(doc.child_nodes(other), top_elements(&engine));
    }

    #[test]
    fn test_unmount_and_remount() {
        let doc = Document::new();
        let mut engine = Engine::new(
            doc.clone(),
            vec![NodeDef::tag("header"), NodeDef::tag("main")],
            Some(doc.body()),
        )
        .unwrap();

        engine.unmount().unwrap();
        assert!(doc.child_nodes(doc.body()).is_empty());
        assert_eq!(engine.phase(), Phase::Unmounted);

        // Detached elements are a no-op.
        engine.unmount().unwrap();

        engine.mount(None).unwrap();
        assert_eq!(doc.child_nodes(doc.body()), top_elements(&engine));
        assert_eq!(engine.phase(), Phase::Mounted);
    }

    #[test]
    fn test_unmount_before_mount_keeps_phase() {
        let doc = Document::new();
        let mut engine = Engine::new(doc, NodeDef::new(), None).unwrap();
        engine.unmount().unwrap();
        assert_eq!(engine.phase(), Phase::Constructed);
    }

    // -------------------------------------------------------------------------
    // Replace
    // -------------------------------------------------------------------------

    #[test]
    fn test_replace_keeps_position() {
        let doc = Document::new();
        let mut engine = list_engine(&doc);
        let list = engine.get("list").unwrap();
        let list_node = engine.get_node("list").unwrap();
        let old_second = engine.get_node("second").unwrap();

        let new_id = engine
            .replace_node("second", NodeDef::tag("p").nodes("new"))
            .unwrap();

        let children = doc.child_nodes(list);
        assert_eq!(children.len(), 3);
        assert_eq!(doc.tag_name(children[1]).as_deref(), Some("P"));
        assert_eq!(engine.get("second"), Some(children[1]));
        assert_eq!(engine.node(list_node).unwrap().children()[1], new_id);
        assert_eq!(engine.node(new_id).unwrap().parent(), Parent::Node(list_node));
        assert!(engine.node(old_second).is_none());
        assert_eq!(
            doc.outer_html(list).as_deref(),
            Some("<ul><li>a</li><p>new</p><li>c</li></ul>")
        );
    }

    #[test]
    fn test_replace_releases_old_listeners() {
        let doc = Document::new();
        let (count, handler) = counter();
        let mut engine = Engine::new(
            doc.clone(),
            NodeDef::new().child(
                NodeDef::tag("button")
                    .with_ref("btn")
                    .on("click", handler)
                    .child(NodeDef::tag("span").with_ref("label")),
            ),
            Some(doc.body()),
        )
        .unwrap();
        let old_button = engine.get("btn").unwrap();

        engine.replace_node("btn", NodeDef::tag("a")).unwrap();

        assert!(!doc.contains(old_button));
        assert_eq!(engine.bound_element_count(), 0);
        assert_eq!(engine.get("label"), None);
        assert_eq!(engine.ref_names(), vec!["btn"]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_replace_new_node_keeps_its_own_ref() {
        let doc = Document::new();
        let mut engine = list_engine(&doc);

        engine
            .replace_node("first", NodeDef::tag("li").with_ref("renamed"))
            .unwrap();

        let element = engine.get("first").unwrap();
        assert_eq!(engine.get("renamed"), Some(element));
        assert_eq!(engine.ref_names(), vec!["first", "list", "renamed", "second"]);
    }

    #[test]
    fn test_replace_with_same_ref_name() {
        let doc = Document::new();
        let mut engine = list_engine(&doc);

        let new_id = engine
            .replace_node("second", NodeDef::tag("li").with_ref("second"))
            .unwrap();

        assert_eq!(engine.node(new_id).unwrap().ref_names(), &["second".to_string()]);
        assert_eq!(engine.get_node("second"), Some(new_id));
    }

    #[test]
    fn test_replace_top_level() {
        let doc = Document::new();
        let mut engine = Engine::new(
            doc.clone(),
            vec![
                NodeDef::tag("header"),
                NodeDef::tag("main").with_ref("main"),
                NodeDef::tag("footer"),
            ],
            Some(doc.body()),
        )
        .unwrap();

        let new_id = engine.replace_node("main", NodeDef::tag("article")).unwrap();

        let body = doc.child_nodes(doc.body());
        assert_eq!(body.len(), 3);
        assert_eq!(doc.tag_name(body[1]).as_deref(), Some("ARTICLE"));
        assert_eq!(engine.root().unwrap().position(new_id), Some(1));
        assert_eq!(engine.node(new_id).unwrap().parent(), Parent::Root);
    }

    #[test]
    fn test_replace_single_root_while_unmounted() {
        let doc = Document::new();
        let mut engine = Engine::new(doc.clone(), NodeDef::new().with_ref("app"), None).unwrap();

        let new_id = engine.replace_node("app", NodeDef::tag("main")).unwrap();

        assert_eq!(engine.root(), Some(&Built::One(new_id)));
        assert_eq!(engine.phase(), Phase::Constructed);
        assert_eq!(doc.parent_node(engine.get("app").unwrap()), None);
    }

    #[test]
    fn test_replace_errors() {
        let doc = Document::new();
        let mut engine = list_engine(&doc);

        assert_eq!(
            engine.replace_node("nope", NodeDef::new()),
            Err(Error::InvalidReplaceRef("nope".into()))
        );
        assert_eq!(
            engine.replace_node("second", vec![NodeDef::new(), NodeDef::new()]),
            Err(Error::ReplaceWithList)
        );
        // Nothing was touched by the failed calls.
        assert_eq!(engine.ref_names(), vec!["first", "list", "second"]);
    }

    // -------------------------------------------------------------------------
    // Remove / teardown
    // -------------------------------------------------------------------------

    #[test]
    fn test_remove_node_stops_handlers() {
        let doc = Document::new();
        let (count, handler) = counter();
        let mut engine =
            Engine::new(doc.clone(), NodeDef::tag("button").on("click", handler), None).unwrap();
        let button = top_elements(&engine)[0];

        engine.remove_node(None).unwrap();
        doc.dispatch_event(button, Event::new("click")).unwrap();

        assert_eq!(count.get(), 0);
        // Purely bookkeeping: the element survives.
        assert!(doc.contains(button));
        let root = engine.root().and_then(Built::single).unwrap();
        assert!(engine.node(root).unwrap().events().is_empty());
    }

    #[test]
    fn test_remove_subtree_only() {
        let doc = Document::new();
        let mut engine = list_engine(&doc);
        let second = engine.get_node("second").unwrap();

        engine.remove_node(Some(second)).unwrap();

        assert_eq!(engine.ref_names(), vec!["first", "list"]);
        assert!(engine.node(second).is_some());
        assert_eq!(doc.child_nodes(engine.get("list").unwrap()).len(), 3);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let doc = Document::new();
        let before = doc.live_nodes();
        let (count, handler) = counter();
        let mut engine = list_engine(&doc);
        engine.add_event("first", "click", handler).unwrap();
        engine.add_node(NodeDef::tag("aside"), None).unwrap();
        let first = engine.get("first").unwrap();

        engine.teardown();

        assert_eq!(engine.phase(), Phase::TornDown);
        assert!(engine.ref_names().is_empty());
        assert_eq!(engine.bound_element_count(), 0);
        assert_eq!(engine.root(), None);
        assert_eq!(engine.host(), None);
        assert_eq!(doc.live_nodes(), before);
        assert!(doc.child_nodes(doc.body()).is_empty());
        assert!(!doc.contains(first));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_teardown_is_terminal() {
        let doc = Document::new();
        let mut engine = list_engine(&doc);
        engine.teardown();
        engine.teardown();

        assert_eq!(engine.mount(Some(doc.body())), Err(Error::TornDown));
        assert_eq!(engine.unmount(), Err(Error::TornDown));
        assert_eq!(engine.add_node(NodeDef::new(), None), Err(Error::TornDown));
        assert_eq!(
            engine.replace_node("list", NodeDef::new()),
            Err(Error::TornDown)
        );
        assert_eq!(engine.remove_node(None), Err(Error::TornDown));
        assert_eq!(
            engine.add_event("list", "click", Handler::new(|_| {})),
            Err(Error::TornDown)
        );
        assert_eq!(engine.remove_event("list", None, None), Err(Error::TornDown));
    }
}
