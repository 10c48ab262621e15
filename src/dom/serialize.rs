//! Markup serialization for inspection and tests.

use super::element::NodeKind;
use super::{DocumentInner, Namespace, NodeId};

/// HTML elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl DocumentInner {
    pub(crate) fn outer_html(&self, id: NodeId) -> Option<String> {
        self.nodes.get(id)?;
        let mut out = String::new();
        self.write_node(id, &mut out);
        Some(out)
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.local_name);
                for (name, value) in el.serialized_attributes() {
                    out.push(' ');
                    out.push_str(&name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&value));
                    out.push('"');
                }
                out.push('>');

                if el.namespace == Namespace::Html && VOID_ELEMENTS.contains(&el.local_name.as_str())
                {
                    return;
                }
                for child in &data.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&el.local_name);
                out.push('>');
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
