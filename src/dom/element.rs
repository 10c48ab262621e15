//! Node storage - elements, text nodes, attributes and style declarations.

use indexmap::IndexMap;

use crate::types::{Handler, Value};

use super::schema::{self, Prototype};
use super::{Namespace, NodeId};

// =============================================================================
// Node Data
// =============================================================================

pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    /// Registered listeners per event type, in registration order.
    pub(crate) listeners: IndexMap<String, Vec<Handler>>,
}

pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
            listeners: IndexMap::new(),
        }
    }

    pub(crate) fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn prototype(&self) -> &'static Prototype {
        match &self.kind {
            NodeKind::Element(el) => el.prototype,
            NodeKind::Text(_) => &schema::TEXT,
        }
    }

    pub(crate) fn listeners_for(&self, event_type: &str) -> Option<&Vec<Handler>> {
        self.listeners.get(event_type)
    }
}

// =============================================================================
// Element Data
// =============================================================================

pub(crate) struct ElementData {
    pub(crate) local_name: String,
    pub(crate) namespace: Namespace,
    pub(crate) prototype: &'static Prototype,
    /// Content attributes in insertion order. `style` lives in `style`.
    pub(crate) attributes: IndexMap<String, String>,
    /// Inline style declarations, property names in hyphenated form.
    pub(crate) style: IndexMap<String, String>,
    /// Values of non-reflecting properties (`value`, `checked`, `on*` slots).
    pub(crate) props: IndexMap<String, Value>,
}

impl ElementData {
    pub(crate) fn new(namespace: Namespace, local_name: &str) -> Self {
        let local_name = match namespace {
            Namespace::Html => local_name.to_ascii_lowercase(),
            Namespace::Svg => local_name.to_string(),
        };
        Self {
            prototype: schema::prototype_for(namespace, &local_name),
            local_name,
            namespace,
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            props: IndexMap::new(),
        }
    }

    /// `tagName`: upper-cased for HTML, as written for SVG.
    pub(crate) fn tag_name(&self) -> String {
        match self.namespace {
            Namespace::Html => self.local_name.to_ascii_uppercase(),
            Namespace::Svg => self.local_name.clone(),
        }
    }

    /// Attribute names are case-insensitive on HTML elements.
    pub(crate) fn normalize_attr_name(&self, name: &str) -> String {
        match self.namespace {
            Namespace::Html => name.to_ascii_lowercase(),
            Namespace::Svg => name.to_string(),
        }
    }

    pub(crate) fn get_attribute(&self, name: &str) -> Option<String> {
        let name = self.normalize_attr_name(name);
        if name == "style" {
            return (!self.style.is_empty()).then(|| self.css_text());
        }
        self.attributes.get(&name).cloned()
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        let name = self.normalize_attr_name(name);
        if name == "style" {
            self.set_css_text(value);
            return;
        }
        self.attributes.insert(name, value.to_string());
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> bool {
        let name = self.normalize_attr_name(name);
        if name == "style" {
            let had = !self.style.is_empty();
            self.style.clear();
            return had;
        }
        self.attributes.shift_remove(&name).is_some()
    }

    /// Attributes for serialization. `style` is rendered from the declaration
    /// list and placed last.
    pub(crate) fn serialized_attributes(&self) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if !self.style.is_empty() {
            attrs.push(("style".to_string(), self.css_text()));
        }
        attrs
    }

    pub(crate) fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub(crate) fn set_prop(&mut self, name: &str, value: Value) {
        self.props.insert(name.to_string(), value);
    }

    pub(crate) fn clear_prop(&mut self, name: &str) {
        self.props.shift_remove(name);
    }

    // -------------------------------------------------------------------------
    // Style
    // -------------------------------------------------------------------------

    pub(crate) fn css_text(&self) -> String {
        self.style
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn set_css_text(&mut self, text: &str) {
        self.style.clear();
        for decl in text.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if !name.is_empty() && !value.is_empty() {
                    self.set_style(name, value);
                }
            }
        }
    }

    pub(crate) fn style_property(&self, name: &str) -> Option<&str> {
        let name = css_property_name(name);
        self.style.get(&name).map(String::as_str)
    }

    /// Set one declaration. An empty value removes it.
    pub(crate) fn set_style(&mut self, name: &str, value: &str) {
        let name = css_property_name(name);
        if value.is_empty() {
            self.style.shift_remove(&name);
            return;
        }
        self.style.insert(name, value.to_string());
    }
}

// =============================================================================
// Name conversions
// =============================================================================

/// `backgroundColor` → `background-color`; `cssFloat` → `float`.
/// Hyphenated names and custom properties pass through.
pub(crate) fn css_property_name(name: &str) -> String {
    if name == "cssFloat" {
        return "float".to_string();
    }
    if name.starts_with("--") || name.contains('-') {
        return name.to_string();
    }
    camel_to_kebab(name)
}

/// `userId` → `data-user-id`.
pub(crate) fn dataset_attribute_name(key: &str) -> String {
    format!("data-{}", camel_to_kebab(key))
}

fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_names_are_lowercased() {
        let el = ElementData::new(Namespace::Html, "DIV");
        assert_eq!(el.local_name, "div");
        assert_eq!(el.tag_name(), "DIV");

        let svg = ElementData::new(Namespace::Svg, "foreignObject");
        assert_eq!(svg.local_name, "foreignObject");
        assert_eq!(svg.tag_name(), "foreignObject");
    }

    #[test]
    fn test_attribute_case() {
        let mut html = ElementData::new(Namespace::Html, "div");
        html.set_attribute("Data-X", "1");
        assert_eq!(html.get_attribute("data-x").as_deref(), Some("1"));

        let mut svg = ElementData::new(Namespace::Svg, "svg");
        svg.set_attribute("viewBox", "0 0 10 10");
        assert_eq!(svg.get_attribute("viewBox").as_deref(), Some("0 0 10 10"));
        assert_eq!(svg.get_attribute("viewbox"), None);
    }

    #[test]
    fn test_attribute_removal_keeps_order() {
        let mut el = ElementData::new(Namespace::Html, "input");
        el.set_attribute("type", "text");
        el.set_attribute("name", "q");
        el.set_attribute("title", "search");
        el.set_attribute("type", "email");

        assert!(el.remove_attribute("name"));
        assert!(!el.remove_attribute("name"));
        let names: Vec<String> = el
            .serialized_attributes()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["type", "title"]);
        assert_eq!(el.get_attribute("type").as_deref(), Some("email"));
    }

    #[test]
    fn test_style_roundtrip_through_attribute() {
        let mut el = ElementData::new(Namespace::Html, "div");
        el.set_attribute("style", "color: red; margin-top:4px;;");
        assert_eq!(el.style_property("marginTop"), Some("4px"));

        el.set_style("backgroundColor", "blue");
        assert_eq!(
            el.get_attribute("style").as_deref(),
            Some("color: red; margin-top: 4px; background-color: blue;")
        );

        el.set_style("color", "");
        assert_eq!(el.style_property("color"), None);
    }

    #[test]
    fn test_name_conversions() {
        assert_eq!(css_property_name("borderTopWidth"), "border-top-width");
        assert_eq!(css_property_name("--accent"), "--accent");
        assert_eq!(css_property_name("cssFloat"), "float");
        assert_eq!(dataset_attribute_name("userId"), "data-user-id");
    }
}
