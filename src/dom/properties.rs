//! Property access - schema-driven get/set and dotted-path assignment.

use crate::types::Value;

use super::element::{dataset_attribute_name, ElementData, NodeData, NodeKind};
use super::schema::{PropDescriptor, PropKind};
use super::{DocumentInner, DomError, NodeId};

/// Addressable objects reachable as the first segment of a dotted path.
enum PathObject {
    Style,
    Dataset,
}

impl DocumentInner {
    pub(crate) fn get_property(&self, id: NodeId, name: &str) -> Result<Value, DomError> {
        let data = self.node(id)?;
        let desc = data
            .prototype()
            .find(name)
            .ok_or_else(|| DomError::UnknownProperty(name.to_string()))?;

        if let Some(value) = self.computed_property(id, data, name) {
            return Ok(value);
        }

        Ok(match data.element() {
            Some(el) if desc.reflects() => reflected_value(el, desc),
            Some(el) => el
                .prop(name)
                .cloned()
                .unwrap_or_else(|| default_value(desc.kind)),
            None => default_value(desc.kind),
        })
    }

    /// Properties derived from node state rather than stored.
    fn computed_property(&self, id: NodeId, data: &NodeData, name: &str) -> Option<Value> {
        let value = match (&data.kind, name) {
            (_, "textContent" | "innerText") => Value::String(self.text_content(id)),
            (_, "isConnected") => Value::Bool(self.is_connected(id)),
            (NodeKind::Text(_), "nodeName") => Value::from("#text"),
            (NodeKind::Text(_), "nodeType") => Value::from(3),
            (NodeKind::Text(text), "data" | "nodeValue" | "wholeText") => Value::from(text.as_str()),
            (NodeKind::Text(text), "length") => Value::from(text.encode_utf16().count() as u32),
            (NodeKind::Element(el), "nodeName" | "tagName") => Value::String(el.tag_name()),
            (NodeKind::Element(_), "nodeType") => Value::from(1),
            (NodeKind::Element(el), "localName") => Value::from(el.local_name.as_str()),
            (NodeKind::Element(el), "namespaceURI") => Value::from(el.namespace.uri()),
            (NodeKind::Element(el), "style") => Value::String(el.css_text()),
            (NodeKind::Element(_), "childElementCount") => {
                let count = data
                    .children
                    .iter()
                    .filter(|c| self.nodes.get(**c).is_some_and(|n| n.element().is_some()))
                    .count();
                Value::from(count as u32)
            }
            _ => return None,
        };
        Some(value)
    }

    pub(crate) fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: Value,
    ) -> Result<(), DomError> {
        let data = self.node(id)?;
        let desc = *data
            .prototype()
            .find(name)
            .ok_or_else(|| DomError::UnknownProperty(name.to_string()))?;

        if !desc.is_writable() {
            let tag = data
                .element()
                .map_or_else(|| "#text".to_string(), |el| el.local_name.clone());
            return Err(DomError::ReadOnlyProperty {
                name: name.to_string(),
                tag,
            });
        }

        if let NodeKind::Text(_) = data.kind {
            // Only character data is writable on text nodes.
            let text = if value.is_null() {
                String::new()
            } else {
                value.to_js_string()
            };
            if let NodeKind::Text(current) = &mut self.node_mut(id)?.kind {
                *current = text;
            }
            return Ok(());
        }

        if desc.kind == PropKind::TextContent {
            let text = if value.is_null() {
                String::new()
            } else {
                value.to_js_string()
            };
            return self.set_text_content(id, &text);
        }

        let el = self
            .node_mut(id)?
            .element_mut()
            .ok_or(DomError::NotAnElement)?;

        match desc.kind {
            PropKind::EventHandler => match value {
                Value::Handler(h) => el.set_prop(name, Value::Handler(h)),
                _ => el.clear_prop(name),
            },
            PropKind::Object => {
                // Only `style` is a writable object; assignment sets its text.
                if value.is_null() {
                    el.style.clear();
                } else {
                    el.set_css_text(&value.to_js_string());
                }
            }
            _ if desc.reflects() => set_reflected(el, &desc, &value),
            kind => el.set_prop(name, coerce(kind, &value)),
        }
        Ok(())
    }

    /// Replace all children of an element with a single text node.
    fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            if let Ok(child) = self.node_mut(child) {
                child.parent = None;
            }
        }
        if !text.is_empty() {
            let text_node = self.create(NodeKind::Text(text.to_string()));
            self.node_mut(id)?.children.push(text_node);
            self.node_mut(text_node)?.parent = Some(id);
        }
        Ok(())
    }

    pub(crate) fn assign_path(
        &mut self,
        id: NodeId,
        path: &str,
        value: Value,
    ) -> Result<(), DomError> {
        let not_found = || DomError::PathNotFound(path.to_string());

        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, intermediates)) = segments.split_last() else {
            return Err(not_found());
        };
        let Some((first, rest)) = intermediates.split_first() else {
            return Err(not_found());
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(not_found());
        }

        let data = self.node(id)?;
        let object = match data.prototype().find(first) {
            Some(desc) if desc.kind == PropKind::Object => match desc.name {
                "style" => PathObject::Style,
                "dataset" => PathObject::Dataset,
                _ => return Err(not_found()),
            },
            _ => return Err(not_found()),
        };

        // Members of style declarations and datasets are strings.
        if !rest.is_empty() {
            return Err(not_found());
        }

        let el = self
            .node_mut(id)?
            .element_mut()
            .ok_or_else(not_found)?;
        match object {
            PathObject::Style => {
                let text = if value.is_null() {
                    String::new()
                } else {
                    value.to_js_string()
                };
                el.set_style(last, &text);
            }
            PathObject::Dataset => {
                el.set_attribute(&dataset_attribute_name(last), &value.to_js_string());
            }
        }
        Ok(())
    }
}

// =============================================================================
// Coercion
// =============================================================================

fn coerce(kind: PropKind, value: &Value) -> Value {
    match kind {
        PropKind::Boolean => Value::Bool(value.is_truthy()),
        PropKind::Number => {
            let n = value.to_number();
            Value::Number(if n.is_nan() { 0.0 } else { n })
        }
        PropKind::String => Value::String(value.to_js_string()),
        _ => value.clone(),
    }
}

fn default_value(kind: PropKind) -> Value {
    match kind {
        PropKind::String | PropKind::TextContent => Value::String(String::new()),
        PropKind::Boolean => Value::Bool(false),
        PropKind::Number => Value::Number(0.0),
        PropKind::Object | PropKind::Opaque | PropKind::EventHandler => Value::Null,
    }
}

fn reflected_value(el: &ElementData, desc: &PropDescriptor) -> Value {
    let attr = desc.attribute.unwrap_or(desc.name);
    match desc.kind {
        PropKind::Boolean => Value::Bool(el.get_attribute(attr).is_some()),
        PropKind::Number => el
            .get_attribute(attr)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map_or(Value::Number(0.0), Value::Number),
        _ => Value::String(el.get_attribute(attr).unwrap_or_default()),
    }
}

fn set_reflected(el: &mut ElementData, desc: &PropDescriptor, value: &Value) {
    let attr = desc.attribute.unwrap_or(desc.name);
    match desc.kind {
        PropKind::Boolean => {
            if value.is_truthy() {
                el.set_attribute(attr, "");
            } else {
                el.remove_attribute(attr);
            }
        }
        kind => el.set_attribute(attr, &coerce(kind, value).to_js_string()),
    }
}
