//! Event Registry - identity-keyed bookkeeping of attached handlers.
//!
//! Every handler the engine attaches to an element is also recorded here,
//! keyed by the element's [`NodeId`] and grouped per event name in attachment
//! order. That is what makes exact removal possible: a single handler, every
//! handler for one event, or everything bound to an element.
//!
//! Entries never keep an element alive. Empty per-event lists are pruned and
//! an element with no events left loses its entry.

use std::fmt;

use indexmap::IndexMap;
use slotmap::SecondaryMap;
use tracing::trace;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::types::{Handler, Value};

// =============================================================================
// Targets
// =============================================================================

/// An element given directly, or a ref name to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Element(NodeId),
    Ref(&'a str),
}

impl From<NodeId> for Target<'_> {
    fn from(id: NodeId) -> Self {
        Target::Element(id)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(name: &'a str) -> Self {
        Target::Ref(name)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(name: &'a String) -> Self {
        Target::Ref(name)
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Element(id) => write!(f, "{id}"),
            Target::Ref(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

type EventList = IndexMap<String, Vec<Handler>>;

#[derive(Debug, Default)]
pub(crate) struct EventRegistry {
    elements: SecondaryMap<NodeId, EventList>,
}

/// Collect the handlers out of a handler value. Every entry is checked before
/// any is returned, so an invalid list attaches nothing.
fn collect_handlers(event: &str, handlers: &Value) -> Result<Vec<Handler>> {
    let invalid = || Error::InvalidHandler {
        event: event.to_string(),
    };
    match handlers {
        Value::Handler(h) => Ok(vec![h.clone()]),
        Value::List(items) => items
            .iter()
            .map(|item| item.as_handler().cloned().ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

impl EventRegistry {
    /// Attach handlers to `element` and record them. A null value is a no-op.
    pub(crate) fn add(
        &mut self,
        doc: &Document,
        element: NodeId,
        event: &str,
        handlers: &Value,
    ) -> Result<()> {
        if handlers.is_null() {
            return Ok(());
        }
        let handlers = collect_handlers(event, handlers)?;
        if handlers.is_empty() {
            return Ok(());
        }
        if !doc.contains(element) {
            return Err(Error::UnresolvedTarget(element.to_string()));
        }
        self.prune_released(doc);

        let Some(events) = self.elements.entry(element).map(|e| e.or_default()) else {
            return Err(Error::UnresolvedTarget(element.to_string()));
        };
        let recorded = events.entry(event.to_string()).or_default();
        for handler in handlers {
            doc.add_event_listener(element, event, handler.clone())?;
            recorded.push(handler);
        }
        trace!(node = %element, event, count = recorded.len(), "add event");
        Ok(())
    }

    /// Detach and forget handlers.
    ///
    /// - `event` and `handler`: that one handler
    /// - `event` only: every handler for the event
    /// - neither: everything bound to the element
    ///
    /// Elements or events with no entry are a silent no-op. A released
    /// element's record is still dropped.
    pub(crate) fn remove(
        &mut self,
        doc: &Document,
        element: NodeId,
        event: Option<&str>,
        handler: Option<&Handler>,
    ) {
        let Some(events) = self.elements.get_mut(element) else {
            return;
        };

        match event {
            Some(event) => {
                let Some(recorded) = events.get_mut(event) else {
                    return;
                };
                match handler {
                    Some(handler) => {
                        doc.remove_event_listener(element, event, handler);
                        recorded.retain(|h| !h.ptr_eq(handler));
                    }
                    None => {
                        for h in recorded.iter() {
                            doc.remove_event_listener(element, event, h);
                        }
                        recorded.clear();
                    }
                }
                if recorded.is_empty() {
                    events.shift_remove(event);
                }
                trace!(node = %element, event, "remove event");
                if events.is_empty() {
                    self.elements.remove(element);
                }
            }
            None => {
                if let Some(events) = self.elements.remove(element) {
                    for (name, handlers) in &events {
                        for h in handlers {
                            doc.remove_event_listener(element, name, h);
                        }
                    }
                    trace!(node = %element, "remove all events");
                }
            }
        }
    }

    /// Drop records of elements the document no longer holds, along with
    /// their handlers. Returns how many were dropped.
    pub(crate) fn prune_released(&mut self, doc: &Document) -> usize {
        let before = self.elements.len();
        self.elements.retain(|element, _| doc.contains(element));
        let pruned = before - self.elements.len();
        if pruned > 0 {
            trace!(pruned, "prune released elements");
        }
        pruned
    }

    /// Recorded handlers for `element`, grouped by event name in attachment
    /// order.
    pub(crate) fn bound(&self, element: NodeId) -> Vec<(&str, &[Handler])> {
        self.elements.get(element).map_or_else(Vec::new, |events| {
            events
                .iter()
                .map(|(name, handlers)| (name.as_str(), handlers.as_slice()))
                .collect()
        })
    }

    /// Number of elements with at least one recorded handler.
    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn clear(&mut self) {
        self.elements.clear();
    }
}
