//! Supported-event introspection.
//!
//! The event names an element kind exposes are read off its schema: every
//! `on`-prefixed property, own or inherited, with the prefix stripped. The
//! generic container's list is computed once; media kinds expose extra
//! events and are computed on demand.

use std::borrow::Cow;
use std::sync::LazyLock;

use crate::dom::schema::prototype_for;
use crate::dom::Namespace;

pub const DEFAULT_TAG: &str = "div";

static DEFAULT_EVENTS: LazyLock<Vec<&'static str>> = LazyLock::new(|| scan(DEFAULT_TAG));

fn scan(tag: &str) -> Vec<&'static str> {
    let proto = prototype_for(Namespace::Html, &tag.to_ascii_lowercase());
    let mut events: Vec<&'static str> = proto
        .property_names()
        .into_iter()
        .filter_map(|name| name.strip_prefix("on"))
        .collect();
    events.sort_unstable();
    events.dedup();
    events
}

/// Only the exact lowercase names select the media lists.
fn has_extra_events(tag: &str) -> bool {
    matches!(tag, "video" | "audio")
}

/// Sorted event list used when dispatching a definition's keys.
pub(crate) fn events_for(tag: Option<&str>) -> Cow<'static, [&'static str]> {
    match tag {
        Some(tag) if has_extra_events(tag) => Cow::Owned(scan(tag)),
        _ => Cow::Borrowed(DEFAULT_EVENTS.as_slice()),
    }
}

/// Event names supported by an element kind, sorted.
///
/// ```
/// let events = spark_dom::supported_events("div");
/// assert!(events.contains(&"click"));
/// assert!(!events.contains(&"encrypted"));
/// assert!(spark_dom::supported_events("video").contains(&"encrypted"));
/// ```
pub fn supported_events(tag: &str) -> Vec<&'static str> {
    if has_extra_events(tag) {
        scan(tag)
    } else if tag.eq_ignore_ascii_case(DEFAULT_TAG) {
        DEFAULT_EVENTS.clone()
    } else {
        scan(tag)
    }
}
