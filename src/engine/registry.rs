//! Reference Registry - symbolic names for constructed nodes.
//!
//! Maps a `ref` name to the constructed node that declared it (and through
//! the node, to its element). Names are unique per engine and may not shadow
//! an engine member. Registration never overwrites: a collision is an error.

use ahash::AHashMap;
use tracing::trace;

use super::tree::BuiltId;
use crate::error::{Error, Result};

// =============================================================================
// Reserved Names
// =============================================================================

/// Engine member names a `ref` may never take.
pub const RESERVED_MEMBERS: &[&str] = &[
    "new",
    "document",
    "mount",
    "unmount",
    "add_node",
    "replace_node",
    "remove_node",
    "add_event",
    "remove_event",
    "teardown",
    "get",
    "get_node",
    "node",
    "root",
    "host",
    "phase",
    "ref_names",
    "bound_events",
    "bound_element_count",
];

pub fn is_reserved_member(name: &str) -> bool {
    RESERVED_MEMBERS.contains(&name)
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Default)]
pub(crate) struct RefRegistry {
    names: AHashMap<String, BuiltId>,
}

impl RefRegistry {
    /// Fail if `name` cannot be bound.
    pub(crate) fn check(&self, name: &str) -> Result<()> {
        if is_reserved_member(name) {
            return Err(Error::ReservedRef(name.to_string()));
        }
        if self.names.contains_key(name) {
            return Err(Error::DuplicateRef(name.to_string()));
        }
        Ok(())
    }

    pub(crate) fn bind(&mut self, name: &str, node: BuiltId) -> Result<()> {
        self.check(name)?;
        trace!(name, %node, "bind ref");
        self.names.insert(name.to_string(), node);
        Ok(())
    }

    /// Point an existing name at a different node, or bind it fresh.
    pub(crate) fn rebind(&mut self, name: &str, node: BuiltId) {
        trace!(name, %node, "rebind ref");
        self.names.insert(name.to_string(), node);
    }

    /// Unbind `name` if it still points at `node`.
    pub(crate) fn unbind(&mut self, name: &str, node: BuiltId) -> bool {
        if self.names.get(name) != Some(&node) {
            return false;
        }
        trace!(name, %node, "unbind ref");
        self.names.remove(name);
        true
    }

    pub(crate) fn get(&self, name: &str) -> Option<BuiltId> {
        self.names.get(name).copied()
    }

    /// Bound names, sorted.
    pub(crate) fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn clear(&mut self) {
        self.names.clear();
    }
}
