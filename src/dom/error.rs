//! Platform errors.

use super::NodeId;

/// Failure reported by a [`Document`](super::Document) operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} no longer exists")]
    StaleNode(NodeId),
    #[error("property `{name}` is read-only on <{tag}>")]
    ReadOnlyProperty { name: String, tag: String },
    #[error("`{0}` is not a property of this node")]
    UnknownProperty(String),
    #[error("operation requires an element, found a text node")]
    NotAnElement,
    #[error("hierarchy request: {0}")]
    HierarchyRequest(&'static str),
    #[error("node to be replaced is not a child of this node")]
    NotAChild,
    #[error("did not find property with path `{0}`")]
    PathNotFound(String),
}
