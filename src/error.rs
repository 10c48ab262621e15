//! Engine errors.
//!
//! Every error is a caller-configuration error raised synchronously at the
//! call site. Nothing is retried; a failed construction is rolled back before
//! the error is returned.

use crate::dom::DomError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A `ref` name is already bound in this engine.
    #[error("duplicate ref `{0}`: refs must be unique within an engine")]
    DuplicateRef(String),

    /// A `ref` name collides with a reserved engine member.
    #[error("`{0}` is a reserved engine member and cannot be used as a ref")]
    ReservedRef(String),

    /// An event operation named an element or ref that does not resolve.
    #[error("element or ref `{0}` not found")]
    UnresolvedTarget(String),

    /// A non-callable value was supplied where a handler was required.
    #[error("handler for `{event}` must be a function")]
    InvalidHandler { event: String },

    /// A dotted property path has an intermediate segment that is not an
    /// addressable object.
    #[error("did not find property with path `{0}`")]
    InvalidPath(String),

    /// `replace_node` named a ref that is not bound to a live node.
    #[error("invalid ref `{0}` used with replace_node")]
    InvalidReplaceRef(String),

    #[error("no host container to mount into")]
    NoHost,

    #[error("replace_node expects a single node, not a list")]
    ReplaceWithList,

    #[error("engine has been torn down")]
    TornDown,

    #[error(transparent)]
    Dom(DomError),
}

impl From<DomError> for Error {
    fn from(err: DomError) -> Self {
        match err {
            DomError::PathNotFound(path) => Error::InvalidPath(path),
            other => Error::Dom(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
