//! fxkit FXOM - semantic document model
//!
//! Objects and properties live in per-document arenas and are addressed by
//! `ObjectId` / `PropertyId`. Reference intrinsics (`fx:reference`,
//! `fx:copy`) and `$id` expressions hold the referenced id as a string and
//! are resolved through the document's fx:id index at the point of use.

mod builder;
mod cloner;
mod document;
mod format;
mod index;
mod loader;
mod object;
mod property;
mod references;
mod report;
mod resources;
mod saver;
mod value;
mod walker;

pub use cloner::{structurally_equal, structurally_equal_documents, CloneOptions, FormattingPolicy, FxomFragment, IdPolicy};
pub use document::{FxomDocument, LoadContext};
pub use format::NodeFormat;
pub use index::FxIdIndex;
pub use loader::{decode_text, resolve_location, FileSystemLoader, MemoryLoader, ResourceLoader};
pub use object::{Comment, Instance, Intrinsic, ObjectKind, ObjectNode, Script};
pub use property::{PropertyKind, PropertyNode, TextForm};
pub use references::ReferenceSite;
pub use report::{ErrorEntry, ErrorKind, ErrorReport};
pub use resources::ResourceBundle;
pub use saver::{Omission, SaveOptions, SaveReport};
pub use value::PrefixedValue;
pub use walker::ObjectWalker;

use std::fmt;

/// Object identifier (index into the document's object arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

/// Property identifier (index into the document's property arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub(crate) u32);

impl ObjectId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl PropertyId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property#{}", self.0)
    }
}

/// Result type for FXOM operations
pub type FxomResult<T> = Result<T, FxomError>;

/// FXOM errors
#[derive(Debug, thiserror::Error)]
pub enum FxomError {
    #[error(transparent)]
    Markup(#[from] fxkit_glue::GlueError),

    /// fx:id already used by another attached object
    #[error("Duplicate fx:id: {id}")]
    DuplicateId { id: String },

    /// Same property set twice on one object
    #[error("Duplicate property {property} on {owner}")]
    DuplicateProperty { owner: String, property: String },

    #[error("Unexpected element <{name}>: {reason}")]
    UnexpectedElement { name: String, reason: String },

    #[error("Unknown {0}")]
    UnknownObject(ObjectId),

    #[error("Unknown {0}")]
    UnknownProperty(PropertyId),

    /// Structural edit that does not apply to the current tree
    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    #[error("Cannot resolve location {path}")]
    UnresolvedPath { path: String },

    #[error("Cannot load {url}: {message}")]
    Load { url: String, message: String },

    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),
}

impl FxomError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidEdit(message.into())
    }
}
