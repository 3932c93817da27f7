//! fxkit Metadata
//!
//! Reflective component metadata: which type names are constructible, what
//! properties they declare, their defaults and since-which-format-version
//! they exist. A reduced registry, seeded with a built-in catalog and
//! extensible from JSON catalogs.

mod builtin;
mod descriptor;
mod registry;
mod resolver;
mod version;

pub use descriptor::{ComponentDescriptor, PropertyDescriptor, PropertyName, ValueKind};
pub use registry::MetadataRegistry;
pub use resolver::{Import, TypeResolver};
pub use version::FormatVersion;

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Metadata errors
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Invalid format version: {0}")]
    InvalidVersion(String),

    #[error("Invalid property name: {0}")]
    InvalidPropertyName(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("Component {component} extends unknown type {superclass}")]
    UnknownSuperclass { component: String, superclass: String },
}
