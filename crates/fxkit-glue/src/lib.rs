//! fxkit Glue - generic markup tree
//!
//! Order-preserving tree of elements, attributes, text runs, comments and
//! processing instructions. The glue layer knows nothing about components:
//! it only guarantees that what was parsed can be written back faithfully.

mod attributes;
mod buffer;
mod node;
mod parser;
mod serializer;

pub use attributes::AttributeMap;
pub use buffer::XmlBuffer;
pub use node::{GlueDocument, GlueElement, GlueNode, GlueText, INDENT};
pub use parser::GlueParser;
pub use serializer::GlueSerializer;

/// Parse markup text into a glue document
pub fn parse(text: &str) -> GlueResult<GlueDocument> {
    GlueParser::new().parse(text)
}

/// Result type for glue operations
pub type GlueResult<T> = Result<T, GlueError>;

/// Glue errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlueError {
    /// Input is not well-formed markup
    #[error("Malformed markup at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },
}

impl GlueError {
    /// Line/column of a malformed-markup error (1-based)
    pub fn location(&self) -> (usize, usize) {
        match self {
            Self::Malformed { line, column, .. } => (*line, *column),
        }
    }
}
