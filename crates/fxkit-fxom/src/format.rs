//! Source formatting carried by FXOM nodes
//!
//! Whitespace, comments outside property content and attribute order are not
//! part of the semantic model, but the saver needs them to write a parsed
//! document back unchanged.

use fxkit_glue::GlueNode;

/// Formatting shell of one object or property element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFormat {
    /// Nodes written before this element inside its parent
    pub leading: Vec<GlueNode>,
    /// Nodes written after the last child, before the closing tag
    pub closing: Vec<GlueNode>,
    /// Attribute names in source order
    pub attribute_order: Vec<String>,
    /// Text runs of an element-form value as parsed, CDATA sections included
    pub content: Vec<GlueNode>,
    /// Created by an edit; indented on save
    pub synthetic: bool,
}

impl NodeFormat {
    /// Format of a node created by an edit
    pub fn synthetic() -> Self {
        Self {
            synthetic: true,
            ..Self::default()
        }
    }

    /// Drop all recorded formatting
    pub fn reset(&mut self) {
        *self = Self::synthetic();
    }
}
