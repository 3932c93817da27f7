//! Glue Nodes
//!
//! Elements own their children exclusively; there are no back references.
//! The document owns the root element plus everything before and after it.

use crate::AttributeMap;

/// One level of indentation written around synthetic elements
pub const INDENT: &str = "    ";

/// Text run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueText {
    pub content: String,
    /// Written as `<![CDATA[...]]>`
    pub cdata: bool,
}

/// Glue tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlueNode {
    Element(GlueElement),
    Text(GlueText),
    Comment(String),
    /// Processing instruction; the XML declaration is stored with target `xml`
    Instruction { target: String, data: String },
    Doctype(String),
}

impl GlueNode {
    /// Plain text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(GlueText {
            content: content.into(),
            cdata: false,
        })
    }

    /// CDATA section
    pub fn cdata(content: impl Into<String>) -> Self {
        Self::Text(GlueText {
            content: content.into(),
            cdata: true,
        })
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::Comment(content.into())
    }

    /// Whether `content` can sit between `<!--` and `-->`
    pub fn is_valid_comment(content: &str) -> bool {
        !content.contains("--") && !content.ends_with('-')
    }

    pub fn instruction(target: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Instruction {
            target: target.into(),
            data: data.into(),
        }
    }

    #[inline]
    pub fn as_element(&self) -> Option<&GlueElement> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut GlueElement> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Text that carries no content (indentation, line breaks)
    pub fn is_whitespace(&self) -> bool {
        match self {
            Self::Text(t) => !t.cdata && t.content.chars().all(char::is_whitespace),
            _ => false,
        }
    }

    /// Whitespace run that starts a new line
    pub fn is_line_break(&self) -> bool {
        self.is_whitespace()
            && matches!(self, Self::Text(t) if t.content.contains('\n'))
    }
}

/// Element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueElement {
    pub name: String,
    pub attributes: AttributeMap,
    pub children: Vec<GlueNode>,
    /// Created by an edit rather than by parsing; gets indentation on write
    pub synthetic: bool,
}

impl GlueElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeMap::new(),
            children: Vec::new(),
            synthetic: false,
        }
    }

    /// New element flagged as synthetic
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(name)
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn with_child(mut self, child: GlueNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Element children in order
    pub fn elements(&self) -> impl Iterator<Item = &GlueElement> {
        self.children.iter().filter_map(GlueNode::as_element)
    }

    /// Concatenated text and CDATA content of direct children
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                GlueNode::Text(t) => Some(t.content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any direct child is an element
    pub fn has_element_children(&self) -> bool {
        self.children.iter().any(|c| c.as_element().is_some())
    }

    /// Total number of elements in this subtree (self included)
    pub fn element_count(&self) -> usize {
        1 + self.elements().map(GlueElement::element_count).sum::<usize>()
    }

    /// Insert line breaks and indentation around synthetic children.
    /// Whitespace already present is left untouched.
    fn update_indent(&mut self, depth: usize) {
        let needs_indent = self
            .children
            .iter()
            .any(|c| matches!(c, GlueNode::Element(e) if e.synthetic));

        if needs_indent {
            let inner = format!("\n{}", INDENT.repeat(depth + 1));
            let mut children = Vec::with_capacity(self.children.len() * 2 + 1);
            for child in std::mem::take(&mut self.children) {
                let synthetic = matches!(&child, GlueNode::Element(e) if e.synthetic);
                if synthetic && !children.last().is_some_and(GlueNode::is_line_break) {
                    children.push(GlueNode::text(inner.clone()));
                }
                children.push(child);
            }
            if !children.last().is_some_and(GlueNode::is_line_break) {
                children.push(GlueNode::text(format!("\n{}", INDENT.repeat(depth))));
            }
            self.children = children;
        }

        for child in &mut self.children {
            if let GlueNode::Element(e) = child {
                e.update_indent(depth + 1);
            }
        }
    }
}

/// Glue document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlueDocument {
    /// Declaration, instructions, comments and whitespace before the root
    pub header: Vec<GlueNode>,
    pub root: Option<GlueElement>,
    /// Comments and whitespace after the root
    pub trailer: Vec<GlueNode>,
}

impl GlueDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with an XML declaration and no root
    pub fn with_declaration() -> Self {
        Self {
            header: vec![GlueNode::instruction(
                "xml",
                r#"version="1.0" encoding="UTF-8""#,
            )],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Processing instructions of the header with the given target
    pub fn instructions<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.header.iter().filter_map(move |n| match n {
            GlueNode::Instruction { target: t, data } if t == target => Some(data.as_str()),
            _ => None,
        })
    }

    /// Number of elements in the tree
    pub fn element_count(&self) -> usize {
        self.root.as_ref().map_or(0, GlueElement::element_count)
    }

    /// Add indentation around synthetic elements
    pub fn update_indent(&mut self) {
        if let Some(root) = &mut self.root {
            if root.synthetic && self.header.last().is_some_and(|n| !n.is_line_break()) {
                self.header.push(GlueNode::text("\n"));
            }
            root.update_indent(0);
        }
    }
}
