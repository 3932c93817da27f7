//! Glue serializer
//!
//! Writes a glue document through an `XmlBuffer`. Output is a pure function
//! of the tree and the compress flag.

use crate::{GlueDocument, GlueElement, GlueNode, XmlBuffer};

/// Glue document writer
pub struct GlueSerializer {
    compress: bool,
}

impl GlueSerializer {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// Serialize a whole document
    pub fn serialize(&self, document: &GlueDocument) -> String {
        let mut buffer = XmlBuffer::new(self.compress);
        for node in &document.header {
            write_node(&mut buffer, node);
        }
        if let Some(root) = &document.root {
            write_element(&mut buffer, root);
        }
        for node in &document.trailer {
            write_node(&mut buffer, node);
        }
        buffer.into_string()
    }

    /// Serialize a single element subtree
    pub fn serialize_element(&self, element: &GlueElement) -> String {
        let mut buffer = XmlBuffer::new(self.compress);
        write_element(&mut buffer, element);
        buffer.into_string()
    }
}

impl Default for GlueSerializer {
    fn default() -> Self {
        Self::new(false)
    }
}

fn write_element(buffer: &mut XmlBuffer, element: &GlueElement) {
    buffer.begin(&element.name);
    for (name, value) in element.attributes.iter() {
        buffer.add_attribute(name, value);
    }
    for child in &element.children {
        write_node(buffer, child);
    }
    buffer.end();
}

fn write_node(buffer: &mut XmlBuffer, node: &GlueNode) {
    match node {
        GlueNode::Element(e) => write_element(buffer, e),
        GlueNode::Text(t) if t.cdata => buffer.add_cdata(&t.content),
        GlueNode::Text(t) => buffer.add_text(&t.content),
        GlueNode::Comment(c) => buffer.add_comment(c),
        GlueNode::Instruction { target, data } => buffer.add_processing_instruction(target, data),
        GlueNode::Doctype(d) => buffer.add_doctype(d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GlueParser;

    #[test]
    fn test_round_trip_formatted() {
        let text = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\n<?import javafx.scene.layout.Pane?>\n\n<Pane>\n    <!-- comment -->\n    <children/>\n</Pane>\n";
        let doc = GlueParser::new().parse(text).unwrap();
        assert_eq!(GlueSerializer::new(false).serialize(&doc), text);
    }

    #[test]
    fn test_compress_output() {
        let text = "<?xml version=\"1.0\"?>\n<Pane>\n    <!-- c -->\n    <Label text=\"a\"/>\n</Pane>\n";
        let doc = GlueParser::new().parse(text).unwrap();
        assert_eq!(
            GlueSerializer::new(true).serialize(&doc),
            "<?xml version=\"1.0\"?><Pane><Label text=\"a\"/></Pane>"
        );
    }

    #[test]
    fn test_serialize_element() {
        let element = GlueElement::new("Label").with_attribute("text", "a&b");
        assert_eq!(
            GlueSerializer::default().serialize_element(&element),
            r#"<Label text="a&amp;b"/>"#
        );
    }
}
