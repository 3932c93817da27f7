//! Markup parser
//!
//! Uses quick-xml's pull reader and keeps everything it reports: attribute
//! order, whitespace runs, comments, CDATA sections and instructions.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::{GlueDocument, GlueElement, GlueError, GlueNode, GlueResult};

/// Markup parser
pub struct GlueParser;

impl GlueParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse markup text into a glue document
    pub fn parse(&self, text: &str) -> GlueResult<GlueDocument> {
        tracing::debug!("Parsing markup ({} bytes)", text.len());

        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut document = GlueDocument::new();
        let mut stack: Vec<GlueElement> = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(malformed(text, reader.buffer_position() as usize, e.to_string()));
                }
            };
            let position = reader.buffer_position() as usize;

            match event {
                Event::Start(start) => {
                    stack.push(element_from(&start, text, position)?);
                }
                Event::Empty(start) => {
                    let element = element_from(&start, text, position)?;
                    attach(&mut document, &mut stack, GlueNode::Element(element), text, position)?;
                }
                Event::End(end) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed(text, position, "unexpected closing tag"))?;
                    if end.name().as_ref() != element.name.as_bytes() {
                        return Err(malformed(
                            text,
                            position,
                            format!("closing tag does not match <{}>", element.name),
                        ));
                    }
                    attach(&mut document, &mut stack, GlueNode::Element(element), text, position)?;
                }
                Event::Text(t) => {
                    let content = t
                        .unescape()
                        .map_err(|e| malformed(text, position, e.to_string()))?;
                    attach(&mut document, &mut stack, GlueNode::text(content), text, position)?;
                }
                Event::CData(c) => {
                    let content = utf8(&c, text, position)?;
                    attach(&mut document, &mut stack, GlueNode::cdata(content), text, position)?;
                }
                Event::Comment(c) => {
                    let content = utf8(&c, text, position)?;
                    attach(&mut document, &mut stack, GlueNode::Comment(content), text, position)?;
                }
                Event::Decl(decl) => {
                    let mut data = String::new();
                    let version = decl
                        .version()
                        .map_err(|e| malformed(text, position, e.to_string()))?;
                    data.push_str(&format!(r#"version="{}""#, String::from_utf8_lossy(&version)));
                    if let Some(encoding) = decl.encoding() {
                        let encoding = encoding.map_err(|e| malformed(text, position, e.to_string()))?;
                        data.push_str(&format!(r#" encoding="{}""#, String::from_utf8_lossy(&encoding)));
                    }
                    if let Some(standalone) = decl.standalone() {
                        let standalone =
                            standalone.map_err(|e| malformed(text, position, e.to_string()))?;
                        data.push_str(&format!(
                            r#" standalone="{}""#,
                            String::from_utf8_lossy(&standalone)
                        ));
                    }
                    attach(&mut document, &mut stack, GlueNode::instruction("xml", data), text, position)?;
                }
                Event::PI(pi) => {
                    let target = utf8(pi.target(), text, position)?;
                    let data = utf8(pi.content(), text, position)?;
                    let node = GlueNode::instruction(target, data.trim_start());
                    attach(&mut document, &mut stack, node, text, position)?;
                }
                Event::DocType(d) => {
                    let content = utf8(&d, text, position)?;
                    attach(&mut document, &mut stack, GlueNode::Doctype(content), text, position)?;
                }
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(text, text.len(), format!("unclosed element <{}>", open.name)));
        }

        tracing::debug!("Parsed {} elements", document.element_count());
        Ok(document)
    }
}

impl Default for GlueParser {
    fn default() -> Self {
        Self::new()
    }
}

fn element_from(start: &BytesStart<'_>, text: &str, position: usize) -> GlueResult<GlueElement> {
    let name = utf8(start.name().as_ref(), text, position)?;
    let mut element = GlueElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(text, position, e.to_string()))?;
        let key = utf8(attr.key.as_ref(), text, position)?;
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(text, position, e.to_string()))?;
        if element.attributes.set(key.clone(), value).is_some() {
            return Err(malformed(text, position, format!("duplicate attribute {key}")));
        }
    }
    Ok(element)
}

/// Attach a finished node to the innermost open element, or to the document
fn attach(
    document: &mut GlueDocument,
    stack: &mut [GlueElement],
    node: GlueNode,
    text: &str,
    position: usize,
) -> GlueResult<()> {
    if let Some(parent) = stack.last_mut() {
        push_merged(&mut parent.children, node);
        return Ok(());
    }

    let stray_text = matches!(&node, GlueNode::Text(_)) && !node.is_whitespace();
    if stray_text {
        return Err(malformed(text, position, "text outside of the root element"));
    }

    match node {
        GlueNode::Element(element) => {
            if document.root.is_some() {
                return Err(malformed(text, position, "multiple root elements"));
            }
            document.root = Some(element);
        }
        other => {
            if document.root.is_none() {
                push_merged(&mut document.header, other);
            } else {
                push_merged(&mut document.trailer, other);
            }
        }
    }
    Ok(())
}

/// Adjacent plain text runs are merged into one node
fn push_merged(children: &mut Vec<GlueNode>, node: GlueNode) {
    if let GlueNode::Text(next) = &node {
        if !next.cdata {
            if let Some(GlueNode::Text(prev)) = children.last_mut() {
                if !prev.cdata {
                    prev.content.push_str(&next.content);
                    return;
                }
            }
        }
    }
    children.push(node);
}

fn utf8(bytes: &[u8], text: &str, position: usize) -> GlueResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| malformed(text, position, e.to_string()))
}

fn malformed(text: &str, offset: usize, message: impl Into<String>) -> GlueError {
    let (line, column) = line_column(text, offset);
    GlueError::Malformed {
        line,
        column,
        message: message.into(),
    }
}

/// 1-based line and column of a byte offset
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text.as_bytes()[..offset.min(text.len())];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = before.iter().rev().take_while(|&&b| b != b'\n').count() + 1;
    (line, column)
}
