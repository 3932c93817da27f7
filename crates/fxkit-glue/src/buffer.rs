//! XML text buffer
//!
//! Incremental writer used by the serializer. The only state kept between
//! calls is the open-tag flag and the element stack; `clear()` resets both.

/// Markup text writer
#[derive(Debug, Default)]
pub struct XmlBuffer {
    compress: bool,
    out: String,
    stack: Vec<String>,
    /// Start tag written but not yet closed with `>` or `/>`
    open_tag: bool,
}

impl XmlBuffer {
    /// Create a buffer; `compress` suppresses comments, whitespace and line breaks
    pub fn new(compress: bool) -> Self {
        Self {
            compress,
            ..Self::default()
        }
    }

    pub fn is_compress(&self) -> bool {
        self.compress
    }

    /// Open an element
    pub fn begin(&mut self, tag: &str) {
        self.close_open_tag();
        self.out.push('<');
        self.out.push_str(tag);
        self.stack.push(tag.to_owned());
        self.open_tag = true;
    }

    /// Add an attribute to the element just opened
    pub fn add_attribute(&mut self, name: &str, value: &str) {
        debug_assert!(self.open_tag, "attribute {name} written outside of a start tag");
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        escape_attribute(value, &mut self.out);
        self.out.push('"');
    }

    /// Close the innermost element; empty elements are self-closed
    pub fn end(&mut self) {
        let Some(tag) = self.stack.pop() else {
            debug_assert!(false, "end() without matching begin()");
            return;
        };
        if self.open_tag {
            self.out.push_str("/>");
            self.open_tag = false;
        } else {
            self.out.push_str("</");
            self.out.push_str(&tag);
            self.out.push('>');
        }
    }

    /// Add character data. Whitespace-only runs are formatting and are
    /// dropped in compress mode.
    pub fn add_text(&mut self, text: &str) {
        if self.compress && text.chars().all(char::is_whitespace) {
            return;
        }
        self.close_open_tag();
        escape_text(text, &mut self.out);
    }

    /// Add a CDATA section
    pub fn add_cdata(&mut self, text: &str) {
        self.close_open_tag();
        self.out.push_str("<![CDATA[");
        // A literal "]]>" has to be split across two sections
        self.out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
        self.out.push_str("]]>");
    }

    /// Add a comment; `--` runs and a trailing `-` are split with spaces
    pub fn add_comment(&mut self, comment: &str) {
        if self.compress {
            return;
        }
        self.close_open_tag();
        self.out.push_str("<!--");
        let mut previous = None;
        for c in comment.chars() {
            if c == '-' && previous == Some('-') {
                self.out.push(' ');
            }
            self.out.push(c);
            previous = Some(c);
        }
        if previous == Some('-') {
            self.out.push(' ');
        }
        self.out.push_str("-->");
    }

    pub fn add_line_separator(&mut self) {
        if self.compress {
            return;
        }
        self.close_open_tag();
        self.out.push('\n');
    }

    pub fn add_processing_instruction(&mut self, target: &str, data: &str) {
        self.close_open_tag();
        self.out.push_str("<?");
        self.out.push_str(target);
        if !data.is_empty() {
            self.out.push(' ');
            self.out.push_str(data);
        }
        self.out.push_str("?>");
    }

    pub fn add_doctype(&mut self, content: &str) {
        self.close_open_tag();
        self.out.push_str("<!DOCTYPE ");
        self.out.push_str(content.trim_start());
        self.out.push('>');
    }

    /// Nesting depth of currently open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Text written so far
    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Reset to an empty buffer
    pub fn clear(&mut self) {
        self.out.clear();
        self.stack.clear();
        self.open_tag = false;
    }

    fn close_open_tag(&mut self) {
        if self.open_tag {
            self.out.push('>');
            self.open_tag = false;
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if c.is_control() => out.push_str(&format!("&#{};", c as u32)),
            c => out.push(c),
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
