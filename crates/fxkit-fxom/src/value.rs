//! Prefixed property values
//!
//! `@location`, `%resource`, `$reference`, `${binding}` and `\` escapes.

/// Classified text property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixedValue<'a> {
    Plain(&'a str),
    /// `@path`, relative to the document location
    Location(&'a str),
    /// `%key` in the resource bundle
    Resource(&'a str),
    /// `$id`
    Reference(&'a str),
    /// `${expression}`
    Binding(&'a str),
    /// `\@literal`; the payload is the literal text
    Escaped(&'a str),
    /// `${` without a closing brace; the payload is the whole value
    Unterminated(&'a str),
}

impl<'a> PrefixedValue<'a> {
    pub fn classify(value: &'a str) -> Self {
        if let Some(rest) = value.strip_prefix('\\') {
            return Self::Escaped(rest);
        }
        if let Some(rest) = value.strip_prefix("${") {
            return match rest.strip_suffix('}') {
                Some(expr) => Self::Binding(expr),
                None => Self::Unterminated(value),
            };
        }
        if let Some(rest) = value.strip_prefix('$') {
            return Self::Reference(rest);
        }
        if let Some(rest) = value.strip_prefix('%') {
            return Self::Resource(rest);
        }
        if let Some(rest) = value.strip_prefix('@') {
            return Self::Location(rest);
        }
        Self::Plain(value)
    }

    /// Literal text for plain and escaped values
    pub fn literal(&self) -> Option<&'a str> {
        match self {
            Self::Plain(v) | Self::Escaped(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(PrefixedValue::classify("hello"), PrefixedValue::Plain("hello"));
        assert_eq!(PrefixedValue::classify("@img/a.png"), PrefixedValue::Location("img/a.png"));
        assert_eq!(PrefixedValue::classify("%title"), PrefixedValue::Resource("title"));
        assert_eq!(PrefixedValue::classify("$okButton"), PrefixedValue::Reference("okButton"));
        assert_eq!(PrefixedValue::classify("${a.b}"), PrefixedValue::Binding("a.b"));
        assert_eq!(PrefixedValue::classify("\\$5"), PrefixedValue::Escaped("$5"));
    }

    #[test]
    fn test_unterminated_binding() {
        assert_eq!(PrefixedValue::classify("${a"), PrefixedValue::Unterminated("${a"));
        assert_eq!(PrefixedValue::classify("${"), PrefixedValue::Unterminated("${"));
        assert_eq!(PrefixedValue::classify("$a}"), PrefixedValue::Reference("a}"));
    }
}
