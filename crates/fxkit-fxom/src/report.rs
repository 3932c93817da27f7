//! Error report
//!
//! Recoverable problems of a parsed document: unresolved classes, locations
//! and resources, stylesheet content that does not parse, and expressions the
//! editor cannot evaluate. The report is cached against the document's
//! modification stamp, the loader epoch and a fingerprint of every location
//! it read, so any edit or resource change forces a recomputation on the next
//! query.

use std::fmt;

use lightningcss::stylesheet::{ParserOptions, StyleAttribute, StyleSheet};
use url::Url;

use crate::{
    resolve_location, FxomDocument, Intrinsic, ObjectId, ObjectKind, PrefixedValue, PropertyId,
};

/// Error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnresolvedClass,
    UnresolvedLocation,
    UnresolvedResource,
    InvalidEmbeddedContent,
    UnsupportedExpression,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnresolvedClass => "unresolved class",
            Self::UnresolvedLocation => "unresolved location",
            Self::UnresolvedResource => "unresolved resource",
            Self::InvalidEmbeddedContent => "invalid embedded content",
            Self::UnsupportedExpression => "unsupported expression",
        };
        f.write_str(name)
    }
}

/// One problem, attached to the offending object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub object: ObjectId,
    /// Property holding the offending value, if any
    pub property: Option<PropertyId>,
    pub kind: ErrorKind,
    pub detail: String,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Cached per-document error list
#[derive(Debug, Default)]
pub struct ErrorReport {
    entries: Vec<ErrorEntry>,
    /// (modification stamp, loader epoch) the entries were computed for
    key: Option<(u64, u64)>,
    /// Locations read while computing, with their fingerprints at the time
    dependencies: Vec<(Url, Option<u64>)>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entries, recomputed when the document or its resources changed
    pub fn query(&mut self, document: &FxomDocument) -> &[ErrorEntry] {
        if !self.is_current(document) {
            let key = Self::key_of(document);
            let (entries, dependencies) = collect_with_dependencies(document);
            self.entries = entries;
            self.dependencies = dependencies;
            self.key = Some(key);
            tracing::debug!("Error report recomputed: {} entries", self.entries.len());
        }
        &self.entries
    }

    /// Force recomputation on the next query
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    pub fn is_current(&self, document: &FxomDocument) -> bool {
        let loader = document.loader();
        self.key == Some(Self::key_of(document))
            && self
                .dependencies
                .iter()
                .all(|(url, fingerprint)| loader.fingerprint(url) == *fingerprint)
    }

    /// Entries of one object, as of the last query
    pub fn entries_for(&self, object: ObjectId) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter().filter(move |e| e.object == object)
    }

    fn key_of(document: &FxomDocument) -> (u64, u64) {
        (document.modification_stamp(), document.loader().epoch())
    }

    /// Compute entries for the attached tree, in document order
    pub fn collect(document: &FxomDocument) -> Vec<ErrorEntry> {
        collect_with_dependencies(document).0
    }
}

fn collect_with_dependencies(document: &FxomDocument) -> (Vec<ErrorEntry>, Vec<(Url, Option<u64>)>) {
    let mut entries = Vec::new();
    let mut dependencies = Vec::new();
    for id in document.walk() {
        let Some(object) = document.object(id) else {
            continue;
        };
        check_object(id, &object.kind, &mut entries);
        for property in object.properties().iter().copied() {
            let Some(node) = document.property(property) else {
                continue;
            };
            if let Some(value) = node.text() {
                let name = node.name().name.as_str();
                check_value(document, id, property, name, value, &mut entries, &mut dependencies);
            }
        }
    }
    (entries, dependencies)
}

fn check_object(id: ObjectId, kind: &ObjectKind, entries: &mut Vec<ErrorEntry>) {
    let mut report = |kind, detail| {
        entries.push(ErrorEntry {
            object: id,
            property: None,
            kind,
            detail,
        })
    };
    match kind {
        ObjectKind::Instance(instance) if !instance.is_resolved() => {
            report(ErrorKind::UnresolvedClass, format!("Cannot resolve class {}", instance.type_name));
        }
        ObjectKind::Intrinsic(Intrinsic::Include {
            source,
            failure: Some(failure),
            ..
        }) => {
            report(ErrorKind::UnresolvedLocation, format!("Cannot include {source}: {failure}"));
        }
        ObjectKind::Script(script) => {
            if let (Some(source), None) = (&script.source, &script.loaded) {
                report(ErrorKind::UnresolvedLocation, format!("Cannot load script {source}"));
            }
        }
        _ => {}
    }
}

fn check_value(
    document: &FxomDocument,
    object: ObjectId,
    property: PropertyId,
    name: &str,
    value: &str,
    entries: &mut Vec<ErrorEntry>,
    dependencies: &mut Vec<(Url, Option<u64>)>,
) {
    let mut report = |kind, detail| {
        entries.push(ErrorEntry {
            object,
            property: Some(property),
            kind,
            detail,
        })
    };

    match PrefixedValue::classify(value) {
        PrefixedValue::Location(path) => {
            if let Err((kind, detail)) = check_location(document, path, dependencies) {
                report(kind, detail);
            }
        }
        PrefixedValue::Resource(key) => {
            if !document.resources().is_some_and(|r| r.contains(key)) {
                report(ErrorKind::UnresolvedResource, format!("Missing resource key {key}"));
            }
        }
        PrefixedValue::Binding(expression) => {
            if !is_simple_path(expression) {
                report(
                    ErrorKind::UnsupportedExpression,
                    format!("Unsupported expression ${{{expression}}}"),
                );
            }
        }
        PrefixedValue::Unterminated(value) => {
            report(ErrorKind::UnsupportedExpression, format!("Unterminated expression {value}"));
        }
        PrefixedValue::Plain(text) if name == "style" => {
            if let Err(e) = StyleAttribute::parse(text, ParserOptions::default()) {
                report(ErrorKind::InvalidEmbeddedContent, format!("Invalid style: {e}"));
            }
        }
        _ => {}
    }
}

/// Resolve an `@` location; stylesheets are also parsed
fn check_location(
    document: &FxomDocument,
    path: &str,
    dependencies: &mut Vec<(Url, Option<u64>)>,
) -> Result<(), (ErrorKind, String)> {
    let unresolved = |detail: String| (ErrorKind::UnresolvedLocation, detail);
    let url = resolve_location(document.location(), path).map_err(|e| unresolved(e.to_string()))?;
    let loader = document.loader();
    if !dependencies.iter().any(|(seen, _)| *seen == url) {
        dependencies.push((url.clone(), loader.fingerprint(&url)));
    }
    if !loader.exists(&url) {
        return Err(unresolved(format!("Cannot find {url}")));
    }
    if url.path().ends_with(".css") {
        let text = loader
            .read_text(&url, None)
            .map_err(|e| unresolved(e.to_string()))?;
        if let Err(e) = StyleSheet::parse(&text, ParserOptions::default()) {
            return Err((
                ErrorKind::InvalidEmbeddedContent,
                format!("Invalid stylesheet {url}: {e}"),
            ));
        }
    }
    Ok(())
}

/// `a.b.c` with identifier segments
fn is_simple_path(expression: &str) -> bool {
    let expression = expression.trim();
    !expression.is_empty()
        && expression.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LoadContext, MemoryLoader, ResourceBundle};
    use std::sync::Arc;
    use url::Url;

    fn context(loader: MemoryLoader) -> LoadContext {
        LoadContext::default()
            .with_location(Url::parse("mem:/ui/main.fxml").unwrap())
            .with_loader(Arc::new(loader))
    }

    fn kinds(entries: &[ErrorEntry]) -> Vec<ErrorKind> {
        entries.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_clean_document_has_no_entries() {
        let loader = MemoryLoader::new().with(&Url::parse("mem:/ui/app.css").unwrap(), ".root { -fx-padding: 4; }");
        let doc = FxomDocument::parse(
            r#"<VBox stylesheets="@app.css" style="-fx-spacing: 4;"><Label text="${model.title}"/></VBox>"#,
            &context(loader),
        )
        .unwrap();
        let mut report = ErrorReport::new();
        assert!(report.query(&doc).is_empty());
        assert!(report.is_current(&doc));
    }

    #[test]
    fn test_unresolved_class_and_location() {
        let doc = FxomDocument::parse(
            r#"<VBox><Gauge/><ImageView><image><Image url="@missing.png"/></image></ImageView></VBox>"#,
            &context(MemoryLoader::new()),
        )
        .unwrap();
        let entries = ErrorReport::collect(&doc);
        assert_eq!(kinds(&entries), [ErrorKind::UnresolvedClass, ErrorKind::UnresolvedLocation]);
        assert_eq!(doc.object(entries[0].object).unwrap().label(), "Gauge");
        assert!(entries[1].property.is_some());
    }

    #[test]
    fn test_resources_and_expressions() {
        let mut bundle = ResourceBundle::default();
        bundle.insert("greeting", "Hello");
        let doc = FxomDocument::parse(
            r#"<VBox><Label text="%greeting"/><Label text="%farewell"/><Label text="${a + b}"/></VBox>"#,
            &context(MemoryLoader::new()).with_resources(bundle),
        )
        .unwrap();
        let entries = ErrorReport::collect(&doc);
        assert_eq!(
            kinds(&entries),
            [ErrorKind::UnresolvedResource, ErrorKind::UnsupportedExpression]
        );
        assert!(entries[0].detail.contains("farewell"));
    }

    #[test]
    fn test_invalid_stylesheet() {
        let loader = MemoryLoader::new().with(&Url::parse("mem:/ui/bad.css").unwrap(), "..root { }");
        let doc = FxomDocument::parse(r#"<VBox stylesheets="@bad.css"/>"#, &context(loader)).unwrap();
        let entries = ErrorReport::collect(&doc);
        assert_eq!(kinds(&entries), [ErrorKind::InvalidEmbeddedContent]);
    }

    #[test]
    fn test_report_invalidated_by_resource_change() {
        let loader = Arc::new(MemoryLoader::new());
        let context = LoadContext::default()
            .with_location(Url::parse("mem:/ui/main.fxml").unwrap())
            .with_loader(loader.clone());
        let doc = FxomDocument::parse(r#"<VBox stylesheets="@app.css"/>"#, &context).unwrap();

        let mut report = ErrorReport::new();
        assert_eq!(report.query(&doc).len(), 1);
        loader.insert(&Url::parse("mem:/ui/app.css").unwrap(), ".root {}");
        assert!(!report.is_current(&doc));
        assert!(report.query(&doc).is_empty());
    }

    #[test]
    fn test_report_invalidated_by_edit() {
        let mut doc = FxomDocument::parse(r#"<VBox><Label/></VBox>"#, &LoadContext::default()).unwrap();
        let mut report = ErrorReport::new();
        assert!(report.query(&doc).is_empty());

        let gauge = doc.create_instance("Gauge");
        let root = doc.root().unwrap();
        let children = doc.object(root).unwrap().properties()[0];
        doc.add_value(children, gauge, None).unwrap();
        assert_eq!(kinds(report.query(&doc)), [ErrorKind::UnresolvedClass]);
        assert_eq!(report.entries_for(gauge).count(), 1);
    }

    #[test]
    fn test_unterminated_expression() {
        let doc = FxomDocument::parse(
            r#"<VBox><Label text="${a"/><Label text="${a}"/></VBox>"#,
            &context(MemoryLoader::new()),
        )
        .unwrap();
        let entries = ErrorReport::collect(&doc);
        assert_eq!(kinds(&entries), [ErrorKind::UnsupportedExpression]);
        assert!(entries[0].detail.contains("${a"));
    }

    #[derive(Debug, Default)]
    struct StaticEpochLoader(MemoryLoader);

    impl crate::ResourceLoader for StaticEpochLoader {
        fn read_bytes(&self, url: &Url) -> crate::FxomResult<Vec<u8>> {
            crate::ResourceLoader::read_bytes(&self.0, url)
        }
    }

    #[test]
    fn test_report_tracks_locations_without_epoch() {
        let loader = Arc::new(StaticEpochLoader::default());
        let context = LoadContext::default()
            .with_location(Url::parse("mem:/ui/main.fxml").unwrap())
            .with_loader(loader.clone());
        let doc = FxomDocument::parse(r#"<VBox stylesheets="@app.css"/>"#, &context).unwrap();
        let css = Url::parse("mem:/ui/app.css").unwrap();

        let mut report = ErrorReport::new();
        assert_eq!(kinds(report.query(&doc)), [ErrorKind::UnresolvedLocation]);
        loader.0.insert(&css, "..root {}");
        assert!(!report.is_current(&doc));
        assert_eq!(kinds(report.query(&doc)), [ErrorKind::InvalidEmbeddedContent]);
        loader.0.insert(&css, ".root {}");
        assert!(report.query(&doc).is_empty());
        assert!(report.is_current(&doc));
    }

    #[test]
    fn test_simple_path() {
        assert!(is_simple_path("controller.name"));
        assert!(is_simple_path(" value "));
        assert!(!is_simple_path("a + b"));
        assert!(!is_simple_path("a..b"));
        assert!(!is_simple_path(""));
    }
}
