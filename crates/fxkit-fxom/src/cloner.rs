//! Cloner
//!
//! Subtrees are copied through an owned [`FxomFragment`], so cloning within a
//! document, across documents and clipboard paste all share one path. A
//! fragment owns everything it carries: properties, nested fragments and the
//! embedded document of an `fx:include`.

use std::collections::HashMap;

use fxkit_glue::AttributeMap;
use fxkit_metadata::PropertyName;

use crate::{
    FxomDocument, FxomError, FxomResult, Intrinsic, NodeFormat, ObjectId, ObjectKind, ObjectNode,
    PrefixedValue, PropertyKind, PropertyNode, TextForm,
};

/// What happens to fx:ids carried by a clone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Keep ids as they are
    #[default]
    Preserve,
    /// Drop every id
    Strip,
    /// Rename ids already used in the target document
    Rename,
    /// Refuse the clone when an id is already used in the target document
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormattingPolicy {
    /// Keep recorded whitespace, comments and attribute order
    Preserve,
    /// Mark the clone synthetic so the saver indents it
    #[default]
    Reset,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CloneOptions {
    pub ids: IdPolicy,
    pub formatting: FormattingPolicy,
}

impl CloneOptions {
    /// Options for a subtree copy: ids kept, formatting reset
    pub fn subtree() -> Self {
        Self::default()
    }

    /// Options for a whole-document copy
    pub fn document() -> Self {
        Self {
            ids: IdPolicy::Preserve,
            formatting: FormattingPolicy::Preserve,
        }
    }

    pub fn with_ids(mut self, ids: IdPolicy) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_formatting(mut self, formatting: FormattingPolicy) -> Self {
        self.formatting = formatting;
        self
    }
}

/// Owned copy of an object subtree, independent of any document
#[derive(Debug, Clone)]
pub struct FxomFragment {
    root: FragmentObject,
}

#[derive(Debug, Clone)]
struct FragmentObject {
    fx_id: Option<String>,
    attributes: AttributeMap,
    format: NodeFormat,
    kind: ObjectKind,
    properties: Vec<FragmentProperty>,
}

#[derive(Debug, Clone)]
struct FragmentProperty {
    name: PropertyName,
    format: NodeFormat,
    kind: FragmentValue,
}

#[derive(Debug, Clone)]
enum FragmentValue {
    Text { value: String, form: TextForm },
    Complex { values: Vec<FragmentObject>, implicit: bool },
}

impl FxomFragment {
    /// Copy the subtree rooted at `id`
    pub fn extract(document: &FxomDocument, id: ObjectId) -> FxomResult<Self> {
        Ok(Self {
            root: extract_object(document, id)?,
        })
    }

    /// fx:ids carried by the fragment, in document order
    pub fn fx_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.root.collect_ids(&mut ids);
        ids
    }

    /// Label of the fragment root
    pub fn label(&self) -> String {
        let mut node = ObjectNode::new(self.root.kind.clone());
        node.fx_id = self.root.fx_id.clone();
        node.label()
    }
}

fn extract_object(document: &FxomDocument, id: ObjectId) -> FxomResult<FragmentObject> {
    let node = document.obj(id)?;
    let mut properties = Vec::with_capacity(node.properties.len());
    for property in &node.properties {
        let property = document.prop(*property)?;
        let kind = match &property.kind {
            PropertyKind::Text { value, form } => FragmentValue::Text {
                value: value.clone(),
                form: *form,
            },
            PropertyKind::Complex { values, implicit } => FragmentValue::Complex {
                values: values
                    .iter()
                    .map(|v| extract_object(document, *v))
                    .collect::<FxomResult<_>>()?,
                implicit: *implicit,
            },
        };
        properties.push(FragmentProperty {
            name: property.name.clone(),
            format: property.format.clone(),
            kind,
        });
    }
    Ok(FragmentObject {
        fx_id: node.fx_id.clone(),
        attributes: node.attributes.clone(),
        format: node.format.clone(),
        kind: node.kind.clone(),
        properties,
    })
}

impl FragmentObject {
    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(id) = &self.fx_id {
            out.push(id);
        }
        for property in &self.properties {
            if let FragmentValue::Complex { values, .. } = &property.kind {
                for value in values {
                    value.collect_ids(out);
                }
            }
        }
    }
}

impl FxomDocument {
    /// Materialize a fragment as a detached subtree of this document
    pub fn adopt(&mut self, fragment: &FxomFragment, options: CloneOptions) -> FxomResult<ObjectId> {
        let mut renames = HashMap::new();
        match options.ids {
            IdPolicy::Fail => {
                if let Some(id) = fragment.fx_ids().into_iter().find(|id| self.index.contains(id)) {
                    return Err(FxomError::DuplicateId { id: id.to_string() });
                }
            }
            IdPolicy::Rename => {
                let mut assigned: Vec<String> = Vec::new();
                for id in fragment.fx_ids() {
                    let name = self.index.unique_name(id, &assigned);
                    if name != id {
                        renames.insert(id.to_string(), name.clone());
                    }
                    assigned.push(name);
                }
            }
            IdPolicy::Preserve | IdPolicy::Strip => {}
        }

        self.touch();
        let mut adopter = Adopter {
            document: self,
            options,
            renames,
        };
        adopter.object(&fragment.root)
    }

    /// Detached deep copy of an object of this document
    pub fn clone_object(&mut self, id: ObjectId, options: CloneOptions) -> FxomResult<ObjectId> {
        let fragment = FxomFragment::extract(self, id)?;
        self.adopt(&fragment, options)
    }

    /// Independent copy of the whole document, formatting and revisions included
    pub fn clone_document(&self) -> FxomResult<FxomDocument> {
        let mut copy = FxomDocument::with_glue_header(self.glue.clone(), self.context.clone());
        copy.resolver = self.resolver.clone();
        if let Some(root) = self.root {
            let fragment = FxomFragment::extract(self, root)?;
            let root = copy.adopt(&fragment, CloneOptions::document())?;
            copy.set_root(Some(root))?;
        }
        copy.set_revision(self.saved_revision());
        copy.mark_saved();
        copy.set_revision(self.revision());
        copy.sync_glue();
        Ok(copy)
    }
}

struct Adopter<'a> {
    document: &'a mut FxomDocument,
    options: CloneOptions,
    renames: HashMap<String, String>,
}

impl Adopter<'_> {
    fn renamed(&self, id: &str) -> String {
        self.renames.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    fn object(&mut self, source: &FragmentObject) -> FxomResult<ObjectId> {
        let mut node = ObjectNode::new(source.kind.clone());
        node.attributes = source.attributes.clone();
        node.format = match self.options.formatting {
            FormattingPolicy::Preserve => source.format.clone(),
            FormattingPolicy::Reset => NodeFormat::synthetic(),
        };
        node.fx_id = match self.options.ids {
            IdPolicy::Strip => None,
            _ => source.fx_id.as_deref().map(|id| self.renamed(id)),
        };
        if !self.renames.is_empty() {
            if let ObjectKind::Intrinsic(Intrinsic::Reference { source } | Intrinsic::Copy { source }) =
                &mut node.kind
            {
                *source = self.renamed(source);
            }
        }
        let id = self.document.push_object(node);

        for property in &source.properties {
            let property_id = self.property(property)?;
            self.document.prop_mut(property_id)?.owner = Some(id);
            self.document.obj_mut(id)?.properties.push(property_id);
        }
        Ok(id)
    }

    fn property(&mut self, source: &FragmentProperty) -> FxomResult<crate::PropertyId> {
        let format = match self.options.formatting {
            FormattingPolicy::Preserve => source.format.clone(),
            FormattingPolicy::Reset => NodeFormat::synthetic(),
        };
        match &source.kind {
            FragmentValue::Text { value, form } => {
                let value = match PrefixedValue::classify(value) {
                    PrefixedValue::Reference(target) if self.renames.contains_key(target) => {
                        format!("${}", self.renamed(target))
                    }
                    _ => value.clone(),
                };
                let mut node = PropertyNode::new(source.name.clone(), PropertyKind::Text { value, form: *form });
                node.format = format;
                Ok(self.document.push_property(node))
            }
            FragmentValue::Complex { values, implicit } => {
                let mut node = PropertyNode::new(
                    source.name.clone(),
                    PropertyKind::Complex {
                        values: Vec::new(),
                        implicit: *implicit,
                    },
                );
                node.format = format;
                let property_id = self.document.push_property(node);
                for value in values {
                    let child = self.object(value)?;
                    self.document.obj_mut(child)?.parent = Some(property_id);
                    if let PropertyKind::Complex { values, .. } = &mut self.document.prop_mut(property_id)?.kind {
                        values.push(child);
                    }
                }
                Ok(property_id)
            }
        }
    }
}

/// Same types, ids, attributes, properties and values, recursively
pub fn structurally_equal(a_doc: &FxomDocument, a: ObjectId, b_doc: &FxomDocument, b: ObjectId) -> bool {
    let (Some(left), Some(right)) = (a_doc.object(a), b_doc.object(b)) else {
        return false;
    };
    if left.fx_id != right.fx_id
        || left.attributes != right.attributes
        || !same_kind(&left.kind, &right.kind)
        || left.properties.len() != right.properties.len()
    {
        return false;
    }
    left.properties.iter().zip(&right.properties).all(|(p, q)| {
        let (Some(p), Some(q)) = (a_doc.property(*p), b_doc.property(*q)) else {
            return false;
        };
        if p.name != q.name {
            return false;
        }
        match (&p.kind, &q.kind) {
            (PropertyKind::Text { .. }, PropertyKind::Text { .. }) => p.kind == q.kind,
            (
                PropertyKind::Complex { values: pv, implicit: pi },
                PropertyKind::Complex { values: qv, implicit: qi },
            ) => {
                pi == qi
                    && pv.len() == qv.len()
                    && pv
                        .iter()
                        .zip(qv)
                        .all(|(x, y)| structurally_equal(a_doc, *x, b_doc, *y))
            }
            _ => false,
        }
    })
}

/// Both roots absent, or both present and structurally equal
pub fn structurally_equal_documents(a: &FxomDocument, b: &FxomDocument) -> bool {
    match (a.root(), b.root()) {
        (None, None) => true,
        (Some(x), Some(y)) => structurally_equal(a, x, b, y),
        _ => false,
    }
}

fn same_kind(a: &ObjectKind, b: &ObjectKind) -> bool {
    match (a, b) {
        (ObjectKind::Instance(x), ObjectKind::Instance(y)) => x == y,
        (ObjectKind::Script(x), ObjectKind::Script(y)) => {
            x.body == y.body && x.source == y.source && x.charset == y.charset
        }
        (ObjectKind::Comment(x), ObjectKind::Comment(y)) => x == y,
        (ObjectKind::Intrinsic(x), ObjectKind::Intrinsic(y)) => match (x, y) {
            (
                Intrinsic::Include {
                    source: s1,
                    charset: c1,
                    resources: r1,
                    ..
                },
                Intrinsic::Include {
                    source: s2,
                    charset: c2,
                    resources: r2,
                    ..
                },
            ) => s1 == s2 && c1 == c2 && r1 == r2,
            (Intrinsic::Reference { source: s1 }, Intrinsic::Reference { source: s2 })
            | (Intrinsic::Copy { source: s1 }, Intrinsic::Copy { source: s2 }) => s1 == s2,
            (Intrinsic::Define, Intrinsic::Define) => true,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LoadContext, MemoryLoader};
    use std::sync::Arc;

    const SOURCE: &str = r#"<VBox fx:id="box">
    <children>
        <Label fx:id="title" text="Title"/>
        <TextField promptText="$title"/>
        <fx:reference source="title"/>
    </children>
</VBox>"#;

    fn parse(text: &str) -> FxomDocument {
        FxomDocument::parse(text, &LoadContext::default()).unwrap()
    }

    #[test]
    fn test_clone_is_equal_but_distinct() {
        let mut doc = parse(SOURCE);
        let root = doc.root().unwrap();
        let copy = doc.clone_object(root, CloneOptions::subtree()).unwrap();
        assert_ne!(copy, root);
        assert!(structurally_equal(&doc, root, &doc, copy));
        assert!(!doc.is_attached(copy));
        // Ids stay with the original until the copy is attached
        assert_eq!(doc.lookup("box"), Some(root));
        assert!(doc.object(copy).unwrap().format().synthetic);
    }

    #[test]
    fn test_clone_does_not_alias_properties() {
        let mut doc = parse(SOURCE);
        let root = doc.root().unwrap();
        let copy = doc.clone_object(root, CloneOptions::subtree()).unwrap();
        let original_children = doc.object(root).unwrap().properties()[0];
        let copied_children = doc.object(copy).unwrap().properties()[0];
        assert_ne!(original_children, copied_children);

        let first = doc.property(copied_children).unwrap().values()[0];
        doc.remove_value(first).unwrap();
        assert_eq!(doc.property(original_children).unwrap().values().len(), 3);
        assert!(!structurally_equal(&doc, root, &doc, copy));
    }

    #[test]
    fn test_strip_ids() {
        let mut doc = parse(SOURCE);
        let root = doc.root().unwrap();
        let copy = doc
            .clone_object(root, CloneOptions::subtree().with_ids(IdPolicy::Strip))
            .unwrap();
        assert!(doc.walk_from(copy).all(|id| doc.object(id).unwrap().fx_id().is_none()));
    }

    #[test]
    fn test_fail_on_collision() {
        let mut doc = parse(SOURCE);
        let root = doc.root().unwrap();
        assert!(matches!(
            doc.clone_object(root, CloneOptions::subtree().with_ids(IdPolicy::Fail)),
            Err(FxomError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_rename_remaps_internal_references() {
        let mut doc = parse(SOURCE);
        let root = doc.root().unwrap();
        let copy = doc
            .clone_object(root, CloneOptions::subtree().with_ids(IdPolicy::Rename))
            .unwrap();
        let ids: Vec<_> = doc
            .walk_from(copy)
            .filter_map(|id| doc.object(id).unwrap().fx_id().map(str::to_string))
            .collect();
        assert_eq!(ids, ["box1", "title1"]);

        let children = doc.object(copy).unwrap().properties()[0];
        let values = doc.property(children).unwrap().values().to_vec();
        assert_eq!(doc.text_value(values[1], "promptText"), Some("$title1"));
        let reference = doc.object(values[2]).unwrap().as_intrinsic().unwrap();
        assert_eq!(reference.reference_source(), Some("title1"));
    }

    #[test]
    fn test_clone_across_documents() {
        let source = parse(SOURCE);
        let mut target = parse(r#"<Pane><children/></Pane>"#);
        let title = source.lookup("title").unwrap();
        let fragment = FxomFragment::extract(&source, title).unwrap();
        assert_eq!(fragment.fx_ids(), ["title"]);
        assert_eq!(fragment.label(), "Label (title)");
        let copy = target.adopt(&fragment, CloneOptions::subtree()).unwrap();
        assert!(structurally_equal(&source, title, &target, copy));
    }

    #[test]
    fn test_clone_document_round_trips() {
        let doc = parse(SOURCE);
        let copy = doc.clone_document().unwrap();
        assert!(structurally_equal_documents(&doc, &copy));
        assert!(copy.lookup("title").is_some());
        assert_eq!(copy.to_text(), doc.to_text());
    }

    #[test]
    fn test_clone_include_copies_embedded_document() {
        let loader = MemoryLoader::new().with(
            &url::Url::parse("mem:/part.fxml").unwrap(),
            r#"<Button fx:id="inner"/>"#,
        );
        let context = LoadContext::default()
            .with_location(url::Url::parse("mem:/main.fxml").unwrap())
            .with_loader(Arc::new(loader));
        let mut doc = FxomDocument::parse(
            r#"<VBox><children><fx:include source="part.fxml"/></children></VBox>"#,
            &context,
        )
        .unwrap();
        let include = doc.intrinsics().next().unwrap();
        let copy = doc.clone_object(include, CloneOptions::subtree()).unwrap();
        let Some(Intrinsic::Include { included: Some(nested), .. }) = doc.object(copy).unwrap().as_intrinsic()
        else {
            panic!("include not copied");
        };
        assert!(nested.lookup("inner").is_some());
    }
}
