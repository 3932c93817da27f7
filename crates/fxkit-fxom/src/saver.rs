//! FXOM Saver
//!
//! Rebuilds a glue tree from the semantic model and writes it. Attributes
//! follow their recorded source order, new ones are appended in canonical
//! order. `fx:include` is written back as a marker with its original source.

use std::collections::BTreeSet;
use std::fmt;

use fxkit_glue::{AttributeMap, GlueDocument, GlueElement, GlueNode, GlueSerializer};
use fxkit_metadata::{FormatVersion, Import, PropertyName};

use crate::{
    FxomDocument, Intrinsic, ObjectId, ObjectKind, ObjectNode, PropertyKind, PropertyNode,
    TextForm,
};

/// Save settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Omit components and properties introduced after this version
    pub target_version: Option<FormatVersion>,
    /// Drop comments, whitespace and line separators
    pub compact: bool,
    /// Regenerate `<?import?>` instructions from the classes in use
    pub update_imports: bool,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_version(version: FormatVersion) -> Self {
        Self {
            target_version: Some(version),
            ..Self::default()
        }
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn update_imports(mut self, update: bool) -> Self {
        self.update_imports = update;
        self
    }
}

/// Something left out by the version filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Omission {
    pub object: ObjectId,
    /// `None` when the whole component was left out
    pub property: Option<PropertyName>,
    /// Component or property that was omitted
    pub name: String,
    pub since: FormatVersion,
}

impl fmt::Display for Omission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires version {}", self.name, self.since)
    }
}

/// Save result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub text: String,
    pub omissions: Vec<Omission>,
}

impl FxomDocument {
    /// Write the document
    pub fn save(&self, options: &SaveOptions) -> SaveReport {
        let mut writer = GlueWriter::new(self, options.target_version.as_ref());
        let root = self.root.and_then(|r| writer.element(r));
        let header = if options.update_imports {
            writer.regenerate_imports(self.glue.header.clone())
        } else {
            self.glue.header.clone()
        };

        let mut glue = GlueDocument {
            header,
            root,
            trailer: self.glue.trailer.clone(),
        };
        glue.update_indent();
        let text = GlueSerializer::new(options.compact).serialize(&glue);

        if !writer.omissions.is_empty() {
            tracing::info!("Saved with {} omissions", writer.omissions.len());
        }
        SaveReport {
            text,
            omissions: writer.omissions,
        }
    }

    /// Full-fidelity text
    pub fn to_text(&self) -> String {
        self.save(&SaveOptions::default()).text
    }

    /// Rebuild the glue root from the semantic tree
    pub fn sync_glue(&mut self) {
        let root = {
            let mut writer = GlueWriter::new(self, None);
            self.root.and_then(|r| writer.element(r))
        };
        self.glue.root = root;
        self.glue.update_indent();
    }
}

struct GlueWriter<'a> {
    document: &'a FxomDocument,
    target: Option<&'a FormatVersion>,
    omissions: Vec<Omission>,
}

impl<'a> GlueWriter<'a> {
    fn new(document: &'a FxomDocument, target: Option<&'a FormatVersion>) -> Self {
        Self {
            document,
            target,
            omissions: Vec::new(),
        }
    }

    fn node(&mut self, id: ObjectId) -> Option<GlueNode> {
        let document = self.document;
        match &document.object(id)?.kind {
            ObjectKind::Comment(comment) => Some(GlueNode::comment(comment.text.clone())),
            _ => self.element(id).map(GlueNode::Element),
        }
    }

    /// Leading formatting plus the node itself
    fn write_value(&mut self, out: &mut Vec<GlueNode>, id: ObjectId) {
        let document = self.document;
        let Some(node) = self.node(id) else {
            return;
        };
        if let Some(object) = document.object(id) {
            out.extend(object.format.leading.iter().cloned());
        }
        out.push(node);
    }

    fn element(&mut self, id: ObjectId) -> Option<GlueElement> {
        let document = self.document;
        let object = document.object(id)?;
        if self.component_too_new(id, object) {
            return None;
        }

        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut children: Vec<GlueNode> = Vec::new();
        let fx_id = object.fx_id.iter().map(|v| ("fx:id".to_string(), v.clone()));

        let tag = match &object.kind {
            ObjectKind::Instance(instance) => {
                if instance.fx_root {
                    attributes.push(("type".to_string(), instance.type_name.clone()));
                }
                attributes.extend(fx_id);
                let fx_attributes = [
                    ("fx:controller", &instance.controller),
                    ("fx:value", &instance.fx_value),
                    ("fx:constant", &instance.fx_constant),
                    ("fx:factory", &instance.fx_factory),
                ];
                for (name, value) in fx_attributes {
                    if let Some(value) = value {
                        attributes.push((name.to_string(), value.clone()));
                    }
                }
                if instance.fx_root {
                    "fx:root".to_string()
                } else {
                    instance.type_name.clone()
                }
            }
            ObjectKind::Intrinsic(intrinsic) => {
                attributes.extend(fx_id);
                match intrinsic {
                    Intrinsic::Include {
                        source,
                        charset,
                        resources,
                        ..
                    } => {
                        attributes.push(("source".to_string(), source.clone()));
                        if let Some(charset) = charset {
                            attributes.push(("charset".to_string(), charset.clone()));
                        }
                        if let Some(resources) = resources {
                            attributes.push(("resources".to_string(), resources.clone()));
                        }
                    }
                    Intrinsic::Reference { source } | Intrinsic::Copy { source } => {
                        attributes.push(("source".to_string(), source.clone()));
                    }
                    Intrinsic::Define => {}
                }
                intrinsic.tag().to_string()
            }
            ObjectKind::Script(script) => {
                attributes.extend(fx_id);
                if let Some(source) = &script.source {
                    attributes.push(("source".to_string(), source.clone()));
                }
                if let Some(charset) = &script.charset {
                    attributes.push(("charset".to_string(), charset.clone()));
                }
                if !script.body.is_empty() {
                    children.push(if script.cdata {
                        GlueNode::cdata(script.body.clone())
                    } else {
                        GlueNode::text(script.body.clone())
                    });
                }
                "fx:script".to_string()
            }
            ObjectKind::Comment(_) => return None,
        };

        for (name, value) in object.attributes.iter() {
            attributes.push((name.to_string(), value.to_string()));
        }

        for property in &object.properties {
            let Some(node) = document.property(*property) else {
                continue;
            };
            if self.property_too_new(id, object, node) {
                continue;
            }
            match &node.kind {
                PropertyKind::Text {
                    value,
                    form: TextForm::Attribute,
                } => attributes.push((node.name.to_string(), value.clone())),
                PropertyKind::Text {
                    value,
                    form: TextForm::Element,
                } => {
                    let mut element = property_element(node);
                    element.children.extend(text_runs(value, &node.format.content));
                    element.children.extend(node.format.closing.iter().cloned());
                    children.extend(node.format.leading.iter().cloned());
                    children.push(GlueNode::Element(element));
                }
                PropertyKind::Complex {
                    values,
                    implicit: true,
                } => {
                    for value in values {
                        self.write_value(&mut children, *value);
                    }
                }
                PropertyKind::Complex {
                    values,
                    implicit: false,
                } => {
                    let mut element = property_element(node);
                    for value in values {
                        self.write_value(&mut element.children, *value);
                    }
                    element.children.extend(node.format.closing.iter().cloned());
                    children.extend(node.format.leading.iter().cloned());
                    children.push(GlueNode::Element(element));
                }
            }
        }
        children.extend(object.format.closing.iter().cloned());

        let mut element = GlueElement::new(tag);
        element.synthetic = object.format.synthetic;
        element.attributes = order_attributes(&object.format.attribute_order, attributes);
        element.children = children;
        Some(element)
    }

    // ========================================================================
    // Version filter
    // ========================================================================

    fn component_too_new(&mut self, id: ObjectId, object: &ObjectNode) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let Some(descriptor) = object
            .as_instance()
            .and_then(|i| i.qualified_name.as_deref())
            .and_then(|q| self.document.registry().resolve(q))
        else {
            return false;
        };
        if descriptor.since <= *target {
            return false;
        }
        tracing::debug!("Omitting {} (since {})", descriptor.qualified_name, descriptor.since);
        self.omissions.push(Omission {
            object: id,
            property: None,
            name: descriptor.qualified_name.clone(),
            since: descriptor.since.clone(),
        });
        true
    }

    fn property_too_new(&mut self, id: ObjectId, object: &ObjectNode, property: &PropertyNode) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let Some(descriptor) = object
            .as_instance()
            .and_then(|i| i.qualified_name.as_deref())
            .and_then(|q| self.document.registry().property(q, &property.name))
        else {
            return false;
        };
        if descriptor.since <= *target {
            return false;
        }
        tracing::debug!("Omitting property {} (since {})", property.name, descriptor.since);
        self.omissions.push(Omission {
            object: id,
            property: Some(property.name.clone()),
            name: property.name.to_string(),
            since: descriptor.since.clone(),
        });
        true
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// Replace the import instructions with one per class in use
    fn regenerate_imports(&self, header: Vec<GlueNode>) -> Vec<GlueNode> {
        let document = self.document;
        let registry = document.registry();
        let mut needed: BTreeSet<String> = BTreeSet::new();
        let mut unresolved = false;
        for id in document.walk() {
            let Some(instance) = document.object(id).and_then(ObjectNode::as_instance) else {
                continue;
            };
            match &instance.qualified_name {
                Some(qualified) if !instance.type_name.contains('.') => {
                    needed.insert(qualified.clone());
                }
                Some(_) => {}
                None => unresolved = true,
            }
        }
        // Imports for classes this registry does not know are kept
        for import in document.resolver().imports() {
            let keep = match import {
                Import::Class(class) => registry.resolve(class).is_none(),
                Import::Package(_) => unresolved,
            };
            if keep {
                needed.insert(import.to_instruction_data());
            }
        }

        let is_import = |node: &GlueNode| matches!(node, GlueNode::Instruction { target, .. } if target == "import");
        let mut out = Vec::with_capacity(header.len() + needed.len() * 2);
        let mut insert_at = None;
        let mut tail = None;
        let mut after_import = false;
        for node in header {
            if is_import(&node) {
                insert_at.get_or_insert(out.len());
                after_import = true;
            } else if after_import && node.is_whitespace() {
                tail = Some(node);
                after_import = false;
            } else {
                after_import = false;
                out.push(node);
            }
        }

        let mut block = Vec::with_capacity(needed.len() * 2);
        for (i, data) in needed.into_iter().enumerate() {
            if i > 0 {
                block.push(GlueNode::text("\n"));
            }
            block.push(GlueNode::instruction("import", data));
        }
        if block.is_empty() {
            return out;
        }

        let at = match insert_at {
            Some(at) => {
                block.push(tail.unwrap_or_else(|| GlueNode::text("\n")));
                at
            }
            None => {
                let declaration = out
                    .iter()
                    .position(|n| matches!(n, GlueNode::Instruction { target, .. } if target == "xml"));
                match declaration {
                    Some(i) => {
                        block.insert(0, GlueNode::text("\n\n"));
                        i + 1
                    }
                    None => {
                        block.push(GlueNode::text("\n\n"));
                        0
                    }
                }
            }
        };
        out.splice(at..at, block);
        out
    }
}

fn property_element(property: &PropertyNode) -> GlueElement {
    let mut element = GlueElement::new(property.name.to_string());
    element.synthetic = property.format.synthetic;
    element
}

/// The parsed runs while they still spell `value`, else one run in the parsed style
fn text_runs(value: &str, recorded: &[GlueNode]) -> Vec<GlueNode> {
    let mut spelled = String::new();
    let mut cdata = false;
    for node in recorded {
        if let GlueNode::Text(text) = node {
            spelled.push_str(&text.content);
            cdata |= text.cdata;
        }
    }
    if !recorded.is_empty() && spelled == value {
        return recorded.to_vec();
    }
    if cdata && !value.contains("]]>") {
        vec![GlueNode::cdata(value)]
    } else {
        vec![GlueNode::text(value)]
    }
}

/// Recorded names first, the rest in the order given
fn order_attributes(order: &[String], attributes: Vec<(String, String)>) -> AttributeMap {
    let mut map = AttributeMap::new();
    for name in order {
        if let Some((name, value)) = attributes.iter().find(|(n, _)| n == name) {
            map.set(name.clone(), value.clone());
        }
    }
    for (name, value) in attributes {
        if !map.contains(&name) {
            map.set(name, value);
        }
    }
    map
}
