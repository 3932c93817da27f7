//! FXOM Builder
//!
//! Walks a glue tree and produces the semantic model. Resolution failures
//! (unknown classes, unreadable includes and scripts) are kept in the tree
//! and logged; only malformed structure and duplicate ids abort the build.

use fxkit_glue::{GlueDocument, GlueElement, GlueNode};
use fxkit_metadata::PropertyName;
use url::Url;

use crate::{
    resolve_location, Comment, FxomDocument, FxomError, FxomResult, Instance, Intrinsic,
    LoadContext, ObjectId, ObjectKind, ObjectNode, PropertyId, PropertyKind, PropertyNode,
    Script, TextForm,
};

impl FxomDocument {
    /// Parse markup text into a document
    pub fn parse(text: &str, context: &LoadContext) -> FxomResult<Self> {
        let glue = fxkit_glue::parse(text)?;
        Self::from_glue(glue, context.clone())
    }

    /// Build a document from an already parsed glue tree
    pub fn from_glue(glue: GlueDocument, context: LoadContext) -> FxomResult<Self> {
        build(glue, context, &[])
    }
}

/// Build with the chain of locations currently being included
fn build(mut glue: GlueDocument, context: LoadContext, loading: &[Url]) -> FxomResult<FxomDocument> {
    let root_element = glue.root.take();
    let mut document = FxomDocument::with_glue_header(glue, context);

    if let Some(element) = &root_element {
        let root = Builder {
            document: &mut document,
            loading,
        }
        .build_object(element)?;
        document.root = Some(root);
    }
    document.sync_glue();

    tracing::debug!(
        "Built FXOM document: {} objects, {} ids",
        document.object_count(),
        document.index.len()
    );
    Ok(document)
}

/// How an element is interpreted
enum ElementClass<'a> {
    /// `fx:` element; payload is the local name
    Intrinsic(&'a str),
    /// `property` or `Owner.property`
    Property(PropertyName),
    Instance,
}

fn classify(tag: &str) -> ElementClass<'_> {
    if let Some(local) = tag.strip_prefix("fx:") {
        return ElementClass::Intrinsic(local);
    }
    let last = tag.rsplit('.').next().unwrap_or(tag);
    if last.starts_with(|c: char| c.is_lowercase()) {
        if let Ok(name) = tag.parse() {
            return ElementClass::Property(name);
        }
    }
    ElementClass::Instance
}

fn unexpected(element: &GlueElement, reason: &str) -> FxomError {
    FxomError::UnexpectedElement {
        name: element.name.clone(),
        reason: reason.to_string(),
    }
}

fn is_content_text(node: &GlueNode) -> bool {
    matches!(node, GlueNode::Text(t) if t.cdata || !t.content.trim().is_empty())
}

struct Builder<'a> {
    document: &'a mut FxomDocument,
    loading: &'a [Url],
}

impl Builder<'_> {
    fn build_object(&mut self, element: &GlueElement) -> FxomResult<ObjectId> {
        match classify(&element.name) {
            ElementClass::Instance => self.build_instance(element, false),
            ElementClass::Intrinsic("root") => self.build_instance(element, true),
            ElementClass::Intrinsic("include") => self.build_include(element),
            ElementClass::Intrinsic("reference") => self.build_reference(element, false),
            ElementClass::Intrinsic("copy") => self.build_reference(element, true),
            ElementClass::Intrinsic("define") => self.build_define(element),
            ElementClass::Intrinsic("script") => self.build_script(element),
            ElementClass::Intrinsic(_) => Err(unexpected(element, "unknown fx: element")),
            ElementClass::Property(_) => Err(unexpected(element, "property element outside an object")),
        }
    }

    // ========================================================================
    // Objects
    // ========================================================================

    fn build_instance(&mut self, element: &GlueElement, fx_root: bool) -> FxomResult<ObjectId> {
        let type_name = if fx_root {
            element
                .attribute("type")
                .ok_or_else(|| unexpected(element, "fx:root requires a type"))?
                .to_string()
        } else {
            element.name.clone()
        };
        let qualified = self.document.resolve_type(&type_name);
        if qualified.is_none() {
            tracing::warn!("Cannot resolve class {}", type_name);
        }

        let mut instance = Instance::new(type_name, qualified);
        instance.fx_root = fx_root;
        instance.controller = element.attribute("fx:controller").map(String::from);
        instance.fx_value = element.attribute("fx:value").map(String::from);
        instance.fx_constant = element.attribute("fx:constant").map(String::from);
        instance.fx_factory = element.attribute("fx:factory").map(String::from);
        let id = self.new_object(element, ObjectKind::Instance(instance));

        for (name, value) in element.attributes.iter() {
            match name {
                "fx:id" => self.set_fx_id(id, value)?,
                "fx:controller" | "fx:value" | "fx:constant" | "fx:factory" => {}
                "type" if fx_root => {}
                _ if name.starts_with("xmlns") || name.starts_with("fx:") => {
                    self.document.obj_mut(id)?.attributes.set(name, value);
                }
                _ => match name.parse::<PropertyName>() {
                    Ok(property_name) => {
                        let property = self.new_property(
                            property_name,
                            PropertyKind::Text {
                                value: value.to_string(),
                                form: TextForm::Attribute,
                            },
                        );
                        self.attach_property(id, property)?;
                    }
                    Err(_) => {
                        self.document.obj_mut(id)?.attributes.set(name, value);
                    }
                },
            }
        }

        self.build_content(id, element, true)?;
        Ok(id)
    }

    fn build_include(&mut self, element: &GlueElement) -> FxomResult<ObjectId> {
        let source = element.attribute("source").unwrap_or_default().to_string();
        let charset = element.attribute("charset").map(String::from);
        let (included, failure) = match self.load_include(&source, charset.as_deref()) {
            Ok(document) => (Some(Box::new(document)), None),
            Err(message) => {
                tracing::warn!("Cannot include {}: {}", source, message);
                (None, Some(message))
            }
        };
        let intrinsic = Intrinsic::Include {
            source,
            charset,
            resources: element.attribute("resources").map(String::from),
            included,
            failure,
        };
        let id = self.build_intrinsic(element, intrinsic, &["source", "charset", "resources"])?;
        self.build_leaf_content(id, element)?;
        Ok(id)
    }

    fn build_reference(&mut self, element: &GlueElement, copy: bool) -> FxomResult<ObjectId> {
        let source = element.attribute("source").unwrap_or_default();
        let intrinsic = if copy {
            Intrinsic::copy(source)
        } else {
            Intrinsic::reference(source)
        };
        let id = self.build_intrinsic(element, intrinsic, &["source"])?;
        self.build_leaf_content(id, element)?;
        Ok(id)
    }

    fn build_define(&mut self, element: &GlueElement) -> FxomResult<ObjectId> {
        let id = self.build_intrinsic(element, Intrinsic::Define, &[])?;
        self.build_content(id, element, false)?;
        Ok(id)
    }

    fn build_script(&mut self, element: &GlueElement) -> FxomResult<ObjectId> {
        let mut script = Script::inline(element.text_content());
        script.source = element.attribute("source").map(String::from);
        script.charset = element.attribute("charset").map(String::from);
        script.cdata = element
            .children
            .iter()
            .any(|c| matches!(c, GlueNode::Text(t) if t.cdata));
        if let Some(source) = &script.source {
            let loaded = resolve_location(self.document.location(), source).and_then(|url| {
                self.document
                    .loader()
                    .read_text(&url, script.charset.as_deref())
            });
            match loaded {
                Ok(text) => script.loaded = Some(text),
                Err(e) => tracing::warn!("Cannot load script {}: {}", source, e),
            }
        }

        let id = self.new_object(element, ObjectKind::Script(script));
        self.apply_intrinsic_attributes(id, element, &["source", "charset"])?;
        let mut closing = Vec::new();
        for child in &element.children {
            match child {
                GlueNode::Text(_) => {}
                GlueNode::Element(e) => return Err(unexpected(e, "elements are not allowed in fx:script")),
                other => closing.push(other.clone()),
            }
        }
        self.document.obj_mut(id)?.format.closing = closing;
        Ok(id)
    }

    fn build_intrinsic(
        &mut self,
        element: &GlueElement,
        intrinsic: Intrinsic,
        known: &[&str],
    ) -> FxomResult<ObjectId> {
        let id = self.new_object(element, ObjectKind::Intrinsic(intrinsic));
        self.apply_intrinsic_attributes(id, element, known)?;
        Ok(id)
    }

    /// fx:id plus unknown attributes; `known` are consumed by the caller
    fn apply_intrinsic_attributes(
        &mut self,
        id: ObjectId,
        element: &GlueElement,
        known: &[&str],
    ) -> FxomResult<()> {
        for (name, value) in element.attributes.iter() {
            if name == "fx:id" {
                self.set_fx_id(id, value)?;
            } else if !known.contains(&name) {
                self.document.obj_mut(id)?.attributes.set(name, value);
            }
        }
        Ok(())
    }

    fn new_object(&mut self, element: &GlueElement, kind: ObjectKind) -> ObjectId {
        let mut node = ObjectNode::new(kind);
        node.format.attribute_order = element.attributes.names().map(String::from).collect();
        self.document.push_object(node)
    }

    fn set_fx_id(&mut self, id: ObjectId, fx_id: &str) -> FxomResult<()> {
        self.document.index.insert(fx_id, id)?;
        self.document.obj_mut(id)?.fx_id = Some(fx_id.to_string());
        Ok(())
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Property elements and inline values of an instance or `fx:define`
    fn build_content(&mut self, owner: ObjectId, element: &GlueElement, allow_properties: bool) -> FxomResult<()> {
        let mut aux: Vec<GlueNode> = Vec::new();
        let mut implicit: Option<PropertyId> = None;

        for child in &element.children {
            let GlueNode::Element(child_element) = child else {
                aux.push(child.clone());
                continue;
            };
            if let ElementClass::Property(name) = classify(&child_element.name) {
                if !allow_properties {
                    return Err(unexpected(child_element, "property element inside fx:define"));
                }
                let property = self.build_property(child_element, name)?;
                self.document.prop_mut(property)?.format.leading = std::mem::take(&mut aux);
                self.attach_property(owner, property)?;
            } else {
                let value = self.build_object(child_element)?;
                self.document.obj_mut(value)?.format.leading = std::mem::take(&mut aux);
                let property = match implicit {
                    Some(property) => property,
                    None => {
                        let property = self.new_property(
                            PropertyName::new(""),
                            PropertyKind::Complex {
                                values: Vec::new(),
                                implicit: true,
                            },
                        );
                        self.document.prop_mut(property)?.owner = Some(owner);
                        self.document.obj_mut(owner)?.properties.push(property);
                        implicit = Some(property);
                        property
                    }
                };
                self.push_value(property, value)?;
            }
        }

        self.document.obj_mut(owner)?.format.closing = aux;
        if let Some(property) = implicit {
            self.name_implicit(owner, property)?;
        }
        Ok(())
    }

    /// Children of include/reference/copy: formatting only
    fn build_leaf_content(&mut self, id: ObjectId, element: &GlueElement) -> FxomResult<()> {
        let mut closing = Vec::new();
        for child in &element.children {
            match child {
                GlueNode::Element(e) => return Err(unexpected(e, "intrinsic takes no content")),
                other => closing.push(other.clone()),
            }
        }
        self.document.obj_mut(id)?.format.closing = closing;
        Ok(())
    }

    fn build_property(&mut self, element: &GlueElement, name: PropertyName) -> FxomResult<PropertyId> {
        if !element.attributes.is_empty() {
            return Err(unexpected(element, "property elements take no attributes"));
        }

        if !element.has_element_children() && element.children.iter().any(is_content_text) {
            let property = self.new_property(
                name,
                PropertyKind::Text {
                    value: element.text_content(),
                    form: TextForm::Element,
                },
            );
            let (content, closing): (Vec<GlueNode>, Vec<GlueNode>) = element
                .children
                .iter()
                .cloned()
                .partition(|c| matches!(c, GlueNode::Text(_)));
            let format = &mut self.document.prop_mut(property)?.format;
            format.content = content;
            format.closing = closing;
            return Ok(property);
        }

        let property = self.new_property(
            name,
            PropertyKind::Complex {
                values: Vec::new(),
                implicit: false,
            },
        );
        let mut aux = Vec::new();
        for child in &element.children {
            let value = match child {
                GlueNode::Element(child_element) => {
                    if let ElementClass::Property(_) = classify(&child_element.name) {
                        return Err(unexpected(child_element, "property element inside a property element"));
                    }
                    self.build_object(child_element)?
                }
                GlueNode::Comment(text) => self.document.push_object(ObjectNode::new(ObjectKind::Comment(
                    Comment { text: text.clone() },
                ))),
                other => {
                    aux.push(other.clone());
                    continue;
                }
            };
            self.document.obj_mut(value)?.format.leading = std::mem::take(&mut aux);
            self.push_value(property, value)?;
        }
        self.document.prop_mut(property)?.format.closing = aux;
        Ok(property)
    }

    fn new_property(&mut self, name: PropertyName, kind: PropertyKind) -> PropertyId {
        self.document.push_property(PropertyNode::new(name, kind))
    }

    fn attach_property(&mut self, owner: ObjectId, property: PropertyId) -> FxomResult<()> {
        let name = self.document.prop(property)?.name.clone();
        if self.document.property_named(owner, &name).is_some() {
            return Err(FxomError::DuplicateProperty {
                owner: self.document.obj(owner)?.label(),
                property: name.to_string(),
            });
        }
        self.document.prop_mut(property)?.owner = Some(owner);
        self.document.obj_mut(owner)?.properties.push(property);
        Ok(())
    }

    fn push_value(&mut self, property: PropertyId, value: ObjectId) -> FxomResult<()> {
        if let PropertyKind::Complex { values, .. } = &mut self.document.prop_mut(property)?.kind {
            values.push(value);
        }
        self.document.obj_mut(value)?.parent = Some(property);
        Ok(())
    }

    /// Inline values belong to the owner's default property unless they are
    /// all scripts or defines
    fn name_implicit(&mut self, owner: ObjectId, property: PropertyId) -> FxomResult<()> {
        let document = &*self.document;
        let has_components = document.prop(property)?.values().iter().any(|v| {
            document.object(*v).is_some_and(|o| {
                !matches!(
                    o.kind,
                    ObjectKind::Script(_) | ObjectKind::Comment(_) | ObjectKind::Intrinsic(Intrinsic::Define)
                )
            })
        });
        if !has_components {
            return Ok(());
        }
        let Some(default) = document
            .qualified_type(owner)
            .and_then(|q| document.registry().default_property(q))
        else {
            return Ok(());
        };

        let name = PropertyName::new(default);
        if document.property_named(owner, &name).is_some() {
            return Err(FxomError::DuplicateProperty {
                owner: document.obj(owner)?.label(),
                property: name.to_string(),
            });
        }
        self.document.prop_mut(property)?.name = name;
        Ok(())
    }

    // ========================================================================
    // Includes
    // ========================================================================

    fn load_include(&self, source: &str, charset: Option<&str>) -> Result<FxomDocument, String> {
        if source.is_empty() {
            return Err("missing source".to_string());
        }
        let url = resolve_location(self.document.location(), source).map_err(|e| e.to_string())?;
        if self.loading.contains(&url) || self.document.location() == Some(&url) {
            return Err(format!("include cycle through {url}"));
        }
        let text = self
            .document
            .loader()
            .read_text(&url, charset)
            .map_err(|e| e.to_string())?;
        let glue = fxkit_glue::parse(&text).map_err(|e| e.to_string())?;

        let mut loading = self.loading.to_vec();
        loading.extend(self.document.location().cloned());
        let context = LoadContext {
            location: Some(url),
            ..self.document.context.clone()
        };
        build(glue, context, &loading).map_err(|e| e.to_string())
    }
}
