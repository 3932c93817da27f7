//! FXOM Document
//!
//! Owns the object and property arenas, the fx:id index and the glue
//! snapshot. Every structural primitive here keeps the index in step with
//! the tree: attaching a subtree registers its ids (failing before any
//! change on collision), detaching unregisters them. Detached nodes stay in
//! the arena so that jobs can attach them again on undo/redo.

use std::sync::Arc;

use fxkit_glue::GlueDocument;
use fxkit_metadata::{MetadataRegistry, PropertyName, TypeResolver};
use url::Url;

use crate::{
    Comment, FileSystemLoader, FxIdIndex, FxomError, FxomResult, Instance, NodeFormat, ObjectId,
    ObjectKind, ObjectNode, PropertyId, PropertyKind, PropertyNode, ResourceBundle,
    ResourceLoader, TextForm,
};

/// Everything a document needs from its surroundings
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Base location for relative includes and `@` paths
    pub location: Option<Url>,
    pub registry: Arc<MetadataRegistry>,
    pub resources: Option<Arc<ResourceBundle>>,
    pub loader: Arc<dyn ResourceLoader>,
}

impl LoadContext {
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self {
            location: None,
            registry,
            resources: None,
            loader: Arc::new(FileSystemLoader::new()),
        }
    }

    pub fn with_location(mut self, location: Url) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_resources(mut self, resources: ResourceBundle) -> Self {
        self.resources = Some(Arc::new(resources));
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }
}

impl Default for LoadContext {
    fn default() -> Self {
        Self::new(Arc::new(MetadataRegistry::builtin()))
    }
}

/// Semantic document
#[derive(Debug, Clone)]
pub struct FxomDocument {
    pub(crate) objects: Vec<ObjectNode>,
    pub(crate) properties: Vec<PropertyNode>,
    pub(crate) root: Option<ObjectId>,
    pub(crate) index: FxIdIndex,
    /// Header/trailer as parsed, root as of the last `sync_glue`
    pub(crate) glue: GlueDocument,
    pub(crate) context: LoadContext,
    pub(crate) resolver: TypeResolver,
    revision: u64,
    saved_revision: u64,
    /// Bumped by every mutation, never restored
    stamp: u64,
}

impl FxomDocument {
    /// Empty document starting with an XML declaration
    pub fn new(context: LoadContext) -> Self {
        Self::with_glue_header(GlueDocument::with_declaration(), context)
    }

    pub(crate) fn with_glue_header(glue: GlueDocument, context: LoadContext) -> Self {
        let resolver = TypeResolver::from_instructions(glue.instructions("import"));
        Self {
            objects: Vec::new(),
            properties: Vec::new(),
            root: None,
            index: FxIdIndex::new(),
            glue: GlueDocument {
                root: None,
                ..glue
            },
            context,
            resolver,
            revision: 0,
            saved_revision: 0,
            stamp: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    #[inline]
    pub fn object(&self, id: ObjectId) -> Option<&ObjectNode> {
        self.objects.get(id.index())
    }

    #[inline]
    pub fn property(&self, id: PropertyId) -> Option<&PropertyNode> {
        self.properties.get(id.index())
    }

    /// Glue tree as of the last sync
    pub fn glue(&self) -> &GlueDocument {
        &self.glue
    }

    pub fn context(&self) -> &LoadContext {
        &self.context
    }

    pub fn location(&self) -> Option<&Url> {
        self.context.location.as_ref()
    }

    pub fn set_location(&mut self, location: Option<Url>) {
        self.context.location = location;
        self.touch();
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.context.registry
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn resources(&self) -> Option<&ResourceBundle> {
        self.context.resources.as_deref()
    }

    pub fn set_resources(&mut self, resources: Option<ResourceBundle>) {
        self.context.resources = resources.map(Arc::new);
        self.touch();
    }

    pub fn loader(&self) -> &dyn ResourceLoader {
        self.context.loader.as_ref()
    }

    pub fn index(&self) -> &FxIdIndex {
        &self.index
    }

    /// Attached object with the given fx:id
    pub fn lookup(&self, fx_id: &str) -> Option<ObjectId> {
        self.index.get(fx_id)
    }

    /// Resolve a type name through the document imports and the registry
    pub fn resolve_type(&self, type_name: &str) -> Option<String> {
        self.resolver.resolve(&self.context.registry, type_name)
    }

    // ========================================================================
    // Revisions
    // ========================================================================

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Set by the job history; undo restores the previous value
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub fn saved_revision(&self) -> u64 {
        self.saved_revision
    }

    /// Record the current revision as saved
    pub fn mark_saved(&mut self) {
        self.saved_revision = self.revision;
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Changes on every mutation; keys derived caches
    #[inline]
    pub fn modification_stamp(&self) -> u64 {
        self.stamp
    }

    pub(crate) fn touch(&mut self) {
        self.stamp += 1;
    }

    // ========================================================================
    // Internal access
    // ========================================================================

    pub(crate) fn obj(&self, id: ObjectId) -> FxomResult<&ObjectNode> {
        self.objects.get(id.index()).ok_or(FxomError::UnknownObject(id))
    }

    pub(crate) fn obj_mut(&mut self, id: ObjectId) -> FxomResult<&mut ObjectNode> {
        self.objects
            .get_mut(id.index())
            .ok_or(FxomError::UnknownObject(id))
    }

    pub(crate) fn prop(&self, id: PropertyId) -> FxomResult<&PropertyNode> {
        self.properties
            .get(id.index())
            .ok_or(FxomError::UnknownProperty(id))
    }

    pub(crate) fn prop_mut(&mut self, id: PropertyId) -> FxomResult<&mut PropertyNode> {
        self.properties
            .get_mut(id.index())
            .ok_or(FxomError::UnknownProperty(id))
    }

    pub(crate) fn push_object(&mut self, node: ObjectNode) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(node);
        id
    }

    pub(crate) fn push_property(&mut self, node: PropertyNode) -> PropertyId {
        let id = PropertyId(self.properties.len() as u32);
        self.properties.push(node);
        id
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn parent_property(&self, id: ObjectId) -> Option<PropertyId> {
        self.object(id)?.parent
    }

    pub fn parent_object(&self, id: ObjectId) -> Option<ObjectId> {
        self.property(self.parent_property(id)?)?.owner
    }

    /// Position of an object among its parent property's values
    pub fn index_in_parent(&self, id: ObjectId) -> Option<usize> {
        let parent = self.property(self.parent_property(id)?)?;
        parent.values().iter().position(|v| *v == id)
    }

    /// Whether the object is reachable from the document root
    pub fn is_attached(&self, id: ObjectId) -> bool {
        let mut current = id;
        loop {
            if self.root == Some(current) {
                return true;
            }
            match self.parent_object(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent_object(c);
        }
        false
    }

    pub fn property_named(&self, owner: ObjectId, name: &PropertyName) -> Option<PropertyId> {
        self.object(owner)?
            .properties
            .iter()
            .copied()
            .find(|p| self.property(*p).is_some_and(|p| p.name.matches(name)))
    }

    /// Text value of a named property
    pub fn text_value(&self, owner: ObjectId, name: &str) -> Option<&str> {
        let id = self.property_named(owner, &PropertyName::new(name))?;
        self.property(id)?.text()
    }

    /// Objects of the subtree rooted at `id`, in document order
    pub fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        self.walk_from(id).collect()
    }

    /// Qualified type of an instance
    pub fn qualified_type(&self, id: ObjectId) -> Option<&str> {
        self.object(id)?.as_instance()?.qualified_name.as_deref()
    }

    // ========================================================================
    // Creation (detached)
    // ========================================================================

    /// New detached object
    pub fn create_object(&mut self, kind: ObjectKind) -> ObjectId {
        self.touch();
        let mut node = ObjectNode::new(kind);
        node.format = NodeFormat::synthetic();
        self.push_object(node)
    }

    /// New detached instance; the tag is written by simple name when the
    /// document can resolve it back
    pub fn create_instance(&mut self, type_name: &str) -> ObjectId {
        let qualified = self.resolve_type(type_name);
        let tag = match &qualified {
            Some(q) => self.resolver.tag_for(&self.context.registry, q),
            None => type_name.to_string(),
        };
        self.create_object(ObjectKind::Instance(Instance::new(tag, qualified)))
    }

    pub fn create_text_property(
        &mut self,
        name: PropertyName,
        value: impl Into<String>,
        form: TextForm,
    ) -> PropertyId {
        self.touch();
        let mut node = PropertyNode::new(
            name,
            PropertyKind::Text {
                value: value.into(),
                form,
            },
        );
        node.format = NodeFormat::synthetic();
        self.push_property(node)
    }

    /// New detached `<name>` property element with no values
    pub fn create_complex_property(&mut self, name: PropertyName) -> PropertyId {
        self.touch();
        let mut node = PropertyNode::new(
            name,
            PropertyKind::Complex {
                values: Vec::new(),
                implicit: false,
            },
        );
        node.format = NodeFormat::synthetic();
        self.push_property(node)
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Attach a detached property to an object
    pub fn add_property(
        &mut self,
        owner: ObjectId,
        property: PropertyId,
        position: Option<usize>,
    ) -> FxomResult<()> {
        let owner_node = self.obj(owner)?;
        if !owner_node.has_properties() {
            return Err(FxomError::invalid(format!("{} has no properties", owner_node.label())));
        }
        let node = self.prop(property)?;
        if node.owner.is_some() {
            return Err(FxomError::invalid(format!("{property} is already attached")));
        }
        if self.property_named(owner, &node.name).is_some() {
            return Err(FxomError::DuplicateProperty {
                owner: owner_node.label(),
                property: node.name.to_string(),
            });
        }
        let count = owner_node.properties.len();
        let position = position.unwrap_or(count);
        if position > count {
            return Err(FxomError::invalid(format!("property position {position} out of range")));
        }

        let attached = self.is_attached(owner);
        let values = node.values().to_vec();
        if attached {
            let mut ids = Vec::new();
            for value in &values {
                self.collect_ids(*value, &mut ids);
            }
            self.check_ids(&ids, None)?;
        }

        self.touch();
        self.prop_mut(property)?.owner = Some(owner);
        self.obj_mut(owner)?.properties.insert(position, property);
        if attached {
            for value in values {
                self.index_subtree(value)?;
            }
        }
        Ok(())
    }

    /// Detach a property from its owner; returns the owner and position
    pub fn remove_property(&mut self, property: PropertyId) -> FxomResult<(ObjectId, usize)> {
        let node = self.prop(property)?;
        let owner = node
            .owner
            .ok_or_else(|| FxomError::invalid(format!("{property} is not attached")))?;
        let values = node.values().to_vec();
        let position = self
            .obj(owner)?
            .properties
            .iter()
            .position(|p| *p == property)
            .ok_or_else(|| FxomError::invalid(format!("{property} not found in its owner")))?;

        if self.is_attached(owner) {
            for value in &values {
                self.unindex_subtree(*value);
            }
        }
        self.touch();
        self.obj_mut(owner)?.properties.remove(position);
        self.prop_mut(property)?.owner = None;
        Ok((owner, position))
    }

    /// Insert a detached object into a complex property
    pub fn add_value(
        &mut self,
        property: PropertyId,
        object: ObjectId,
        position: Option<usize>,
    ) -> FxomResult<()> {
        let node = self.prop(property)?;
        let PropertyKind::Complex { values, .. } = &node.kind else {
            return Err(FxomError::invalid(format!("{} is a text property", node.name)));
        };
        let count = values.len();
        let owner = node.owner;
        let position = position.unwrap_or(count);
        if position > count {
            return Err(FxomError::invalid(format!("value position {position} out of range")));
        }
        let object_node = self.obj(object)?;
        if object_node.parent.is_some() || self.root == Some(object) {
            return Err(FxomError::invalid(format!("{} is already attached", object_node.label())));
        }
        if owner.is_some_and(|o| self.is_ancestor_or_self(object, o)) {
            return Err(FxomError::invalid("an object cannot contain itself"));
        }

        let attached = owner.is_some_and(|o| self.is_attached(o));
        if attached {
            let mut ids = Vec::new();
            self.collect_ids(object, &mut ids);
            self.check_ids(&ids, None)?;
        }

        self.touch();
        if let PropertyKind::Complex { values, .. } = &mut self.prop_mut(property)?.kind {
            values.insert(position, object);
        }
        self.obj_mut(object)?.parent = Some(property);
        if attached {
            self.index_subtree(object)?;
        }
        Ok(())
    }

    /// Detach an object from its property; returns the property and position
    pub fn remove_value(&mut self, object: ObjectId) -> FxomResult<(PropertyId, usize)> {
        let property = self
            .obj(object)?
            .parent
            .ok_or_else(|| FxomError::invalid(format!("{object} has no parent property")))?;
        let position = self
            .prop(property)?
            .values()
            .iter()
            .position(|v| *v == object)
            .ok_or_else(|| FxomError::invalid(format!("{object} not found in its property")))?;

        if self.is_attached(object) {
            self.unindex_subtree(object);
        }
        self.touch();
        if let PropertyKind::Complex { values, .. } = &mut self.prop_mut(property)?.kind {
            values.remove(position);
        }
        self.obj_mut(object)?.parent = None;
        Ok((property, position))
    }

    /// Replace the root object; returns the previous root
    pub fn set_root(&mut self, root: Option<ObjectId>) -> FxomResult<Option<ObjectId>> {
        let previous = self.root;
        if previous == root {
            return Ok(previous);
        }
        if let Some(new_root) = root {
            let node = self.obj(new_root)?;
            if node.parent.is_some() {
                return Err(FxomError::invalid(format!("{} is already attached", node.label())));
            }
            if node.is_comment() {
                return Err(FxomError::invalid("a comment cannot be the document root"));
            }
            let mut ids = Vec::new();
            self.collect_ids(new_root, &mut ids);
            self.check_ids(&ids, previous)?;
        }

        self.touch();
        if let Some(old) = previous {
            self.unindex_subtree(old);
        }
        self.root = root;
        if let Some(new_root) = root {
            self.index_subtree(new_root)?;
        }
        Ok(previous)
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Set or clear an object's fx:id; returns the previous one
    pub fn set_fx_id(&mut self, object: ObjectId, fx_id: Option<String>) -> FxomResult<Option<String>> {
        if fx_id.as_deref().is_some_and(str::is_empty) {
            return Err(FxomError::invalid("fx:id cannot be empty"));
        }
        let attached = self.is_attached(object);
        if let (true, Some(id)) = (attached, fx_id.as_deref()) {
            if self.index.get(id).is_some_and(|other| other != object) {
                return Err(FxomError::DuplicateId { id: id.to_string() });
            }
        }
        self.touch();
        let previous = std::mem::replace(&mut self.obj_mut(object)?.fx_id, fx_id.clone());
        if attached {
            if let Some(old) = &previous {
                self.index.remove(old, object);
            }
            if let Some(new) = &fx_id {
                self.index.insert(new, object)?;
            }
        }
        Ok(previous)
    }

    /// Replace a text property value; returns the previous value
    pub fn set_text_value(&mut self, property: PropertyId, value: String) -> FxomResult<String> {
        let node = self.prop_mut(property)?;
        let previous = match &mut node.kind {
            PropertyKind::Text { value: current, .. } => std::mem::replace(current, value),
            PropertyKind::Complex { .. } => {
                return Err(FxomError::invalid(format!("{} is a complex property", node.name)));
            }
        };
        self.touch();
        Ok(previous)
    }

    pub fn set_controller(&mut self, object: ObjectId, controller: Option<String>) -> FxomResult<Option<String>> {
        let previous = std::mem::replace(&mut self.instance_mut(object)?.controller, controller);
        self.touch();
        Ok(previous)
    }

    /// Switch between `<Type>` and `<fx:root type="Type">`
    pub fn set_fx_root(&mut self, object: ObjectId, fx_root: bool) -> FxomResult<bool> {
        let previous = std::mem::replace(&mut self.instance_mut(object)?.fx_root, fx_root);
        self.touch();
        Ok(previous)
    }

    pub fn set_script_body(&mut self, object: ObjectId, body: String) -> FxomResult<String> {
        let previous = match &mut self.obj_mut(object)?.kind {
            ObjectKind::Script(script) => std::mem::replace(&mut script.body, body),
            _ => return Err(FxomError::invalid(format!("{object} is not a script"))),
        };
        self.touch();
        Ok(previous)
    }

    pub fn set_comment_text(&mut self, object: ObjectId, text: String) -> FxomResult<String> {
        if !Comment::accepts(&text) {
            return Err(FxomError::invalid(format!("{text:?} is not valid comment text")));
        }
        let previous = match &mut self.obj_mut(object)?.kind {
            ObjectKind::Comment(comment) => std::mem::replace(&mut comment.text, text),
            _ => return Err(FxomError::invalid(format!("{object} is not a comment"))),
        };
        self.touch();
        Ok(previous)
    }

    fn instance_mut(&mut self, object: ObjectId) -> FxomResult<&mut Instance> {
        match &mut self.obj_mut(object)?.kind {
            ObjectKind::Instance(instance) => Ok(instance),
            _ => Err(FxomError::invalid(format!("{object} is not an instance"))),
        }
    }

    // ========================================================================
    // Index maintenance
    // ========================================================================

    /// fx:ids of a subtree, nested included documents excluded
    pub(crate) fn collect_ids(&self, root: ObjectId, out: &mut Vec<(String, ObjectId)>) {
        for id in self.walk_from(root) {
            if let Some(fx_id) = self.object(id).and_then(ObjectNode::fx_id) {
                out.push((fx_id.to_string(), id));
            }
        }
    }

    /// Fail if any id collides with another id of the list or with an
    /// indexed object outside the subtree of `replacing`
    pub(crate) fn check_ids(&self, ids: &[(String, ObjectId)], replacing: Option<ObjectId>) -> FxomResult<()> {
        for (i, (fx_id, object)) in ids.iter().enumerate() {
            if ids[..i].iter().any(|(other, _)| other == fx_id) {
                return Err(FxomError::DuplicateId { id: fx_id.clone() });
            }
            if let Some(existing) = self.index.get(fx_id) {
                let replaced = replacing.is_some_and(|r| self.is_ancestor_or_self(r, existing));
                if existing != *object && !replaced {
                    return Err(FxomError::DuplicateId { id: fx_id.clone() });
                }
            }
        }
        Ok(())
    }

    fn index_subtree(&mut self, root: ObjectId) -> FxomResult<()> {
        let mut ids = Vec::new();
        self.collect_ids(root, &mut ids);
        for (fx_id, object) in ids {
            self.index.insert(&fx_id, object)?;
        }
        Ok(())
    }

    fn unindex_subtree(&mut self, root: ObjectId) {
        let mut ids = Vec::new();
        self.collect_ids(root, &mut ids);
        for (fx_id, object) in ids {
            self.index.remove(&fx_id, object);
        }
    }
}
