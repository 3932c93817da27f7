//! Structural jobs
//!
//! Attach, detach, move and replace objects and properties. Each job records
//! the slot it vacated so that undo puts the node back at the same position.

use fxkit_fxom::{FxomDocument, ObjectId, PropertyId};

use crate::{Job, JobContext, JobError, JobKind, JobResult};

pub(crate) fn label(document: &FxomDocument, object: ObjectId) -> String {
    document
        .object(object)
        .map(|o| o.label())
        .unwrap_or_else(|| object.to_string())
}

fn property_label(document: &FxomDocument, property: PropertyId) -> String {
    document
        .property(property)
        .map(|p| p.name().to_string())
        .unwrap_or_else(|| property.to_string())
}

/// Whether `object` exists and is attached to neither a property nor the root
pub(crate) fn is_detached(document: &FxomDocument, object: ObjectId) -> bool {
    document
        .object(object)
        .is_some_and(|o| o.parent().is_none() && document.root() != Some(object))
}

/// Whether `object` can go into `property` at `position`
pub(crate) fn accepts(document: &FxomDocument, property: PropertyId, object: ObjectId, position: Option<usize>) -> bool {
    let Some(node) = document.property(property) else {
        return false;
    };
    node.is_complex()
        && is_detached(document, object)
        && !node.owner().is_some_and(|owner| document.is_ancestor_or_self(object, owner))
        && position.is_none_or(|p| p <= node.values().len())
}

// ============================================================================
// Properties
// ============================================================================

/// Attach a detached property to an object
#[derive(Debug)]
pub struct AddPropertyJob {
    property: PropertyId,
    owner: ObjectId,
    position: Option<usize>,
    description: String,
}

impl AddPropertyJob {
    pub fn new(document: &FxomDocument, property: PropertyId, owner: ObjectId, position: Option<usize>) -> Self {
        Self {
            property,
            owner,
            position,
            description: format!(
                "Set {} on {}",
                property_label(document, property),
                label(document, owner)
            ),
        }
    }
}

impl Job for AddPropertyJob {
    fn kind(&self) -> JobKind {
        JobKind::AddProperty
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        let (Some(owner), Some(property)) = (document.object(self.owner), document.property(self.property)) else {
            return false;
        };
        owner.has_properties()
            && property.owner().is_none()
            && document.property_named(self.owner, property.name()).is_none()
            && self.position.is_none_or(|p| p <= owner.properties().len())
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        cx.document_mut().add_property(self.owner, self.property, self.position)?;
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        cx.document_mut().remove_property(self.property)?;
        Ok(())
    }
}

/// Detach a property from its owner
#[derive(Debug)]
pub struct RemovePropertyJob {
    property: PropertyId,
    slot: Option<(ObjectId, usize)>,
    description: String,
}

impl RemovePropertyJob {
    pub fn new(document: &FxomDocument, property: PropertyId) -> Self {
        let owner = document.property(property).and_then(|p| p.owner());
        Self {
            property,
            slot: None,
            description: match owner {
                Some(owner) => format!(
                    "Remove {} from {}",
                    property_label(document, property),
                    label(document, owner)
                ),
                None => format!("Remove {}", property_label(document, property)),
            },
        }
    }
}

impl Job for RemovePropertyJob {
    fn kind(&self) -> JobKind {
        JobKind::RemoveProperty
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.property(self.property).is_some_and(|p| p.owner().is_some())
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.slot = Some(cx.document_mut().remove_property(self.property)?);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let (owner, position) = self.slot.ok_or_else(|| JobError::state(self, "undo"))?;
        cx.document_mut().add_property(owner, self.property, Some(position))?;
        Ok(())
    }
}

// ============================================================================
// Values
// ============================================================================

/// Insert a detached object into a complex property
#[derive(Debug)]
pub struct AddPropertyValueJob {
    property: PropertyId,
    value: ObjectId,
    position: Option<usize>,
    description: String,
}

impl AddPropertyValueJob {
    pub fn new(document: &FxomDocument, property: PropertyId, value: ObjectId, position: Option<usize>) -> Self {
        Self {
            property,
            value,
            position,
            description: format!(
                "Add {} to {}",
                label(document, value),
                property_label(document, property)
            ),
        }
    }
}

impl Job for AddPropertyValueJob {
    fn kind(&self) -> JobKind {
        JobKind::AddPropertyValue
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        accepts(document, self.property, self.value, self.position)
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        cx.document_mut().add_value(self.property, self.value, self.position)?;
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        cx.document_mut().remove_value(self.value)?;
        Ok(())
    }
}

/// Detach an object from its property
#[derive(Debug)]
pub struct RemovePropertyValueJob {
    value: ObjectId,
    slot: Option<(PropertyId, usize)>,
    description: String,
}

impl RemovePropertyValueJob {
    pub fn new(document: &FxomDocument, value: ObjectId) -> Self {
        Self {
            value,
            slot: None,
            description: format!("Remove {}", label(document, value)),
        }
    }
}

impl Job for RemovePropertyValueJob {
    fn kind(&self) -> JobKind {
        JobKind::RemovePropertyValue
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.parent_property(self.value).is_some()
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.slot = Some(cx.document_mut().remove_value(self.value)?);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let (property, position) = self.slot.ok_or_else(|| JobError::state(self, "undo"))?;
        cx.document_mut().add_value(property, self.value, Some(position))?;
        Ok(())
    }
}

/// Move an object to another position, possibly in another property
///
/// `position` counts values after the object has been taken out.
#[derive(Debug)]
pub struct RelocateObjectJob {
    object: ObjectId,
    target: PropertyId,
    position: Option<usize>,
    origin: Option<(PropertyId, usize)>,
    description: String,
}

impl RelocateObjectJob {
    pub fn new(document: &FxomDocument, object: ObjectId, target: PropertyId, position: Option<usize>) -> Self {
        Self {
            object,
            target,
            position,
            origin: None,
            description: format!("Move {}", label(document, object)),
        }
    }

    fn relocate(cx: &mut JobContext<'_>, object: ObjectId, target: PropertyId, position: Option<usize>) -> JobResult<(PropertyId, usize)> {
        let document = cx.document_mut();
        let origin = document.remove_value(object)?;
        if let Err(err) = document.add_value(target, object, position) {
            document.add_value(origin.0, object, Some(origin.1))?;
            return Err(err.into());
        }
        Ok(origin)
    }
}

impl Job for RelocateObjectJob {
    fn kind(&self) -> JobKind {
        JobKind::RelocateObject
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        let (Some(current), Some(target)) = (document.parent_property(self.object), document.property(self.target)) else {
            return false;
        };
        let count = target.values().len() - usize::from(current == self.target);
        let moves = current != self.target
            || self.position.is_some_and(|p| Some(p) != document.index_in_parent(self.object));
        target.is_complex()
            && moves
            && !target.owner().is_some_and(|owner| document.is_ancestor_or_self(self.object, owner))
            && self.position.is_none_or(|p| p <= count)
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.origin = Some(Self::relocate(cx, self.object, self.target, self.position)?);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let (property, position) = self.origin.ok_or_else(|| JobError::state(self, "undo"))?;
        Self::relocate(cx, self.object, property, Some(position))?;
        Ok(())
    }
}

// ============================================================================
// Replacement
// ============================================================================

/// Where a replaced object sat
#[derive(Debug, Clone, Copy)]
enum Slot {
    Root,
    Value(PropertyId, usize),
}

/// Put a detached object in the place of another one
#[derive(Debug)]
pub struct ReplaceObjectJob {
    old: ObjectId,
    new: ObjectId,
    slot: Option<Slot>,
    description: String,
}

impl ReplaceObjectJob {
    pub fn new(document: &FxomDocument, old: ObjectId, new: ObjectId) -> Self {
        Self {
            old,
            new,
            slot: None,
            description: format!("Replace {} with {}", label(document, old), label(document, new)),
        }
    }

    fn swap(document: &mut FxomDocument, out: ObjectId, into: ObjectId, slot: Slot) -> JobResult<()> {
        match slot {
            Slot::Root => {
                document.set_root(Some(into))?;
            }
            Slot::Value(property, position) => {
                document.remove_value(out)?;
                if let Err(err) = document.add_value(property, into, Some(position)) {
                    document.add_value(property, out, Some(position))?;
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}

impl Job for ReplaceObjectJob {
    fn kind(&self) -> JobKind {
        JobKind::ReplaceObject
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        let placed = document.root() == Some(self.old) || document.parent_property(self.old).is_some();
        let valid_root = document.root() != Some(self.old)
            || document.object(self.new).is_some_and(|o| !o.is_comment());
        placed
            && valid_root
            && self.old != self.new
            && is_detached(document, self.new)
            && !document.is_ancestor_or_self(self.new, self.old)
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let document = cx.document_mut();
        let slot = if document.root() == Some(self.old) {
            Slot::Root
        } else {
            let property = document
                .parent_property(self.old)
                .ok_or_else(|| JobError::NotExecutable(self.description.clone()))?;
            let position = document
                .index_in_parent(self.old)
                .ok_or_else(|| JobError::NotExecutable(self.description.clone()))?;
            Slot::Value(property, position)
        };
        Self::swap(document, self.old, self.new, slot)?;
        self.slot = Some(slot);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let slot = self.slot.ok_or_else(|| JobError::state(self, "undo"))?;
        Self::swap(cx.document_mut(), self.new, self.old, slot)
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let slot = self.slot.ok_or_else(|| JobError::state(self, "redo"))?;
        Self::swap(cx.document_mut(), self.old, self.new, slot)
    }
}

/// Replace or clear the document root
#[derive(Debug)]
pub struct SetDocumentRootJob {
    root: Option<ObjectId>,
    previous: Option<Option<ObjectId>>,
    description: String,
}

impl SetDocumentRootJob {
    pub fn new(document: &FxomDocument, root: Option<ObjectId>) -> Self {
        Self {
            root,
            previous: None,
            description: match root {
                Some(root) => format!("Set root {}", label(document, root)),
                None => "Clear root".to_string(),
            },
        }
    }
}

impl Job for SetDocumentRootJob {
    fn kind(&self) -> JobKind {
        JobKind::SetDocumentRoot
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        match self.root {
            None => document.root().is_some(),
            Some(root) => {
                is_detached(document, root) && document.object(root).is_some_and(|o| !o.is_comment())
            }
        }
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.previous = Some(cx.document_mut().set_root(self.root)?);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let previous = self.previous.ok_or_else(|| JobError::state(self, "undo"))?;
        cx.document_mut().set_root(previous)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtensionRegistry;
    use fxkit_fxom::LoadContext;
    use fxkit_metadata::PropertyName;

    fn parse(text: &str) -> FxomDocument {
        FxomDocument::parse(text, &LoadContext::default()).unwrap()
    }

    fn run(document: &mut FxomDocument, job: &mut dyn Job) {
        assert!(job.is_executable(document), "{} not executable", job.description());
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(document, &mut extensions).execute(job).unwrap();
    }

    fn undo(document: &mut FxomDocument, job: &mut dyn Job) {
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(document, &mut extensions).undo(job).unwrap();
    }

    #[test]
    fn test_remove_value_and_undo() {
        let mut doc = parse(r#"<VBox><Label fx:id="a"/><Button fx:id="b"/></VBox>"#);
        let text = doc.to_text();
        let a = doc.lookup("a").unwrap();
        let mut job = RemovePropertyValueJob::new(&doc, a);
        assert_eq!(job.description(), "Remove Label (a)");
        run(&mut doc, &mut job);
        assert!(doc.lookup("a").is_none());
        undo(&mut doc, &mut job);
        assert_eq!(doc.lookup("a"), Some(a));
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn test_add_property_checks_duplicates() {
        let mut doc = parse(r#"<Button text="a"/>"#);
        let root = doc.root().unwrap();
        let text = doc.create_text_property(PropertyName::new("text"), "b", fxkit_fxom::TextForm::Attribute);
        assert!(!AddPropertyJob::new(&doc, text, root, None).is_executable(&doc));
        let other = doc.create_text_property(PropertyName::new("mnemonicParsing"), "false", fxkit_fxom::TextForm::Attribute);
        let mut job = AddPropertyJob::new(&doc, other, root, None);
        run(&mut doc, &mut job);
        assert_eq!(doc.to_text(), r#"<Button text="a" mnemonicParsing="false"/>"#);
    }

    #[test]
    fn test_relocate_between_properties() {
        let mut doc = parse(r#"<VBox><HBox fx:id="row"><Label fx:id="l"/></HBox><Button fx:id="b"/></VBox>"#);
        let text = doc.to_text();
        let row = doc.lookup("row").unwrap();
        let row_children = doc.object(row).unwrap().properties()[0];
        let b = doc.lookup("b").unwrap();
        let mut job = RelocateObjectJob::new(&doc, b, row_children, Some(0));
        run(&mut doc, &mut job);
        assert_eq!(doc.parent_object(b), Some(row));
        assert_eq!(doc.index_in_parent(b), Some(0));
        undo(&mut doc, &mut job);
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn test_relocate_into_own_subtree_rejected() {
        let doc = parse(r#"<VBox><HBox fx:id="row"><Label/></HBox></VBox>"#);
        let row = doc.lookup("row").unwrap();
        let row_children = doc.object(row).unwrap().properties()[0];
        assert!(!RelocateObjectJob::new(&doc, row, row_children, None).is_executable(&doc));
    }

    #[test]
    fn test_replace_root() {
        let mut doc = parse(r#"<VBox fx:id="main"/>"#);
        let old = doc.root().unwrap();
        let new = doc.create_instance("HBox");
        doc.set_fx_id(new, Some("main".into())).unwrap();
        let mut job = ReplaceObjectJob::new(&doc, old, new);
        run(&mut doc, &mut job);
        assert_eq!(doc.lookup("main"), Some(new));
        undo(&mut doc, &mut job);
        assert_eq!(doc.lookup("main"), Some(old));
        assert_eq!(doc.root(), Some(old));
    }

    #[test]
    fn test_set_document_root() {
        let mut doc = FxomDocument::new(LoadContext::default());
        let pane = doc.create_instance("Pane");
        let mut job = SetDocumentRootJob::new(&doc, Some(pane));
        run(&mut doc, &mut job);
        assert_eq!(doc.root(), Some(pane));
        assert!(!SetDocumentRootJob::new(&doc, Some(pane)).is_executable(&doc));
        undo(&mut doc, &mut job);
        assert_eq!(doc.root(), None);
    }
}
