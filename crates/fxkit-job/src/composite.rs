//! Composite jobs
//!
//! Each composite job works out its steps from the document state on first
//! execution, runs them as a [`BatchJob`] and replays that batch on undo and
//! redo. Extension hooks fire for every step.

use fxkit_fxom::{
    CloneOptions, FxomDocument, FxomFragment, IdPolicy, Intrinsic, ObjectId, ObjectKind, PropertyId,
    ReferenceSite,
};
use fxkit_metadata::PropertyName;

use crate::structure::label;
use crate::{
    AddPropertyJob, AddPropertyValueJob, BatchJob, Job, JobContext, JobError, JobKind, JobResult,
    RemovePropertyJob, RemovePropertyValueJob, ReplaceObjectJob, SetDocumentRootJob,
};

/// Replay a planned batch in the given direction
fn replay(batch: &mut Option<BatchJob>, cx: &mut JobContext<'_>, job: &dyn Job, undo: bool) -> JobResult<()> {
    let action = if undo { "undo" } else { "redo" };
    let batch = batch.as_mut().ok_or_else(|| JobError::state(job, action))?;
    if undo { batch.do_undo(cx) } else { batch.do_redo(cx) }
}

// ============================================================================
// Delete
// ============================================================================

/// Remove an object from the tree
///
/// When a `fx:reference` elsewhere in the document names the object's
/// fx:id, the first such reference is replaced by the object itself so the
/// referencing site keeps its value. A property left without values is
/// removed with its last value.
#[derive(Debug)]
pub struct DeleteObjectJob {
    object: ObjectId,
    batch: Option<BatchJob>,
    description: String,
}

impl DeleteObjectJob {
    pub fn new(document: &FxomDocument, object: ObjectId) -> Self {
        Self {
            object,
            batch: None,
            description: format!("Delete {}", label(document, object)),
        }
    }

    /// First `fx:reference` outside the subtree naming the object
    fn heir(&self, document: &FxomDocument) -> Option<ObjectId> {
        let fx_id = document.object(self.object)?.fx_id()?;
        document.references_to(fx_id).into_iter().find_map(|site| match site {
            ReferenceSite::Intrinsic(reference)
                if matches!(
                    document.object(reference).and_then(|o| o.as_intrinsic()),
                    Some(Intrinsic::Reference { .. })
                ) && !document.is_ancestor_or_self(self.object, reference) =>
            {
                Some(reference)
            }
            _ => None,
        })
    }

    fn plan(&self, document: &FxomDocument) -> JobResult<BatchJob> {
        let mut batch = BatchJob::new(self.description.clone());
        let heir = self.heir(document);

        if document.root() == Some(self.object) {
            batch.push(Box::new(SetDocumentRootJob::new(document, None)));
        } else {
            let parent = document
                .parent_property(self.object)
                .ok_or_else(|| JobError::NotExecutable(self.description.clone()))?;
            let only_value = document.property(parent).is_some_and(|p| p.values().len() == 1);
            if only_value && heir.is_none() {
                batch.push(Box::new(RemovePropertyJob::new(document, parent)));
            } else {
                batch.push(Box::new(RemovePropertyValueJob::new(document, self.object)));
            }
        }

        if let Some(reference) = heir {
            tracing::debug!("{} moves into its reference", label(document, self.object));
            batch.push(Box::new(ReplaceObjectJob::new(document, reference, self.object)));
        }
        Ok(batch)
    }
}

impl Job for DeleteObjectJob {
    fn kind(&self) -> JobKind {
        JobKind::DeleteObject
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.root() == Some(self.object) || document.parent_property(self.object).is_some()
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.plan(cx.document())?;
        batch.do_execute(cx)?;
        self.batch = Some(batch);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, true);
        self.batch = batch;
        result
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, false);
        self.batch = batch;
        result
    }
}

// ============================================================================
// Expand reference
// ============================================================================

/// Replace an `fx:reference` / `fx:copy` with a copy of its target
///
/// The copy carries no fx:ids, so it never collides with the target.
#[derive(Debug)]
pub struct ExpandReferenceJob {
    reference: ObjectId,
    batch: Option<BatchJob>,
    description: String,
}

impl ExpandReferenceJob {
    pub fn new(document: &FxomDocument, reference: ObjectId) -> Self {
        let source = document
            .object(reference)
            .and_then(|o| o.as_intrinsic())
            .and_then(Intrinsic::reference_source)
            .unwrap_or_default();
        Self {
            reference,
            batch: None,
            description: format!("Expand reference to {source}"),
        }
    }

    fn target(&self, document: &FxomDocument) -> Option<ObjectId> {
        let source = document.object(self.reference)?.as_intrinsic()?.reference_source()?;
        document.resolve_reference(source)
    }
}

impl Job for ExpandReferenceJob {
    fn kind(&self) -> JobKind {
        JobKind::ExpandReference
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.parent_property(self.reference).is_some()
            && self
                .target(document)
                .is_some_and(|target| !document.is_ancestor_or_self(target, self.reference))
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let target = self
            .target(cx.document())
            .ok_or_else(|| JobError::NotExecutable(self.description.clone()))?;
        let copy = cx
            .document_mut()
            .clone_object(target, CloneOptions::subtree().with_ids(IdPolicy::Strip))?;
        let mut batch = BatchJob::new(self.description.clone());
        batch.push(Box::new(ReplaceObjectJob::new(cx.document(), self.reference, copy)));
        batch.do_execute(cx)?;
        self.batch = Some(batch);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, true);
        self.batch = batch;
        result
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, false);
        self.batch = batch;
        result
    }
}

// ============================================================================
// Insert
// ============================================================================

/// Where an inserted fragment goes
#[derive(Debug, Clone)]
pub enum InsertTarget {
    /// An existing complex property
    Property { property: PropertyId, position: Option<usize> },
    /// A property of an object, created when missing; `None` names the
    /// object's default property
    Owner {
        owner: ObjectId,
        name: Option<PropertyName>,
        position: Option<usize>,
    },
    /// The root of an empty document
    Root,
}

/// Paste a fragment
#[derive(Debug)]
pub struct InsertFragmentJob {
    fragment: FxomFragment,
    target: InsertTarget,
    ids: IdPolicy,
    inserted: Option<ObjectId>,
    batch: Option<BatchJob>,
}

impl InsertFragmentJob {
    /// Colliding ids are renamed
    pub fn new(fragment: FxomFragment, target: InsertTarget) -> Self {
        Self {
            fragment,
            target,
            ids: IdPolicy::Rename,
            inserted: None,
            batch: None,
        }
    }

    pub fn with_ids(mut self, ids: IdPolicy) -> Self {
        self.ids = ids;
        self
    }

    /// Object created by the first execution
    pub fn inserted(&self) -> Option<ObjectId> {
        self.inserted
    }

    fn property_name(document: &FxomDocument, owner: ObjectId, name: Option<&PropertyName>) -> Option<PropertyName> {
        if let Some(name) = name {
            return Some(name.clone());
        }
        match document.object(owner)?.kind() {
            ObjectKind::Instance(instance) => {
                let qualified = instance.qualified_name.as_deref()?;
                document.registry().default_property(qualified).map(PropertyName::new)
            }
            ObjectKind::Intrinsic(Intrinsic::Define) => Some(PropertyName::new("")),
            _ => None,
        }
    }

    fn plan(&self, document: &mut FxomDocument, object: ObjectId) -> JobResult<BatchJob> {
        let mut batch = BatchJob::new(self.description());
        match &self.target {
            InsertTarget::Property { property, position } => {
                batch.push(Box::new(AddPropertyValueJob::new(document, *property, object, *position)));
            }
            InsertTarget::Owner { owner, name, position } => {
                let name = Self::property_name(document, *owner, name.as_ref())
                    .ok_or_else(|| JobError::NotExecutable(self.description()))?;
                match document.property_named(*owner, &name) {
                    Some(property) => {
                        batch.push(Box::new(AddPropertyValueJob::new(document, property, object, *position)));
                    }
                    None => {
                        let property = document.create_complex_property(name);
                        batch.push(Box::new(AddPropertyValueJob::new(document, property, object, None)));
                        batch.push(Box::new(AddPropertyJob::new(document, property, *owner, None)));
                    }
                }
            }
            InsertTarget::Root => {
                batch.push(Box::new(SetDocumentRootJob::new(document, Some(object))));
            }
        }
        Ok(batch)
    }
}

impl Job for InsertFragmentJob {
    fn kind(&self) -> JobKind {
        JobKind::InsertFragment
    }

    fn description(&self) -> String {
        format!("Paste {}", self.fragment.label())
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        if self.ids == IdPolicy::Fail && self.fragment.fx_ids().iter().any(|id| document.lookup(id).is_some()) {
            return false;
        }
        let fits = |property: &fxkit_fxom::PropertyNode, position: Option<usize>| {
            property.is_complex() && position.is_none_or(|p| p <= property.values().len())
        };
        match &self.target {
            InsertTarget::Property { property, position } => {
                document.property(*property).is_some_and(|p| fits(p, *position))
            }
            InsertTarget::Owner { owner, name, position } => {
                if !document.object(*owner).is_some_and(|o| o.has_properties()) {
                    return false;
                }
                let Some(name) = Self::property_name(document, *owner, name.as_ref()) else {
                    return false;
                };
                match document.property_named(*owner, &name).and_then(|p| document.property(p)) {
                    Some(property) => fits(property, *position),
                    None => position.is_none_or(|p| p == 0),
                }
            }
            InsertTarget::Root => document.root().is_none(),
        }
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let object = cx
            .document_mut()
            .adopt(&self.fragment, CloneOptions::subtree().with_ids(self.ids))?;
        let mut batch = self.plan(cx.document_mut(), object)?;
        batch.do_execute(cx)?;
        self.inserted = Some(object);
        self.batch = Some(batch);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, true);
        self.batch = batch;
        result
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, false);
        self.batch = batch;
        result
    }
}

// ============================================================================
// Duplicate
// ============================================================================

/// Insert a copy of an object right after it, with renamed ids
#[derive(Debug)]
pub struct DuplicateObjectJob {
    object: ObjectId,
    duplicate: Option<ObjectId>,
    batch: Option<BatchJob>,
    description: String,
}

impl DuplicateObjectJob {
    pub fn new(document: &FxomDocument, object: ObjectId) -> Self {
        Self {
            object,
            duplicate: None,
            batch: None,
            description: format!("Duplicate {}", label(document, object)),
        }
    }

    pub fn duplicate(&self) -> Option<ObjectId> {
        self.duplicate
    }
}

impl Job for DuplicateObjectJob {
    fn kind(&self) -> JobKind {
        JobKind::DuplicateObject
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.parent_property(self.object).is_some()
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let document = cx.document_mut();
        let (Some(property), Some(index)) = (document.parent_property(self.object), document.index_in_parent(self.object))
        else {
            return Err(JobError::NotExecutable(self.description.clone()));
        };
        let copy = document.clone_object(self.object, CloneOptions::subtree().with_ids(IdPolicy::Rename))?;
        let mut batch = BatchJob::new(self.description.clone());
        batch.push(Box::new(AddPropertyValueJob::new(document, property, copy, Some(index + 1))));
        batch.do_execute(cx)?;
        self.duplicate = Some(copy);
        self.batch = Some(batch);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, true);
        self.batch = batch;
        result
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let mut batch = self.batch.take();
        let result = replay(&mut batch, cx, self, false);
        self.batch = batch;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionRegistry, JobManager};
    use fxkit_fxom::{structurally_equal_documents, LoadContext};

    fn parse(text: &str) -> FxomDocument {
        FxomDocument::parse(text, &LoadContext::default()).unwrap()
    }

    #[test]
    fn test_delete_last_value_removes_property() {
        let mut doc = parse(r#"<VBox><children><Label fx:id="a"/></children></VBox>"#);
        let before = doc.clone_document().unwrap();
        let a = doc.lookup("a").unwrap();
        let mut manager = JobManager::new();
        let job = DeleteObjectJob::new(&doc, a);
        manager.push(&mut doc, Box::new(job)).unwrap();
        assert_eq!(doc.to_text(), "<VBox/>");
        manager.undo(&mut doc).unwrap();
        assert!(structurally_equal_documents(&doc, &before));
        assert_eq!(doc.to_text(), before.to_text());
    }

    #[test]
    fn test_delete_moves_into_reference() {
        let mut doc = parse(
            r#"<VBox><children><Label fx:id="a" text="x"/><Button><graphic><fx:reference source="a"/></graphic></Button></children></VBox>"#,
        );
        let text = doc.to_text();
        let a = doc.lookup("a").unwrap();
        let mut manager = JobManager::new();
        let job = DeleteObjectJob::new(&doc, a);
        manager.push(&mut doc, Box::new(job)).unwrap();
        assert_eq!(
            doc.to_text(),
            r#"<VBox><children><Button><graphic><Label fx:id="a" text="x"/></graphic></Button></children></VBox>"#
        );
        assert_eq!(doc.lookup("a"), Some(a));
        manager.undo(&mut doc).unwrap();
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn test_expand_reference() {
        let mut doc = parse(
            r#"<VBox><children><Label fx:id="a" text="x"/><fx:copy source="a"/></children></VBox>"#,
        );
        let reference = doc.intrinsics().next().unwrap();
        let job = ExpandReferenceJob::new(&doc, reference);
        assert_eq!(job.description(), "Expand reference to a");
        let mut manager = JobManager::new();
        manager.push(&mut doc, Box::new(job)).unwrap();
        assert_eq!(doc.intrinsics().count(), 0);
        assert_eq!(doc.instances().count(), 3);
        assert_eq!(doc.index().len(), 1);
        manager.undo(&mut doc).unwrap();
        assert_eq!(doc.intrinsics().next(), Some(reference));
    }

    #[test]
    fn test_expand_missing_reference_not_executable() {
        let doc = parse(r#"<VBox><children><fx:reference source="myRef"/></children></VBox>"#);
        let reference = doc.intrinsics().next().unwrap();
        assert!(!ExpandReferenceJob::new(&doc, reference).is_executable(&doc));
    }

    #[test]
    fn test_insert_into_default_property() {
        let source = parse(r#"<Button fx:id="ok" text="OK"/>"#);
        let fragment = FxomFragment::extract(&source, source.root().unwrap()).unwrap();
        let mut doc = parse(r#"<VBox><Button fx:id="ok"/></VBox>"#);
        let root = doc.root().unwrap();

        let mut job = InsertFragmentJob::new(
            fragment,
            InsertTarget::Owner {
                owner: root,
                name: None,
                position: None,
            },
        );
        assert!(job.is_executable(&doc));
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(&mut doc, &mut extensions).execute(&mut job).unwrap();
        let inserted = job.inserted().unwrap();
        assert_eq!(doc.lookup("ok1"), Some(inserted));
        assert_eq!(doc.parent_object(inserted), Some(root));
    }

    #[test]
    fn test_insert_creates_missing_property() {
        let source = parse(r#"<Label text="tip"/>"#);
        let fragment = FxomFragment::extract(&source, source.root().unwrap()).unwrap();
        let mut doc = parse(r#"<Button/>"#);
        let root = doc.root().unwrap();
        let mut manager = JobManager::new();
        let job = InsertFragmentJob::new(
            fragment,
            InsertTarget::Owner {
                owner: root,
                name: Some(PropertyName::new("graphic")),
                position: None,
            },
        );
        manager.push(&mut doc, Box::new(job)).unwrap();
        let text = doc.to_text();
        assert!(text.contains("<graphic>"));
        assert!(text.contains(r#"<Label text="tip"/>"#));
        let graphic = doc.property_named(root, &PropertyName::new("graphic")).unwrap();
        assert_eq!(doc.property(graphic).unwrap().values().len(), 1);
        manager.undo(&mut doc).unwrap();
        assert_eq!(doc.to_text(), "<Button/>");
    }

    #[test]
    fn test_duplicate_renames_ids() {
        let mut doc = parse(r#"<VBox><Label fx:id="a"/><Button/></VBox>"#);
        let a = doc.lookup("a").unwrap();
        let mut job = DuplicateObjectJob::new(&doc, a);
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(&mut doc, &mut extensions).execute(&mut job).unwrap();
        let copy = job.duplicate().unwrap();
        assert_eq!(doc.index_in_parent(copy), Some(1));
        assert_eq!(doc.lookup("a1"), Some(copy));
    }
}
