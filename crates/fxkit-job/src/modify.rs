//! Value jobs
//!
//! Jobs that change a value in place and remember the previous one.

use fxkit_fxom::{Comment, FxomDocument, ObjectId, ObjectKind, PropertyId, TextForm};
use fxkit_metadata::PropertyName;

use crate::{Job, JobContext, JobError, JobKind, JobResult};

fn label(document: &FxomDocument, object: ObjectId) -> String {
    document
        .object(object)
        .map(|o| o.label())
        .unwrap_or_else(|| object.to_string())
}

// ============================================================================
// Text properties
// ============================================================================

/// What a `ModifyValueJob` did on its first run
#[derive(Debug, Clone)]
enum Applied {
    Replaced { property: PropertyId, previous: String },
    Added { property: PropertyId },
    Removed { property: PropertyId, position: usize },
}

/// Set or clear a text property
///
/// Setting a missing property adds it in the given form; clearing removes it.
#[derive(Debug)]
pub struct ModifyValueJob {
    owner: ObjectId,
    name: PropertyName,
    value: Option<String>,
    form: TextForm,
    applied: Option<Applied>,
    description: String,
}

impl ModifyValueJob {
    pub fn new(document: &FxomDocument, owner: ObjectId, name: PropertyName, value: Option<String>) -> Self {
        let description = match &value {
            Some(_) => format!("Set {} of {}", name, label(document, owner)),
            None => format!("Clear {} of {}", name, label(document, owner)),
        };
        Self {
            owner,
            name,
            value,
            form: TextForm::Attribute,
            applied: None,
            description,
        }
    }

    /// Form used when the property has to be created
    pub fn with_form(mut self, form: TextForm) -> Self {
        self.form = form;
        self
    }
}

impl Job for ModifyValueJob {
    fn kind(&self) -> JobKind {
        JobKind::ModifyValue
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        if !document.object(self.owner).is_some_and(|o| o.has_properties()) {
            return false;
        }
        let current = document
            .property_named(self.owner, &self.name)
            .and_then(|p| document.property(p));
        match (current, &self.value) {
            (Some(property), Some(value)) => property.text().is_some_and(|t| t != value),
            (Some(property), None) => !property.is_complex(),
            (None, Some(_)) => true,
            (None, None) => false,
        }
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let document = cx.document_mut();
        let existing = document.property_named(self.owner, &self.name);
        let applied = match (existing, self.value.clone()) {
            (Some(property), Some(value)) => Applied::Replaced {
                property,
                previous: document.set_text_value(property, value)?,
            },
            (Some(property), None) => {
                let (_, position) = document.remove_property(property)?;
                Applied::Removed { property, position }
            }
            (None, Some(value)) => {
                let property = document.create_text_property(self.name.clone(), value, self.form);
                document.add_property(self.owner, property, None)?;
                Applied::Added { property }
            }
            (None, None) => return Err(JobError::NotExecutable(self.description.clone())),
        };
        self.applied = Some(applied);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let document = cx.document_mut();
        match &self.applied {
            Some(Applied::Replaced { property, previous }) => {
                document.set_text_value(*property, previous.clone())?;
            }
            Some(Applied::Added { property }) => {
                document.remove_property(*property)?;
            }
            Some(Applied::Removed { property, position }) => {
                document.add_property(self.owner, *property, Some(*position))?;
            }
            None => return Err(JobError::state(self, "undo")),
        }
        Ok(())
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let document = cx.document_mut();
        match &self.applied {
            Some(Applied::Replaced { property, .. }) => {
                let value = self.value.clone().unwrap_or_default();
                document.set_text_value(*property, value)?;
            }
            Some(Applied::Added { property }) => {
                document.add_property(self.owner, *property, None)?;
            }
            Some(Applied::Removed { property, .. }) => {
                document.remove_property(*property)?;
            }
            None => return Err(JobError::state(self, "redo")),
        }
        Ok(())
    }
}

// ============================================================================
// Object attributes
// ============================================================================

/// Set or clear an fx:id
#[derive(Debug)]
pub struct ModifyFxIdJob {
    object: ObjectId,
    fx_id: Option<String>,
    previous: Option<String>,
    description: String,
}

impl ModifyFxIdJob {
    pub fn new(document: &FxomDocument, object: ObjectId, fx_id: Option<String>) -> Self {
        let description = match &fx_id {
            Some(id) => format!("Set fx:id of {} to {id}", label(document, object)),
            None => format!("Clear fx:id of {}", label(document, object)),
        };
        Self {
            object,
            fx_id,
            previous: None,
            description,
        }
    }
}

impl Job for ModifyFxIdJob {
    fn kind(&self) -> JobKind {
        JobKind::ModifyFxId
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        let Some(object) = document.object(self.object) else {
            return false;
        };
        let free = match self.fx_id.as_deref() {
            Some("") => false,
            Some(id) => document.lookup(id).is_none_or(|holder| holder == self.object),
            None => true,
        };
        !object.is_comment() && free && object.fx_id() != self.fx_id.as_deref()
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.previous = cx.document_mut().set_fx_id(self.object, self.fx_id.clone())?;
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        cx.document_mut().set_fx_id(self.object, self.previous.clone())?;
        Ok(())
    }
}

/// Set or clear `fx:controller` on the root instance
#[derive(Debug)]
pub struct ModifyControllerJob {
    object: ObjectId,
    controller: Option<String>,
    previous: Option<String>,
}

impl ModifyControllerJob {
    pub fn new(object: ObjectId, controller: Option<String>) -> Self {
        Self {
            object,
            controller,
            previous: None,
        }
    }
}

impl Job for ModifyControllerJob {
    fn kind(&self) -> JobKind {
        JobKind::ModifyController
    }

    fn description(&self) -> String {
        match &self.controller {
            Some(controller) => format!("Set controller {controller}"),
            None => "Clear controller".to_string(),
        }
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.root() == Some(self.object)
            && document
                .object(self.object)
                .and_then(|o| o.as_instance())
                .is_some_and(|i| i.controller != self.controller)
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.previous = cx.document_mut().set_controller(self.object, self.controller.clone())?;
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        cx.document_mut().set_controller(self.object, self.previous.clone())?;
        Ok(())
    }
}

/// Switch the root between `<Type>` and `<fx:root type="Type">`
#[derive(Debug)]
pub struct ToggleFxRootJob {
    object: ObjectId,
}

impl ToggleFxRootJob {
    pub fn new(object: ObjectId) -> Self {
        Self { object }
    }

    fn toggle(&self, document: &mut FxomDocument) -> JobResult<()> {
        let current = document
            .object(self.object)
            .and_then(|o| o.as_instance())
            .map(|i| i.fx_root)
            .ok_or_else(|| JobError::NotExecutable(self.description()))?;
        document.set_fx_root(self.object, !current)?;
        Ok(())
    }
}

impl Job for ToggleFxRootJob {
    fn kind(&self) -> JobKind {
        JobKind::ToggleFxRoot
    }

    fn description(&self) -> String {
        "Toggle fx:root".to_string()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document.root() == Some(self.object)
            && document.object(self.object).is_some_and(|o| o.is_instance())
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.toggle(cx.document_mut())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.toggle(cx.document_mut())
    }
}

// ============================================================================
// Leaf content
// ============================================================================

/// Replace the inline body of an `fx:script`
#[derive(Debug)]
pub struct ModifyScriptJob {
    object: ObjectId,
    body: String,
    previous: Option<String>,
}

impl ModifyScriptJob {
    pub fn new(object: ObjectId, body: impl Into<String>) -> Self {
        Self {
            object,
            body: body.into(),
            previous: None,
        }
    }
}

impl Job for ModifyScriptJob {
    fn kind(&self) -> JobKind {
        JobKind::ModifyScript
    }

    fn description(&self) -> String {
        "Edit script".to_string()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        matches!(
            document.object(self.object).map(|o| o.kind()),
            Some(ObjectKind::Script(script)) if script.body != self.body
        )
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.previous = Some(cx.document_mut().set_script_body(self.object, self.body.clone())?);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let previous = self.previous.clone().ok_or_else(|| JobError::state(self, "undo"))?;
        cx.document_mut().set_script_body(self.object, previous)?;
        Ok(())
    }
}

/// Replace the text of a comment object
#[derive(Debug)]
pub struct ModifyCommentJob {
    object: ObjectId,
    text: String,
    previous: Option<String>,
}

impl ModifyCommentJob {
    pub fn new(object: ObjectId, text: impl Into<String>) -> Self {
        Self {
            object,
            text: text.into(),
            previous: None,
        }
    }
}

impl Job for ModifyCommentJob {
    fn kind(&self) -> JobKind {
        JobKind::ModifyComment
    }

    fn description(&self) -> String {
        "Edit comment".to_string()
    }

    fn is_executable(&self, document: &FxomDocument) -> bool {
        document
            .object(self.object)
            .and_then(|o| o.as_comment())
            .is_some_and(|c| c.text != self.text && Comment::accepts(&self.text))
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.previous = Some(cx.document_mut().set_comment_text(self.object, self.text.clone())?);
        Ok(())
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let previous = self.previous.clone().ok_or_else(|| JobError::state(self, "undo"))?;
        cx.document_mut().set_comment_text(self.object, previous)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtensionRegistry;
    use fxkit_fxom::LoadContext;

    fn parse(text: &str) -> FxomDocument {
        FxomDocument::parse(text, &LoadContext::default()).unwrap()
    }

    fn execute(document: &mut FxomDocument, job: &mut dyn Job) {
        assert!(job.is_executable(document), "{} not executable", job.description());
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(document, &mut extensions).execute(job).unwrap();
    }

    fn undo(document: &mut FxomDocument, job: &mut dyn Job) {
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(document, &mut extensions).undo(job).unwrap();
    }

    fn redo(document: &mut FxomDocument, job: &mut dyn Job) {
        let mut extensions = ExtensionRegistry::new();
        JobContext::new(document, &mut extensions).redo(job).unwrap();
    }

    #[test]
    fn test_modify_value_replace_add_clear() {
        let mut doc = parse(r#"<Button text="Old"/>"#);
        let root = doc.root().unwrap();

        let mut replace = ModifyValueJob::new(&doc, root, PropertyName::new("text"), Some("New".into()));
        execute(&mut doc, &mut replace);
        assert_eq!(doc.to_text(), r#"<Button text="New"/>"#);

        let mut add = ModifyValueJob::new(&doc, root, PropertyName::new("disable"), Some("true".into()));
        execute(&mut doc, &mut add);
        assert_eq!(doc.to_text(), r#"<Button text="New" disable="true"/>"#);

        let mut clear = ModifyValueJob::new(&doc, root, PropertyName::new("text"), None);
        assert_eq!(clear.description(), "Clear text of Button");
        execute(&mut doc, &mut clear);
        assert_eq!(doc.to_text(), r#"<Button disable="true"/>"#);

        undo(&mut doc, &mut clear);
        undo(&mut doc, &mut add);
        undo(&mut doc, &mut replace);
        assert_eq!(doc.to_text(), r#"<Button text="Old"/>"#);

        redo(&mut doc, &mut replace);
        redo(&mut doc, &mut add);
        redo(&mut doc, &mut clear);
        assert_eq!(doc.to_text(), r#"<Button disable="true"/>"#);
    }

    #[test]
    fn test_unchanged_value_not_executable() {
        let doc = parse(r#"<Button text="Same"/>"#);
        let root = doc.root().unwrap();
        let job = ModifyValueJob::new(&doc, root, PropertyName::new("text"), Some("Same".into()));
        assert!(!job.is_executable(&doc));
        let job = ModifyValueJob::new(&doc, root, PropertyName::new("missing"), None);
        assert!(!job.is_executable(&doc));
    }

    #[test]
    fn test_fx_id_collision_not_executable() {
        let doc = parse(r#"<VBox><Label fx:id="a"/><Label fx:id="b"/></VBox>"#);
        let b = doc.lookup("b").unwrap();
        assert!(!ModifyFxIdJob::new(&doc, b, Some("a".into())).is_executable(&doc));
        assert!(!ModifyFxIdJob::new(&doc, b, Some(String::new())).is_executable(&doc));
        assert!(ModifyFxIdJob::new(&doc, b, Some("c".into())).is_executable(&doc));
    }

    #[test]
    fn test_controller_and_fx_root() {
        let mut doc = parse(r#"<VBox xmlns:fx="http://javafx.com/fxml/1"/>"#);
        let root = doc.root().unwrap();
        let mut controller = ModifyControllerJob::new(root, Some("app.Main".into()));
        execute(&mut doc, &mut controller);
        let mut toggle = ToggleFxRootJob::new(root);
        execute(&mut doc, &mut toggle);
        let instance = doc.object(root).unwrap().as_instance().unwrap();
        assert!(instance.fx_root);
        assert_eq!(instance.controller.as_deref(), Some("app.Main"));

        undo(&mut doc, &mut toggle);
        undo(&mut doc, &mut controller);
        assert_eq!(doc.to_text(), r#"<VBox xmlns:fx="http://javafx.com/fxml/1"/>"#);
    }

    #[test]
    fn test_modify_comment() {
        let mut doc = parse("<VBox><children><!-- old --></children></VBox>");
        let comment = doc.comments().next().unwrap();
        let mut job = ModifyCommentJob::new(comment, " new ");
        execute(&mut doc, &mut job);
        assert_eq!(doc.to_text(), "<VBox><children><!-- new --></children></VBox>");
        undo(&mut doc, &mut job);
        assert_eq!(doc.to_text(), "<VBox><children><!-- old --></children></VBox>");
    }

    #[test]
    fn test_ill_formed_comment_not_executable() {
        let doc = parse("<VBox><children><!-- old --></children></VBox>");
        let comment = doc.comments().next().unwrap();
        assert!(!ModifyCommentJob::new(comment, "a -- b").is_executable(&doc));
        assert!(!ModifyCommentJob::new(comment, " trailing-").is_executable(&doc));
        assert!(ModifyCommentJob::new(comment, " a - b ").is_executable(&doc));
    }

    #[test]
    fn test_edited_comment_reparses() {
        let mut doc = parse("<VBox><children><!-- old --></children></VBox>");
        let comment = doc.comments().next().unwrap();
        let mut job = ModifyCommentJob::new(comment, " a - b ");
        execute(&mut doc, &mut job);
        let reparsed = parse(&doc.to_text());
        let comment = reparsed.comments().next().unwrap();
        assert_eq!(reparsed.object(comment).unwrap().as_comment().unwrap().text, " a - b ");
    }
}
