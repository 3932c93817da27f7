//! Job history
//!
//! Linear undo/redo history of one document. Pushing after an undo discards
//! the redo tail. Each executed state gets a fresh revision number; undo and
//! redo restore the revision of the state they return to, so the dirty flag
//! follows the history.

use fxkit_fxom::FxomDocument;

use crate::{ExtensionRegistry, Job, JobContext, JobError, JobResult};

/// Default history depth
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

#[derive(Debug)]
struct Entry {
    job: Box<dyn Job>,
    revision_before: u64,
    revision_after: u64,
}

#[derive(Debug)]
pub struct JobManager {
    history: Vec<Entry>,
    /// Number of executed entries; entries past the cursor can be redone
    cursor: usize,
    /// Maximum number of entries, 0 for unbounded
    limit: usize,
    last_revision: u64,
    extensions: ExtensionRegistry,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl JobManager {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            history: Vec::new(),
            cursor: 0,
            limit,
            last_revision: 0,
            extensions: ExtensionRegistry::new(),
        }
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Execute a job and append it to the history
    ///
    /// A job that is not executable is rejected before anything changes.
    pub fn push(&mut self, document: &mut FxomDocument, mut job: Box<dyn Job>) -> JobResult<()> {
        if !job.is_executable(document) {
            return Err(JobError::NotExecutable(job.description()));
        }
        let revision_before = document.revision();
        JobContext::new(document, &mut self.extensions).execute(job.as_mut())?;

        self.last_revision = self.last_revision.max(document.revision()) + 1;
        let revision_after = self.last_revision;
        document.set_revision(revision_after);
        document.sync_glue();

        self.history.truncate(self.cursor);
        self.history.push(Entry {
            job,
            revision_before,
            revision_after,
        });
        self.cursor += 1;
        self.enforce_limit();
        Ok(())
    }

    pub fn undo(&mut self, document: &mut FxomDocument) -> JobResult<()> {
        if self.cursor == 0 {
            return Err(JobError::NothingToUndo);
        }
        let entry = &mut self.history[self.cursor - 1];
        JobContext::new(document, &mut self.extensions).undo(entry.job.as_mut())?;
        document.set_revision(entry.revision_before);
        document.sync_glue();
        self.cursor -= 1;
        Ok(())
    }

    pub fn redo(&mut self, document: &mut FxomDocument) -> JobResult<()> {
        let Some(entry) = self.history.get_mut(self.cursor) else {
            return Err(JobError::NothingToRedo);
        };
        JobContext::new(document, &mut self.extensions).redo(entry.job.as_mut())?;
        document.set_revision(entry.revision_after);
        document.sync_glue();
        self.cursor += 1;
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.history.len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.history.get(i))
            .map(|e| e.job.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.get(self.cursor).map(|e| e.job.description())
    }

    /// Descriptions of all entries, oldest first
    pub fn descriptions(&self) -> Vec<String> {
        self.history.iter().map(|e| e.job.description()).collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop the whole history; the document is left as it is
    pub fn clear(&mut self) {
        self.history.clear();
        self.cursor = 0;
    }

    fn enforce_limit(&mut self) {
        if self.limit == 0 || self.history.len() <= self.limit {
            return;
        }
        let excess = self.history.len() - self.limit;
        // Entries past the cursor are dropped first
        let redo_tail = self.history.len() - self.cursor;
        let from_tail = excess.min(redo_tail);
        self.history.truncate(self.history.len() - from_tail);
        let from_head = excess - from_tail;
        self.history.drain(..from_head);
        self.cursor -= from_head;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModifyScriptJob, ModifyValueJob};
    use fxkit_fxom::LoadContext;
    use fxkit_metadata::PropertyName;

    fn parse(text: &str) -> FxomDocument {
        FxomDocument::parse(text, &LoadContext::default()).unwrap()
    }

    fn push_text(manager: &mut JobManager, doc: &mut FxomDocument, value: &str) -> JobResult<()> {
        let root = doc.root().unwrap();
        let job = ModifyValueJob::new(doc, root, PropertyName::new("text"), Some(value.into()));
        manager.push(doc, Box::new(job))
    }

    #[test]
    fn test_push_undo_redo() {
        let mut doc = parse(r#"<Label text="a"/>"#);
        let mut manager = JobManager::new();
        push_text(&mut manager, &mut doc, "b").unwrap();
        assert!(doc.is_dirty());
        assert_eq!(manager.undo_description().as_deref(), Some("Set text of Label"));

        manager.undo(&mut doc).unwrap();
        assert!(!doc.is_dirty());
        assert_eq!(doc.glue().root.as_ref().unwrap().attribute("text"), Some("a"));
        assert!(manager.can_redo());

        manager.redo(&mut doc).unwrap();
        assert_eq!(doc.to_text(), r#"<Label text="b"/>"#);
        assert!(matches!(manager.redo(&mut doc), Err(JobError::NothingToRedo)));
    }

    #[test]
    fn test_not_executable_leaves_history() {
        let mut doc = parse(r#"<Label text="a"/>"#);
        let mut manager = JobManager::new();
        let stamp = doc.modification_stamp();
        let result = push_text(&mut manager, &mut doc, "a");
        assert!(matches!(result, Err(JobError::NotExecutable(_))));
        assert!(manager.is_empty());
        assert_eq!(doc.modification_stamp(), stamp);
    }

    #[test]
    fn test_push_after_undo_discards_redo_tail() {
        let mut doc = parse(r#"<Label text="a"/>"#);
        let mut manager = JobManager::new();
        push_text(&mut manager, &mut doc, "b").unwrap();
        push_text(&mut manager, &mut doc, "c").unwrap();
        manager.undo(&mut doc).unwrap();
        push_text(&mut manager, &mut doc, "d").unwrap();
        assert_eq!(manager.len(), 2);
        assert!(!manager.can_redo());
        assert_eq!(doc.to_text(), r#"<Label text="d"/>"#);
    }

    #[test]
    fn test_revisions_unique_per_state() {
        let mut doc = parse(r#"<Label text="a"/>"#);
        let mut manager = JobManager::new();
        push_text(&mut manager, &mut doc, "b").unwrap();
        let first = doc.revision();
        manager.undo(&mut doc).unwrap();
        push_text(&mut manager, &mut doc, "c").unwrap();
        assert_ne!(doc.revision(), first);
        doc.mark_saved();
        manager.undo(&mut doc).unwrap();
        assert!(doc.is_dirty());
        manager.redo(&mut doc).unwrap();
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_history_limit() {
        let mut doc = parse(r#"<Label text="0"/>"#);
        let mut manager = JobManager::with_limit(2);
        for value in ["1", "2", "3"] {
            push_text(&mut manager, &mut doc, value).unwrap();
        }
        assert_eq!(manager.descriptions().len(), 2);
        manager.undo(&mut doc).unwrap();
        manager.undo(&mut doc).unwrap();
        assert!(!manager.can_undo());
        assert_eq!(doc.to_text(), r#"<Label text="1"/>"#);
    }

    #[test]
    fn test_script_body_scenario() {
        let original = "<VBox>\n    <fx:script>function a() {}</fx:script>\n</VBox>";
        let mut doc = parse(original);
        let script = doc.scripts().next().unwrap();
        let mut manager = JobManager::new();
        manager
            .push(&mut doc, Box::new(ModifyScriptJob::new(script, "function b() { return 2; }")))
            .unwrap();
        assert_eq!(
            doc.to_text(),
            "<VBox>\n    <fx:script>function b() { return 2; }</fx:script>\n</VBox>"
        );
        manager.undo(&mut doc).unwrap();
        assert_eq!(doc.to_text(), original);
    }
}
