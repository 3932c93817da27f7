//! Editor Document
//!
//! One open document: the semantic model, its undo history, the cached
//! error report and the current selection. All edits go through
//! [`EditorDocument::push_job`], so the history sees every change.

use std::path::{Path, PathBuf};

use fxkit_fxom::{
    ErrorEntry, ErrorReport, FxomDocument, LoadContext, ObjectId, ReferenceSite, SaveOptions,
    SaveReport,
};
use fxkit_job::{BatchJob, DeleteObjectJob, ExtensionRegistry, Job, JobManager};

use crate::{EditorConfig, EditorError, EditorResult};

#[derive(Debug)]
pub struct EditorDocument {
    document: FxomDocument,
    history: JobManager,
    report: ErrorReport,
    selection: Vec<ObjectId>,
    save_options: SaveOptions,
    path: Option<PathBuf>,
}

impl EditorDocument {
    /// Wrap a loaded document with the history and save settings of `config`
    pub fn new(document: FxomDocument, config: &EditorConfig) -> EditorResult<Self> {
        Ok(Self {
            document,
            history: JobManager::with_limit(config.history_limit),
            report: ErrorReport::new(),
            selection: Vec::new(),
            save_options: config.save_options()?,
            path: None,
        })
    }

    /// Parse markup into a new editing session
    pub fn parse(text: &str, context: &LoadContext, config: &EditorConfig) -> EditorResult<Self> {
        let document = FxomDocument::parse(text, context)?;
        Self::new(document, config)
    }

    pub fn document(&self) -> &FxomDocument {
        &self.document
    }

    pub fn history(&self) -> &JobManager {
        &self.history
    }

    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        self.history.extensions_mut()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    pub fn is_dirty(&self) -> bool {
        self.document.is_dirty()
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Execute a job and record it in the history
    pub fn push_job(&mut self, job: Box<dyn Job>) -> EditorResult<()> {
        self.history.push(&mut self.document, job)?;
        self.prune_selection();
        Ok(())
    }

    pub fn undo(&mut self) -> EditorResult<()> {
        self.history.undo(&mut self.document)?;
        self.prune_selection();
        Ok(())
    }

    pub fn redo(&mut self) -> EditorResult<()> {
        self.history.redo(&mut self.document)?;
        self.prune_selection();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    /// Replace the selection; objects not in the tree are ignored
    pub fn select(&mut self, objects: impl IntoIterator<Item = ObjectId>) {
        self.selection.clear();
        for object in objects {
            if self.document.is_attached(object) && !self.selection.contains(&object) {
                self.selection.push(object);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete the selected objects as one undoable edit
    ///
    /// Objects inside another selected object go with their ancestor.
    pub fn delete_selection(&mut self) -> EditorResult<()> {
        let document = &self.document;
        let targets: Vec<ObjectId> = self
            .selection
            .iter()
            .copied()
            .filter(|&object| {
                !self
                    .selection
                    .iter()
                    .any(|&other| other != object && document.is_ancestor_or_self(other, object))
            })
            .collect();

        let job: Box<dyn Job> = match targets.as_slice() {
            [] => return Err(EditorError::EmptySelection),
            [object] => Box::new(DeleteObjectJob::new(document, *object)),
            objects => {
                let jobs = objects
                    .iter()
                    .map(|&object| Box::new(DeleteObjectJob::new(document, object)) as Box<dyn Job>)
                    .collect();
                Box::new(BatchJob::with_jobs(format!("Delete {} objects", objects.len()), jobs))
            }
        };
        self.push_job(job)?;
        self.selection.clear();
        Ok(())
    }

    fn prune_selection(&mut self) {
        let document = &self.document;
        self.selection.retain(|&object| document.is_attached(object));
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Error report, recomputed when the document or its resources changed
    pub fn query_errors(&mut self) -> &[ErrorEntry] {
        self.report.query(&self.document)
    }

    pub fn scripts(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.document.scripts()
    }

    pub fn comments(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.document.comments()
    }

    pub fn references(&self) -> impl Iterator<Item = ReferenceSite> + '_ {
        self.document.references()
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    pub fn save_options(&self) -> &SaveOptions {
        &self.save_options
    }

    pub fn set_save_options(&mut self, options: SaveOptions) {
        self.save_options = options;
    }

    /// Render the document with the current save settings
    pub fn save(&self) -> SaveReport {
        let report = self.document.save(&self.save_options);
        for omission in &report.omissions {
            tracing::warn!("Left out of saved document: {omission}");
        }
        report
    }

    /// Write to `path` and mark the document saved
    pub fn save_to(&mut self, path: impl AsRef<Path>) -> EditorResult<SaveReport> {
        let path = path.as_ref();
        let report = self.save();
        std::fs::write(path, &report.text).map_err(|e| EditorError::io(path, e))?;
        self.document.mark_saved();
        self.path = Some(path.to_path_buf());
        tracing::info!("Saved {}", path.display());
        Ok(report)
    }

    /// Write back to the file the document was opened from
    pub fn write(&mut self) -> EditorResult<SaveReport> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| EditorError::InvalidPath(PathBuf::new()))?;
        self.save_to(path)
    }
}
