//! Job trait and execution context

use fxkit_fxom::FxomDocument;

use crate::{ExtensionRegistry, Hook, JobResult};

/// Concrete job type; extensions are registered per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    AddProperty,
    RemoveProperty,
    AddPropertyValue,
    RemovePropertyValue,
    ModifyValue,
    ModifyFxId,
    ModifyController,
    ToggleFxRoot,
    SetDocumentRoot,
    ModifyScript,
    ModifyComment,
    RelocateObject,
    ReplaceObject,
    Batch,
    DeleteObject,
    ExpandReference,
    InsertFragment,
    DuplicateObject,
    /// Jobs defined outside this crate
    Custom(&'static str),
}

/// An invertible edit
///
/// `do_execute` runs once, then `do_undo` and `do_redo` alternate. A job
/// keeps only what it needs to invert itself (a removed position, a
/// previous value). The engine checks [`Job::is_executable`] before the
/// first execution and never calls `do_execute` when it is false.
pub trait Job: std::fmt::Debug {
    fn kind(&self) -> JobKind;

    /// History label
    fn description(&self) -> String;

    /// Whether the job applies to the current document state
    fn is_executable(&self, document: &FxomDocument) -> bool;

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()>;

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()>;

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.do_execute(cx)
    }
}

/// Mutable access to a document for the duration of one engine call
pub struct JobContext<'a> {
    document: &'a mut FxomDocument,
    extensions: &'a mut ExtensionRegistry,
}

impl<'a> JobContext<'a> {
    pub fn new(document: &'a mut FxomDocument, extensions: &'a mut ExtensionRegistry) -> Self {
        Self {
            document,
            extensions,
        }
    }

    #[inline]
    pub fn document(&self) -> &FxomDocument {
        self.document
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut FxomDocument {
        self.document
    }

    /// Run `do_execute` between the execute hooks
    pub fn execute(&mut self, job: &mut dyn Job) -> JobResult<()> {
        tracing::debug!("Execute: {}", job.description());
        self.extensions.fire(Hook::PreExecute, &*job, self.document);
        job.do_execute(self)?;
        self.extensions.fire(Hook::PostExecute, &*job, self.document);
        Ok(())
    }

    /// Run `do_undo` between the undo hooks
    pub fn undo(&mut self, job: &mut dyn Job) -> JobResult<()> {
        tracing::debug!("Undo: {}", job.description());
        self.extensions.fire(Hook::PreUndo, &*job, self.document);
        job.do_undo(self)?;
        self.extensions.fire(Hook::PostUndo, &*job, self.document);
        Ok(())
    }

    /// Run `do_redo` between the redo hooks
    pub fn redo(&mut self, job: &mut dyn Job) -> JobResult<()> {
        tracing::debug!("Redo: {}", job.description());
        self.extensions.fire(Hook::PreRedo, &*job, self.document);
        job.do_redo(self)?;
        self.extensions.fire(Hook::PostRedo, &*job, self.document);
        Ok(())
    }
}
