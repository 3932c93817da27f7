//! fxkit Job Engine
//!
//! Invertible edits over an [`FxomDocument`](fxkit_fxom::FxomDocument).
//! Every job runs through a [`JobContext`], which fires the extension hooks
//! registered for the job's [`JobKind`] around the job's own
//! execute/undo/redo. [`JobManager`] keeps the linear history.

mod batch;
mod composite;
mod extension;
mod job;
mod manager;
mod modify;
mod structure;

pub use batch::BatchJob;
pub use composite::{DeleteObjectJob, DuplicateObjectJob, ExpandReferenceJob, InsertFragmentJob, InsertTarget};
pub use extension::{ExtensionRegistry, Hook, JobExtension};
pub use job::{Job, JobContext, JobKind};
pub use manager::{JobManager, DEFAULT_HISTORY_LIMIT};
pub use modify::{
    ModifyCommentJob, ModifyControllerJob, ModifyFxIdJob, ModifyScriptJob, ModifyValueJob,
    ToggleFxRootJob,
};
pub use structure::{
    AddPropertyJob, AddPropertyValueJob, RelocateObjectJob, RemovePropertyJob,
    RemovePropertyValueJob, ReplaceObjectJob, SetDocumentRootJob,
};

use fxkit_fxom::FxomError;

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;

/// Job engine errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Edit rejected by the document; nothing was changed
    #[error(transparent)]
    Document(#[from] FxomError),

    /// `is_executable` was false; nothing was changed
    #[error("Job is not executable: {0}")]
    NotExecutable(String),

    /// A batch could not be rolled back after a failed step
    #[error("Batch partially applied: {0}")]
    AtomicityViolation(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    /// undo/redo called in the wrong state
    #[error("Job {job} cannot {action} in its current state")]
    InvalidState { job: String, action: &'static str },
}

impl JobError {
    pub(crate) fn state(job: &dyn Job, action: &'static str) -> Self {
        Self::InvalidState {
            job: job.description(),
            action,
        }
    }
}
