//! Extension hooks
//!
//! Extensions are registered for one [`JobKind`] and called before and after
//! each execute/undo/redo of jobs of that kind. No order is guaranteed
//! between extensions of the same kind. An extension that edits the
//! document in a `post_*` hook must revert the edit in the matching inverse
//! hook, or the undo of the job no longer restores the previous state.

use std::collections::HashMap;

use fxkit_fxom::FxomDocument;

use crate::{Job, JobKind};

/// Hook points around a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    PreExecute,
    PostExecute,
    PreUndo,
    PostUndo,
    PreRedo,
    PostRedo,
}

/// Callbacks around the jobs of one kind
pub trait JobExtension {
    fn pre_execute(&mut self, _job: &dyn Job, _document: &mut FxomDocument) {}
    fn post_execute(&mut self, _job: &dyn Job, _document: &mut FxomDocument) {}
    fn pre_undo(&mut self, _job: &dyn Job, _document: &mut FxomDocument) {}
    fn post_undo(&mut self, _job: &dyn Job, _document: &mut FxomDocument) {}
    fn pre_redo(&mut self, _job: &dyn Job, _document: &mut FxomDocument) {}
    fn post_redo(&mut self, _job: &dyn Job, _document: &mut FxomDocument) {}
}

/// Extensions keyed by job kind
#[derive(Default)]
pub struct ExtensionRegistry {
    by_kind: HashMap<JobKind, Vec<Box<dyn JobExtension>>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: JobKind, extension: Box<dyn JobExtension>) {
        self.by_kind.entry(kind).or_default().push(extension);
    }

    /// Number of extensions registered for a kind
    pub fn count(&self, kind: JobKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.by_kind.clear();
    }

    pub(crate) fn fire(&mut self, hook: Hook, job: &dyn Job, document: &mut FxomDocument) {
        let Some(extensions) = self.by_kind.get_mut(&job.kind()) else {
            return;
        };
        tracing::trace!("{hook:?} for {:?}: {} extensions", job.kind(), extensions.len());
        for extension in extensions.iter_mut() {
            match hook {
                Hook::PreExecute => extension.pre_execute(job, document),
                Hook::PostExecute => extension.post_execute(job, document),
                Hook::PreUndo => extension.pre_undo(job, document),
                Hook::PostUndo => extension.post_undo(job, document),
                Hook::PreRedo => extension.pre_redo(job, document),
                Hook::PostRedo => extension.post_redo(job, document),
            }
        }
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.by_kind.iter().map(|(k, v)| (format!("{k:?}"), v.len())).collect();
        kinds.sort();
        f.debug_struct("ExtensionRegistry").field("by_kind", &kinds).finish()
    }
}
