//! Batch jobs
//!
//! A batch runs its sub-jobs in order and undoes them in reverse order. It is
//! all-or-nothing: when a step turns out not to be executable, or fails, the
//! steps already run are undone before the error is returned. A rollback
//! that fails leaves the document partially edited and is reported as an
//! atomicity violation.

use fxkit_fxom::FxomDocument;

use crate::{Job, JobContext, JobError, JobKind, JobResult};

#[derive(Debug)]
pub struct BatchJob {
    description: String,
    jobs: Vec<Box<dyn Job>>,
}

impl BatchJob {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            jobs: Vec::new(),
        }
    }

    pub fn with_jobs(description: impl Into<String>, jobs: Vec<Box<dyn Job>>) -> Self {
        Self {
            description: description.into(),
            jobs,
        }
    }

    pub fn push(&mut self, job: Box<dyn Job>) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[Box<dyn Job>] {
        &self.jobs
    }

    /// Run every step forward, rolling back on the first failure
    fn forward(&mut self, cx: &mut JobContext<'_>, redo: bool) -> JobResult<()> {
        for step in 0..self.jobs.len() {
            let outcome = {
                let job = self.jobs[step].as_mut();
                if redo {
                    cx.redo(job)
                } else if job.is_executable(cx.document()) {
                    cx.execute(job)
                } else {
                    Err(JobError::NotExecutable(job.description()))
                }
            };
            if let Err(err) = outcome {
                tracing::debug!("Batch '{}' failed at step {step}: {err}", self.description);
                self.rollback(cx, step)?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undo the first `count` steps in reverse order
    fn rollback(&mut self, cx: &mut JobContext<'_>, count: usize) -> JobResult<()> {
        for job in self.jobs[..count].iter_mut().rev() {
            if let Err(err) = cx.undo(job.as_mut()) {
                tracing::error!(
                    "Batch '{}' left partially applied: undo of '{}' failed: {err}",
                    self.description,
                    job.description()
                );
                return Err(JobError::AtomicityViolation(format!(
                    "{}: {err}",
                    self.description
                )));
            }
        }
        Ok(())
    }
}

impl Job for BatchJob {
    fn kind(&self) -> JobKind {
        JobKind::Batch
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    /// Every step must apply to the current state
    fn is_executable(&self, document: &FxomDocument) -> bool {
        !self.jobs.is_empty() && self.jobs.iter().all(|job| job.is_executable(document))
    }

    fn do_execute(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.forward(cx, false)
    }

    fn do_undo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        let count = self.jobs.len();
        for step in (0..count).rev() {
            if let Err(err) = cx.undo(self.jobs[step].as_mut()) {
                // Put back the steps already undone
                for job in self.jobs[step + 1..].iter_mut() {
                    if cx.redo(job.as_mut()).is_err() {
                        tracing::error!("Batch '{}' left partially undone", self.description);
                        return Err(JobError::AtomicityViolation(self.description.clone()));
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn do_redo(&mut self, cx: &mut JobContext<'_>) -> JobResult<()> {
        self.forward(cx, true)
    }
}
