//! Background tasks
//!
//! Long scans run on smol's blocking thread pool. A task reports progress
//! through shared counters and polls a cancellation flag; its result is a
//! plain value handed back to the caller, who applies it on the editing
//! thread. A task cancelled at any point yields [`TaskOutcome::Cancelled`]
//! and its partial result is dropped.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Task ID counter
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> u64 {
    NEXT_TASK_ID.fetch_add(1, Ordering::SeqCst)
}

type Observer = Arc<dyn Fn(&TaskProgress) + Send + Sync>;

/// Progress and cancellation state shared between a task and its handle
pub struct TaskProgress {
    name: String,
    done: AtomicUsize,
    total: AtomicUsize,
    cancelled: AtomicBool,
    observer: Option<Observer>,
}

impl TaskProgress {
    fn new(name: &str, observer: Option<Observer>) -> Self {
        Self {
            name: name.to_string(),
            done: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            observer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of work units, once known
    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.notify();
    }

    /// Record finished work units
    pub fn advance(&self, units: usize) {
        let done = self.done.fetch_add(units, Ordering::Relaxed) + units;
        tracing::trace!("{}: {}/{}", self.name, done, self.total());
        self.notify();
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed share in `0.0..=1.0`, 0 while the total is unknown
    pub fn fraction(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            total => (self.done() as f32 / total as f32).min(1.0),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer(self);
        }
    }
}

impl fmt::Debug for TaskProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskProgress")
            .field("name", &self.name)
            .field("done", &self.done())
            .field("total", &self.total())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Completed(T),
    Cancelled,
    Failed(String),
}

impl<T> TaskOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A submitted task
///
/// Dropping the handle discards the result.
pub struct TaskHandle<T> {
    id: u64,
    progress: Arc<TaskProgress>,
    task: smol::Task<TaskOutcome<T>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn progress(&self) -> &TaskProgress {
        &self.progress
    }

    /// Ask the task to stop; its outcome becomes `Cancelled`
    pub fn cancel(&self) {
        tracing::debug!("Cancelling task {} ({})", self.id, self.progress.name());
        self.progress.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Block until the task ends
    pub fn wait(self) -> TaskOutcome<T> {
        smol::block_on(self.task)
    }

    pub async fn join(self) -> TaskOutcome<T> {
        self.task.await
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("progress", &self.progress)
            .finish()
    }
}

/// Runs work off the editing thread
#[derive(Default, Clone)]
pub struct TaskRunner {
    observer: Option<Observer>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `observer` on every progress update of tasks submitted afterwards
    pub fn with_observer(observer: impl Fn(&TaskProgress) + Send + Sync + 'static) -> Self {
        Self {
            observer: Some(Arc::new(observer)),
        }
    }

    /// Start `work` on the blocking pool
    pub fn submit<T, F>(&self, name: &str, work: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&TaskProgress) -> TaskOutcome<T> + Send + 'static,
    {
        let id = next_task_id();
        let progress = Arc::new(TaskProgress::new(name, self.observer.clone()));
        let shared = Arc::clone(&progress);
        tracing::debug!("Starting task {id} ({name})");

        let task = smol::unblock(move || {
            if shared.is_cancelled() {
                return TaskOutcome::Cancelled;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&shared)))
                .unwrap_or_else(|_| TaskOutcome::Failed(format!("task {} panicked", shared.name())));
            if shared.is_cancelled() {
                tracing::debug!("Task {id} cancelled");
                return TaskOutcome::Cancelled;
            }
            outcome
        });

        TaskHandle { id, progress, task }
    }
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_task_completes_with_progress() {
        let runner = TaskRunner::new();
        let handle = runner.submit("sum", |progress| {
            progress.set_total(4);
            let mut sum = 0;
            for i in 1..=4 {
                sum += i;
                progress.advance(1);
            }
            TaskOutcome::Completed(sum)
        });
        let id = handle.id();
        assert!(id > 0);
        assert_eq!(handle.wait(), TaskOutcome::Completed(10));
    }

    #[test]
    fn test_cancel_running_task() {
        let runner = TaskRunner::new();
        let handle = runner.submit("spin", |progress| {
            while !progress.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            TaskOutcome::Completed(())
        });
        handle.cancel();
        assert!(handle.wait().is_cancelled());
    }

    #[test]
    fn test_panicking_task_fails() {
        let runner = TaskRunner::new();
        let handle = runner.submit("boom", |_| -> TaskOutcome<()> { panic!("boom") });
        assert!(matches!(handle.wait(), TaskOutcome::Failed(_)));
    }

    #[test]
    fn test_observer_sees_updates() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let runner = TaskRunner::with_observer(move |p| {
            counter.store(p.done(), Ordering::SeqCst);
        });
        let handle = runner.submit("count", |progress| {
            progress.set_total(3);
            progress.advance(3);
            TaskOutcome::Completed(())
        });
        handle.wait();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fraction() {
        let progress = TaskProgress::new("f", None);
        assert_eq!(progress.fraction(), 0.0);
        progress.set_total(4);
        progress.advance(1);
        assert_eq!(progress.fraction(), 0.25);
    }
}
