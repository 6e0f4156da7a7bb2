use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::jobs::{Job, JobOutcome, TaskId, TaskStatus};

/// Asynchronous job dispatch.
pub trait WorkQueue: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the queue no longer accepts jobs.
    fn enqueue(&self, job: Job) -> Result<TaskId> {
        self.enqueue_after(job, Duration::ZERO)
    }

    /// Deliver `job` no earlier than `delay` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue no longer accepts jobs.
    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<TaskId>;

    fn status(&self, id: &TaskId) -> Option<TaskStatus>;
}

impl<T: WorkQueue + ?Sized> WorkQueue for Arc<T> {
    fn enqueue(&self, job: Job) -> Result<TaskId> {
        (**self).enqueue(job)
    }

    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<TaskId> {
        (**self).enqueue_after(job, delay)
    }

    fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        (**self).status(id)
    }
}

/// Executes jobs delivered by a queue.
pub trait JobHandler: Send + Sync {
    /// # Errors
    ///
    /// Returns an error for infrastructure failures; remote node outcomes
    /// are reported through [`JobOutcome`].
    fn handle(&self, job: &Job) -> Result<JobOutcome>;
}
