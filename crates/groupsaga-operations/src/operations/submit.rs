use groupsaga_core::GroupId;
use tracing::info;

use crate::Result;
use crate::jobs::{Job, TaskId, TaskStatus};
use crate::traits::WorkQueue;

/// Front door: hands saga requests to the queue and returns at once.
pub struct Submitter<Q> {
    queue: Q,
}

impl<Q: WorkQueue> Submitter<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// # Errors
    ///
    /// Returns an error if the queue rejects the job.
    pub fn submit_create(&self, group_id: GroupId) -> Result<TaskId> {
        self.submit(Job::CreateGroup { group_id })
    }

    /// # Errors
    ///
    /// Returns an error if the queue rejects the job.
    pub fn submit_delete(&self, group_id: GroupId) -> Result<TaskId> {
        self.submit(Job::DeleteGroup { group_id })
    }

    #[must_use]
    pub fn task_status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.queue.status(id)
    }

    fn submit(&self, job: Job) -> Result<TaskId> {
        let task = job.name();
        let group_id = job.group_id().clone();
        let id = self.queue.enqueue(job)?;
        info!(%group_id, task, %id, "submitted");
        Ok(id)
    }
}
