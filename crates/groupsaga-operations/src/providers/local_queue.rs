use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, error, warn};

use crate::jobs::{Job, JobOutcome, TaskId, TaskState, TaskStatus};
use crate::traits::{JobHandler, WorkQueue};
use crate::{OperationError, Result};

/// Due time for delays too large to represent.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

struct Scheduled {
    due: Instant,
    seq: u64,
    id: TaskId,
    job: Job,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Default)]
struct State {
    scheduled: BinaryHeap<Reverse<Scheduled>>,
    statuses: IndexMap<TaskId, TaskStatus>,
    running: usize,
    next_seq: u64,
    closed: bool,
}

impl State {
    fn is_idle(&self) -> bool {
        self.scheduled.is_empty() && self.running == 0
    }

    fn set_state(&mut self, id: &TaskId, state: TaskState) -> Option<&mut TaskStatus> {
        let status = self.statuses.get_mut(id)?;
        status.state = state;
        Some(status)
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    ready: Condvar,
    idle: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process work queue with delayed delivery, run by a pool of threads.
///
/// Jobs are delivered in due-time order; jobs due at the same instant keep
/// submission order. Clones share the same queue.
#[derive(Clone, Default)]
pub struct LocalWorkQueue {
    shared: Arc<Shared>,
}

impl LocalWorkQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `workers` threads that feed jobs to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::WorkerSpawn`] if a thread cannot be
    /// spawned. The queue is closed in that case.
    pub fn start(&self, workers: usize, handler: Arc<dyn JobHandler>) -> Result<WorkerPool> {
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let shared = Arc::clone(&self.shared);
            let handler = Arc::clone(&handler);
            let spawned = thread::Builder::new()
                .name(format!("groupsaga-worker-{index}"))
                .spawn(move || work(&shared, handler.as_ref()));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    self.close();
                    return Err(OperationError::WorkerSpawn(err));
                }
            }
        }
        debug!(workers, "started queue workers");
        Ok(WorkerPool {
            queue: self.clone(),
            handles,
        })
    }

    /// Blocks until no job is scheduled or running, or the queue is closed.
    pub fn wait_idle(&self) {
        let mut state = self.shared.lock();
        while !state.is_idle() && !state.closed {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Every task seen so far, in submission order.
    #[must_use]
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.shared.lock().statuses.values().cloned().collect()
    }

    /// Stops accepting jobs and wakes every worker. Scheduled jobs that have
    /// not started are dropped.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        state.closed = true;
        let dropped = state.scheduled.len();
        state.scheduled.clear();
        drop(state);
        if dropped > 0 {
            warn!(dropped, "queue closed with scheduled jobs");
        }
        self.shared.ready.notify_all();
        self.shared.idle.notify_all();
    }
}

impl WorkQueue for LocalWorkQueue {
    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<TaskId> {
        let mut state = self.shared.lock();
        if state.closed {
            return Err(OperationError::QueueClosed);
        }

        let id = TaskId::new();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.statuses.insert(
            id,
            TaskStatus {
                id,
                job: job.clone(),
                state: TaskState::Pending,
                outcome: None,
                error: None,
            },
        );
        debug!(%job, %id, ?delay, "enqueued");
        state.scheduled.push(Reverse(Scheduled {
            due: due_after(delay),
            seq,
            id,
            job,
        }));
        drop(state);

        self.shared.ready.notify_one();
        Ok(id)
    }

    fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.shared.lock().statuses.get(id).cloned()
    }
}

/// Worker threads started by [`LocalWorkQueue::start`].
pub struct WorkerPool {
    queue: LocalWorkQueue,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Closes the queue and joins every worker once its current job ends.
    pub fn shutdown(self) {
        self.queue.close();
        for handle in self.handles {
            if handle.join().is_err() {
                error!("queue worker panicked");
            }
        }
    }
}

fn due_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

fn work(shared: &Shared, handler: &dyn JobHandler) {
    while let Some((id, job)) = next_job(shared) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&job)))
            .unwrap_or_else(|_| Err(OperationError::JobPanicked));

        let mut state = shared.lock();
        state.running -= 1;
        let (task_state, outcome, failure) = match result {
            Ok(outcome @ JobOutcome::RetryScheduled { .. }) => {
                (TaskState::Retry, Some(outcome), None)
            }
            Ok(outcome) => (TaskState::Success, Some(outcome), None),
            Err(err) => {
                error!(%job, %id, error = %err, "job failed");
                (TaskState::Failure, None, Some(err.to_string()))
            }
        };
        if let Some(status) = state.set_state(&id, task_state) {
            status.outcome = outcome;
            status.error = failure;
        }
        if state.is_idle() {
            shared.idle.notify_all();
        }
    }
}

/// Waits for the next due job; `None` once the queue is closed.
fn next_job(shared: &Shared) -> Option<(TaskId, Job)> {
    let mut state = shared.lock();
    loop {
        if state.closed {
            return None;
        }

        let now = Instant::now();
        match state.scheduled.peek().map(|Reverse(next)| next.due) {
            Some(due) if due <= now => {
                let Reverse(next) = state.scheduled.pop()?;
                state.running += 1;
                state.set_state(&next.id, TaskState::Started);
                return Some((next.id, next.job));
            }
            Some(due) => {
                state = shared
                    .ready
                    .wait_timeout(state, due - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            None => {
                state = shared
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
}
