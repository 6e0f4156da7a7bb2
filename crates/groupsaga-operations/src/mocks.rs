use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use groupsaga_core::{GroupId, NodeName};
use groupsaga_node::NodeResponse;

use crate::jobs::{Job, TaskId, TaskStatus};
use crate::traits::{NodeGateway, WorkQueue};
use crate::{OperationError, Result};

/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
pub fn group(id: &str) -> GroupId {
    GroupId::new(id).expect("valid group id")
}

/// # Panics
///
/// Panics if `name` is blank.
#[must_use]
pub fn node(name: &str) -> NodeName {
    NodeName::new(name).expect("valid node name")
}

#[must_use]
pub fn nodes(names: &[&str]) -> Vec<NodeName> {
    names.iter().map(|name| node(name)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCall {
    Create,
    Delete,
    Get,
}

/// Gateway answering from per-node scripts.
///
/// Unscripted calls succeed: create 201, delete 200, get 404.
pub struct MockNodeGateway {
    scripted: Mutex<HashMap<(String, NodeCall), VecDeque<u16>>>,
    calls: Mutex<Vec<(NodeCall, String)>>,
}

impl MockNodeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue `status` as the next answer of `call` on `node`.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn respond(self, node: &str, call: NodeCall, status: u16) -> Self {
        self.scripted
            .lock()
            .expect("lock poisoned")
            .entry((node.to_string(), call))
            .or_default()
            .push_back(status);
        self
    }

    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<(NodeCall, String)> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Nodes that received `call`, in call order.
    #[must_use]
    pub fn nodes_called(&self, call: NodeCall) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(made, _)| *made == call)
            .map(|(_, node)| node)
            .collect()
    }

    fn answer(&self, call: NodeCall, node: &NodeName) -> NodeResponse {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((call, node.to_string()));

        let scripted = self
            .scripted
            .lock()
            .expect("lock poisoned")
            .get_mut(&(node.to_string(), call))
            .and_then(VecDeque::pop_front);

        let status = scripted.unwrap_or(match call {
            NodeCall::Create => 201,
            NodeCall::Delete => 200,
            NodeCall::Get => 404,
        });
        NodeResponse::new(status, format!("status {status}"))
    }
}

impl Default for MockNodeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeGateway for MockNodeGateway {
    fn create_group(&self, node: &NodeName, _group_id: &GroupId) -> NodeResponse {
        self.answer(NodeCall::Create, node)
    }

    fn delete_group(&self, node: &NodeName, _group_id: &GroupId) -> NodeResponse {
        self.answer(NodeCall::Delete, node)
    }

    fn get_group(&self, node: &NodeName, _group_id: &GroupId) -> NodeResponse {
        self.answer(NodeCall::Get, node)
    }
}

/// Queue that records jobs instead of running them.
pub struct RecordingQueue {
    enqueued: Mutex<Vec<(Job, Duration)>>,
    closed: bool,
}

impl RecordingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enqueued: Mutex::new(Vec::new()),
            closed: false,
        }
    }

    /// A queue that rejects every job.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            enqueued: Mutex::new(Vec::new()),
            closed: true,
        }
    }

    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn jobs(&self) -> Vec<Job> {
        self.enqueued
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|(job, _)| job.clone())
            .collect()
    }

    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.enqueued
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|(_, delay)| *delay)
            .collect()
    }
}

impl Default for RecordingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue for RecordingQueue {
    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<TaskId> {
        if self.closed {
            return Err(OperationError::QueueClosed);
        }
        self.enqueued
            .lock()
            .expect("lock poisoned")
            .push((job, delay));
        Ok(TaskId::new())
    }

    fn status(&self, _id: &TaskId) -> Option<TaskStatus> {
        None
    }
}
