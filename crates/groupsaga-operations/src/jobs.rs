use std::fmt;

use groupsaga_core::{GroupId, NodeName, OperationKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work delivered by a [`WorkQueue`](crate::traits::WorkQueue).
///
/// Serialized as `{"task": "<name>", "kwargs": {...}}` so a job can travel
/// through any message broker unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", content = "kwargs", rename_all = "snake_case")]
pub enum Job {
    CreateGroup {
        group_id: GroupId,
    },
    RollbackCreateGroup {
        group_id: GroupId,
        node: NodeName,
        #[serde(default)]
        attempt: u32,
    },
    DeleteGroup {
        group_id: GroupId,
    },
    RollbackDeleteGroup {
        group_id: GroupId,
        node: NodeName,
        #[serde(default)]
        attempt: u32,
    },
    ProcessDeadLetter {
        group_id: GroupId,
        node: NodeName,
        task: OperationKind,
    },
}

impl Job {
    /// Compensation job for one node of a stopped saga.
    #[must_use]
    pub fn rollback(kind: OperationKind, group_id: GroupId, node: NodeName, attempt: u32) -> Self {
        match kind {
            OperationKind::Create => Self::RollbackCreateGroup {
                group_id,
                node,
                attempt,
            },
            OperationKind::Delete => Self::RollbackDeleteGroup {
                group_id,
                node,
                attempt,
            },
        }
    }

    /// Task name as it appears on the queue.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateGroup { .. } => "create_group",
            Self::RollbackCreateGroup { .. } => OperationKind::Create.task_name(),
            Self::DeleteGroup { .. } => "delete_group",
            Self::RollbackDeleteGroup { .. } => OperationKind::Delete.task_name(),
            Self::ProcessDeadLetter { .. } => "process_dead_letter",
        }
    }

    #[must_use]
    pub fn group_id(&self) -> &GroupId {
        match self {
            Self::CreateGroup { group_id }
            | Self::RollbackCreateGroup { group_id, .. }
            | Self::DeleteGroup { group_id }
            | Self::RollbackDeleteGroup { group_id, .. }
            | Self::ProcessDeadLetter { group_id, .. } => group_id,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RollbackCreateGroup { node, attempt, .. }
            | Self::RollbackDeleteGroup { node, attempt, .. } => write!(
                f,
                "{}({}, {node}, attempt {attempt})",
                self.name(),
                self.group_id()
            ),
            Self::ProcessDeadLetter { node, task, .. } => {
                write!(f, "{}({}, {node}, {task})", self.name(), self.group_id())
            }
            Self::CreateGroup { .. } | Self::DeleteGroup { .. } => {
                write!(f, "{}({})", self.name(), self.group_id())
            }
        }
    }
}

/// Identifier handed out when a job is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Started,
    Success,
    /// The job ran and scheduled a follow-up attempt of itself.
    Retry,
    Failure,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Started => "STARTED",
            Self::Success => "SUCCESS",
            Self::Retry => "RETRY",
            Self::Failure => "FAILURE",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub id: TaskId,
    pub job: Job,
    pub state: TaskState,
    pub outcome: Option<JobOutcome>,
    pub error: Option<String>,
}

/// What a handled job did. Remote failures are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The group now exists on every node.
    Created { nodes: Vec<NodeName> },
    /// The group was removed from every node.
    Deleted { nodes: Vec<NodeName> },
    /// A create found a lock or pending rollback and did nothing.
    Skipped { reason: String },
    /// A saga stopped at `failed_node`; `compensating` got rollback jobs.
    RollbackTriggered {
        failed_node: NodeName,
        reason: String,
        compensating: Vec<NodeName>,
    },
    Compensated { node: NodeName },
    RetryScheduled { attempt: u32 },
    DeadLettered { node: NodeName },
    DeadLetterCleared { node: NodeName },
    Noop { reason: String },
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { nodes } => write!(f, "created on {}", join(nodes)),
            Self::Deleted { nodes } => write!(f, "deleted on {}", join(nodes)),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::RollbackTriggered {
                failed_node,
                reason,
                compensating,
            } => {
                write!(f, "failed on {failed_node} ({reason})")?;
                if compensating.is_empty() {
                    f.write_str(", nothing to roll back")
                } else {
                    write!(f, ", rolling back {}", join(compensating))
                }
            }
            Self::Compensated { node } => write!(f, "compensated {node}"),
            Self::RetryScheduled { attempt } => write!(f, "retry {attempt} scheduled"),
            Self::DeadLettered { node } => write!(f, "gave up on {node}, dead-lettered"),
            Self::DeadLetterCleared { node } => write!(f, "removed {node} from ledger"),
            Self::Noop { reason } => write!(f, "nothing to do: {reason}"),
        }
    }
}

fn join(nodes: &[NodeName]) -> String {
    nodes
        .iter()
        .map(NodeName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> GroupId {
        GroupId::new(id).expect("valid group id")
    }

    fn node(name: &str) -> NodeName {
        NodeName::new(name).expect("valid node name")
    }

    #[test]
    fn rollback_job_matches_kind() {
        let job = Job::rollback(OperationKind::Delete, group("g1"), node("node1"), 2);

        assert_eq!(job.name(), "rollback_delete_group");
        assert_eq!(job.to_string(), "rollback_delete_group(g1, node1, attempt 2)");
    }

    #[test]
    fn job_serializes_as_task_and_kwargs() -> anyhow::Result<()> {
        let job = Job::ProcessDeadLetter {
            group_id: group("g1"),
            node: node("node0"),
            task: OperationKind::Create,
        };

        let json = serde_json::to_value(&job)?;

        assert_eq!(
            json,
            serde_json::json!({
                "task": "process_dead_letter",
                "kwargs": {"group_id": "g1", "node": "node0", "task": "rollback_create_group"}
            })
        );
        Ok(())
    }

    #[test]
    fn rollback_job_without_attempt_starts_at_zero() -> anyhow::Result<()> {
        let job: Job = serde_json::from_str(
            r#"{"task":"rollback_create_group","kwargs":{"group_id":"g1","node":"node0"}}"#,
        )?;

        assert_eq!(
            job,
            Job::rollback(OperationKind::Create, group("g1"), node("node0"), 0)
        );
        Ok(())
    }

    #[test]
    fn rollback_outcome_mentions_compensated_nodes() {
        let outcome = JobOutcome::RollbackTriggered {
            failed_node: node("node2"),
            reason: "status 500".to_string(),
            compensating: vec![node("node0"), node("node1")],
        };

        assert_eq!(
            outcome.to_string(),
            "failed on node2 (status 500), rolling back node0, node1"
        );
    }
}
