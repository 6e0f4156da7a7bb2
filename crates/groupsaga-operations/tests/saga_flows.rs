//! End-to-end saga runs through the threaded work queue and in-memory ledger.
//!
//! Nodes are simulated by a scripted gateway; every job the sagas schedule
//! is executed by real worker threads until the queue drains.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use groupsaga_core::{GroupId, LedgerKey, NodeName, OperationKind};
use groupsaga_node::NodeResponse;
use groupsaga_operations::jobs::{Job, JobOutcome, TaskState, TaskStatus};
use groupsaga_operations::operations::Submitter;
use groupsaga_operations::providers::{LocalWorkQueue, MemoryLedger};
use groupsaga_operations::traits::{JobHandler, Ledger, NodeGateway};
use groupsaga_operations::{Orchestrator, RetryPolicy};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Call {
    Create,
    Delete,
    Get,
}

/// Simulated fleet: every node keeps the set of groups it holds.
#[derive(Default)]
struct Fleet {
    groups: Mutex<HashMap<String, HashSet<String>>>,
    failures: Mutex<HashMap<(String, Call), VecDeque<u16>>>,
    calls: Mutex<Vec<(Call, String)>>,
}

impl Fleet {
    fn fail(&self, node: &str, call: Call, status: u16, times: usize) {
        let mut failures = self.failures.lock().expect("lock poisoned");
        let queue = failures.entry((node.to_string(), call)).or_default();
        queue.extend(std::iter::repeat_n(status, times));
    }

    fn holds(&self, node: &str, group: &str) -> bool {
        self.groups
            .lock()
            .expect("lock poisoned")
            .get(node)
            .is_some_and(|groups| groups.contains(group))
    }

    fn calls_to(&self, call: Call) -> Vec<String> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|(made, _)| *made == call)
            .map(|(_, node)| node.clone())
            .collect()
    }

    fn respond(&self, call: Call, node: &NodeName, group: &GroupId) -> NodeResponse {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((call, node.to_string()));

        let scripted = self
            .failures
            .lock()
            .expect("lock poisoned")
            .get_mut(&(node.to_string(), call))
            .and_then(VecDeque::pop_front);
        if let Some(status) = scripted {
            return NodeResponse::new(status, "scripted failure");
        }

        let mut groups = self.groups.lock().expect("lock poisoned");
        let held = groups.entry(node.to_string()).or_default();
        match call {
            Call::Create if held.insert(group.to_string()) => NodeResponse::new(201, "created"),
            Call::Create => NodeResponse::new(400, "exists"),
            Call::Delete if held.remove(group.as_str()) => NodeResponse::new(200, "deleted"),
            Call::Delete => NodeResponse::new(404, "not found"),
            Call::Get if held.contains(group.as_str()) => NodeResponse::new(200, "found"),
            Call::Get => NodeResponse::new(404, "not found"),
        }
    }
}

impl NodeGateway for Fleet {
    fn create_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        self.respond(Call::Create, node, group_id)
    }

    fn delete_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        self.respond(Call::Delete, node, group_id)
    }

    fn get_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        self.respond(Call::Get, node, group_id)
    }
}

struct System {
    fleet: Arc<Fleet>,
    ledger: Arc<MemoryLedger>,
}

impl System {
    fn new(fleet: Fleet) -> Self {
        Self {
            fleet: Arc::new(fleet),
            ledger: Arc::new(MemoryLedger::new()),
        }
    }

    /// Submits `job` to a fresh queue and runs it, plus everything it
    /// schedules, to completion.
    fn run(&self, node_names: &[&str], job: Job) -> anyhow::Result<Vec<TaskStatus>> {
        let queue = LocalWorkQueue::new();
        let nodes = node_names
            .iter()
            .map(|name| NodeName::new(*name))
            .collect::<Result<Vec<_>, _>>()?;
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.fleet),
            Arc::clone(&self.ledger),
            queue.clone(),
            nodes,
            RetryPolicy::new(3, Duration::ZERO),
        );
        let handler: Arc<dyn JobHandler> = Arc::new(orchestrator);

        let pool = queue.start(4, handler)?;
        let submitter = Submitter::new(queue.clone());
        match job {
            Job::CreateGroup { group_id } => submitter.submit_create(group_id)?,
            Job::DeleteGroup { group_id } => submitter.submit_delete(group_id)?,
            other => anyhow::bail!("unexpected job {other}"),
        };
        queue.wait_idle();
        pool.shutdown();
        Ok(queue.statuses())
    }

    fn record_exists(&self, kind: OperationKind, group: &str) -> anyhow::Result<bool> {
        Ok(self
            .ledger
            .exists(&LedgerKey::new(kind, &GroupId::new(group)?))?)
    }
}

fn outcomes(statuses: Vec<TaskStatus>) -> Vec<JobOutcome> {
    statuses
        .into_iter()
        .filter_map(|status| status.outcome)
        .collect()
}

fn create(group: &str) -> anyhow::Result<Job> {
    Ok(Job::CreateGroup {
        group_id: GroupId::new(group)?,
    })
}

fn delete(group: &str) -> anyhow::Result<Job> {
    Ok(Job::DeleteGroup {
        group_id: GroupId::new(group)?,
    })
}

#[test]
fn create_on_healthy_fleet_leaves_no_ledger_trace() -> anyhow::Result<()> {
    let system = System::new(Fleet::default());

    let statuses = system.run(&["node0", "node1", "node2"], create("g1")?)?;

    for node in ["node0", "node1", "node2"] {
        assert!(system.fleet.holds(node, "g1"));
    }
    assert!(!system.record_exists(OperationKind::Create, "g1")?);
    assert!(
        statuses
            .iter()
            .all(|status| status.state == TaskState::Success)
    );
    Ok(())
}

#[test]
fn failed_create_is_fully_undone() -> anyhow::Result<()> {
    let fleet = Fleet::default();
    fleet.fail("node3", Call::Create, 503, 1);
    let system = System::new(fleet);

    system.run(&["node0", "node1", "node2", "node3", "node4"], create("g1")?)?;

    for node in ["node0", "node1", "node2", "node3", "node4"] {
        assert!(!system.fleet.holds(node, "g1"), "{node} still holds g1");
    }
    let mut undone = system.fleet.calls_to(Call::Delete);
    undone.sort();
    assert_eq!(undone, vec!["node0", "node1", "node2"]);
    assert!(!system.fleet.calls_to(Call::Create).contains(&"node4".to_string()));
    assert!(!system.record_exists(OperationKind::Create, "g1")?);
    Ok(())
}

#[test]
fn failed_delete_restores_deleted_nodes() -> anyhow::Result<()> {
    let system = System::new(Fleet::default());
    system.run(&["node0", "node1", "node2"], create("g1")?)?;
    system.fleet.fail("node2", Call::Delete, 500, 1);

    system.run(&["node0", "node1", "node2"], delete("g1")?)?;

    for node in ["node0", "node1", "node2"] {
        assert!(system.fleet.holds(node, "g1"), "{node} lost g1");
    }
    assert!(!system.record_exists(OperationKind::Delete, "g1")?);
    Ok(())
}

#[test]
fn stubborn_node_is_dead_lettered_after_retries() -> anyhow::Result<()> {
    let fleet = Fleet::default();
    fleet.fail("node2", Call::Create, 500, 1);
    fleet.fail("node1", Call::Delete, 500, 4);
    let system = System::new(fleet);

    let statuses = system.run(&["node0", "node1", "node2"], create("g1")?)?;

    assert!(!system.fleet.holds("node0", "g1"));
    assert!(system.fleet.holds("node1", "g1"));
    let node1_deletes = system
        .fleet
        .calls_to(Call::Delete)
        .into_iter()
        .filter(|node| node == "node1")
        .count();
    assert_eq!(node1_deletes, 4);
    assert!(!system.record_exists(OperationKind::Create, "g1")?);
    assert!(outcomes(statuses).iter().any(
        |outcome| matches!(outcome, JobOutcome::DeadLettered { node } if node.as_str() == "node1")
    ));
    Ok(())
}

#[test]
fn concurrent_compensations_do_not_lose_updates() -> anyhow::Result<()> {
    let names: Vec<String> = (0..12).map(|i| format!("node{i:02}")).collect();
    let mut fleet_nodes: Vec<&str> = names.iter().map(String::as_str).collect();
    fleet_nodes.push("broken");
    let fleet = Fleet::default();
    fleet.fail("broken", Call::Create, 500, 1);
    let system = System::new(fleet);

    let statuses = system.run(&fleet_nodes, create("g1")?)?;

    let compensated = outcomes(statuses)
        .iter()
        .filter(|outcome| matches!(outcome, JobOutcome::Compensated { .. }))
        .count();
    assert_eq!(compensated, names.len());
    assert!(!system.record_exists(OperationKind::Create, "g1")?);
    Ok(())
}
