use std::marker::PhantomData;

use groupsaga_core::{GroupId, NodeName, OperationKind};
use groupsaga_saga::{FleetOutcome, FleetSaga, FleetStep, StepVerdict};
use tracing::{debug, info, warn};

use super::context::SagaContext;
use super::ledger::trigger_rollback;
use crate::jobs::JobOutcome;
use crate::traits::{Ledger, NodeGateway, WorkQueue};
use crate::{OperationError, Result};

/// Deletes the group from one node.
pub struct DeleteGroupStep<G, L, Q> {
    group_id: GroupId,
    _marker: PhantomData<(G, L, Q)>,
}

impl<G, L, Q> DeleteGroupStep<G, L, Q> {
    #[must_use]
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            _marker: PhantomData,
        }
    }
}

impl<G, L, Q> FleetStep for DeleteGroupStep<G, L, Q>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    type Node = NodeName;
    type Context = SagaContext<G, L, Q>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "delete_group"
    }

    fn execute(&self, ctx: &Self::Context, node: &NodeName) -> Result<StepVerdict> {
        let response = ctx.gateway().delete_group(node, &self.group_id);

        match response.status() {
            status if status > 400 => Ok(StepVerdict::Rejected {
                reason: format!("delete returned {status}: {}", response.body()),
            }),
            400 => {
                warn!(
                    group_id = %self.group_id,
                    %node,
                    body = response.body(),
                    "node answered delete with 400, treating group as deleted"
                );
                Ok(StepVerdict::Applied)
            }
            _ => Ok(StepVerdict::Applied),
        }
    }

    fn compensate(&self, ctx: &Self::Context, processed: &[NodeName]) -> Result<()> {
        trigger_rollback(ctx, OperationKind::Delete, &self.group_id, processed)
    }

    fn compensation_description(&self) -> String {
        format!("recreate group '{}' on processed nodes", self.group_id)
    }
}

/// The delete saga. Unlike create, it takes no lock.
pub struct DeleteGroupOperation<'a, G, L, Q> {
    context: &'a SagaContext<G, L, Q>,
}

impl<'a, G, L, Q> DeleteGroupOperation<'a, G, L, Q>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    pub fn new(context: &'a SagaContext<G, L, Q>) -> Self {
        Self { context }
    }

    /// # Errors
    ///
    /// Returns an error if scheduling the rollback fails.
    pub fn execute(&self, group_id: &GroupId, nodes: &[NodeName]) -> Result<JobOutcome> {
        let saga = FleetSaga::new(DeleteGroupStep::new(group_id.clone()));
        let (result, audit_log) = saga.execute_with_audit(self.context, nodes);
        debug!(%group_id, "delete saga finished:\n{}", audit_log.summary());

        match result? {
            FleetOutcome::Completed { processed } => {
                info!(%group_id, nodes = processed.len(), "group deleted from all nodes");
                Ok(JobOutcome::Deleted { nodes: processed })
            }
            FleetOutcome::Compensating {
                failed_node,
                reason,
                processed,
            } => {
                warn!(%group_id, node = %failed_node, %reason, "delete failed, rolling back");
                Ok(JobOutcome::RollbackTriggered {
                    failed_node,
                    reason,
                    compensating: processed,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use groupsaga_core::{LedgerEntry, LedgerKey, RollbackRecord};

    use super::*;
    use crate::RetryPolicy;
    use crate::jobs::Job;
    use crate::mocks::{MockNodeGateway, NodeCall, RecordingQueue, group, node, nodes};
    use crate::providers::MemoryLedger;

    fn run(
        gateway: MockNodeGateway,
        names: &[&str],
    ) -> anyhow::Result<(JobOutcome, Arc<MockNodeGateway>, Arc<MemoryLedger>, Arc<RecordingQueue>)>
    {
        let gateway = Arc::new(gateway);
        let ledger = Arc::new(MemoryLedger::new());
        let queue = Arc::new(RecordingQueue::new());
        let context = SagaContext::new(
            Arc::clone(&gateway),
            Arc::clone(&ledger),
            Arc::clone(&queue),
            RetryPolicy::default(),
        );

        let outcome = DeleteGroupOperation::new(&context).execute(&group("g1"), &nodes(names))?;
        Ok((outcome, gateway, ledger, queue))
    }

    #[test]
    fn all_nodes_deleted_without_ledger_writes() -> anyhow::Result<()> {
        let (outcome, _, ledger, queue) = run(MockNodeGateway::new(), &["node0", "node1"])?;

        assert_eq!(
            outcome,
            JobOutcome::Deleted {
                nodes: nodes(&["node0", "node1"])
            }
        );
        assert!(!ledger.exists(&LedgerKey::new(OperationKind::Delete, &group("g1")))?);
        assert!(queue.jobs().is_empty());
        Ok(())
    }

    #[test]
    fn unreachable_node_rolls_back_earlier_deletes() -> anyhow::Result<()> {
        let gateway = MockNodeGateway::new().respond("node1", NodeCall::Delete, 500);

        let (outcome, gateway, ledger, queue) = run(gateway, &["node0", "node1", "node2"])?;

        assert!(matches!(
            &outcome,
            JobOutcome::RollbackTriggered { failed_node, compensating, .. }
                if *failed_node == node("node1") && *compensating == nodes(&["node0"])
        ));
        assert_eq!(
            gateway.nodes_called(NodeCall::Delete),
            vec!["node0", "node1"]
        );
        let raw = ledger
            .get(&LedgerKey::new(OperationKind::Delete, &group("g1")))?
            .expect("record written");
        assert_eq!(
            LedgerEntry::decode(&raw)?,
            LedgerEntry::Rollback(RollbackRecord::new(group("g1"), &nodes(&["node0"])))
        );
        assert_eq!(
            queue.jobs(),
            vec![Job::rollback(
                OperationKind::Delete,
                group("g1"),
                node("node0"),
                0
            )]
        );
        Ok(())
    }

    #[test]
    fn not_found_stops_the_saga() -> anyhow::Result<()> {
        let gateway = MockNodeGateway::new().respond("node0", NodeCall::Delete, 404);

        let (outcome, gateway, _, queue) = run(gateway, &["node0", "node1"])?;

        assert!(matches!(outcome, JobOutcome::RollbackTriggered { .. }));
        assert_eq!(gateway.nodes_called(NodeCall::Delete), vec!["node0"]);
        assert!(queue.jobs().is_empty());
        Ok(())
    }

    #[test]
    fn bad_request_is_treated_as_deleted() -> anyhow::Result<()> {
        let gateway = MockNodeGateway::new().respond("node0", NodeCall::Delete, 400);

        let (outcome, _, _, _) = run(gateway, &["node0", "node1"])?;

        assert_eq!(
            outcome,
            JobOutcome::Deleted {
                nodes: nodes(&["node0", "node1"])
            }
        );
        Ok(())
    }

    #[test]
    fn other_success_codes_count_as_deleted() -> anyhow::Result<()> {
        let gateway = MockNodeGateway::new().respond("node1", NodeCall::Delete, 204);

        let (outcome, _, _, _) = run(gateway, &["node0", "node1"])?;

        assert!(matches!(outcome, JobOutcome::Deleted { .. }));
        Ok(())
    }
}
