use groupsaga_core::{NodeName, OperationKind};
use tracing::debug;

use crate::jobs::{Job, JobOutcome};
use crate::operations::{
    CreateGroupOperation, DeadLetterOperation, DeleteGroupOperation, RollbackOperation,
    SagaContext,
};
use crate::traits::{JobHandler, Ledger, NodeGateway, WorkQueue};
use crate::{Result, RetryPolicy};

/// Routes every queued job to its saga or compensation handler.
pub struct Orchestrator<G, L, Q> {
    context: SagaContext<G, L, Q>,
    nodes: Vec<NodeName>,
}

impl<G, L, Q> Orchestrator<G, L, Q>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    /// `nodes` is the fleet, in the order sagas visit it.
    pub fn new(gateway: G, ledger: L, queue: Q, nodes: Vec<NodeName>, retry: RetryPolicy) -> Self {
        Self {
            context: SagaContext::new(gateway, ledger, queue, retry),
            nodes,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeName] {
        &self.nodes
    }

    #[must_use]
    pub fn context(&self) -> &SagaContext<G, L, Q> {
        &self.context
    }
}

impl<G, L, Q> JobHandler for Orchestrator<G, L, Q>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    fn handle(&self, job: &Job) -> Result<JobOutcome> {
        debug!(%job, "handling job");
        match job {
            Job::CreateGroup { group_id } => {
                CreateGroupOperation::new(&self.context).execute(group_id, &self.nodes)
            }
            Job::DeleteGroup { group_id } => {
                DeleteGroupOperation::new(&self.context).execute(group_id, &self.nodes)
            }
            Job::RollbackCreateGroup {
                group_id,
                node,
                attempt,
            } => RollbackOperation::new(&self.context).execute(
                OperationKind::Create,
                group_id,
                node,
                *attempt,
            ),
            Job::RollbackDeleteGroup {
                group_id,
                node,
                attempt,
            } => RollbackOperation::new(&self.context).execute(
                OperationKind::Delete,
                group_id,
                node,
                *attempt,
            ),
            Job::ProcessDeadLetter {
                group_id,
                node,
                task,
            } => DeadLetterOperation::new(self.context.ledger()).execute(group_id, node, *task),
        }
    }
}
