use std::marker::PhantomData;

use groupsaga_core::{GroupId, LedgerEntry, LedgerKey, NodeName, OperationKind};
use groupsaga_saga::{FleetOutcome, FleetSaga, FleetStep, StepVerdict};
use tracing::{debug, info, warn};

use super::context::SagaContext;
use super::ledger::trigger_rollback;
use crate::jobs::JobOutcome;
use crate::traits::{Expiry, Ledger, NodeGateway, WorkQueue};
use crate::{OperationError, Result};

/// Creates the group on one node.
///
/// A 400 is ambiguous (duplicate or bad request) and is resolved by asking
/// the node whether the group exists.
pub struct CreateGroupStep<G, L, Q> {
    group_id: GroupId,
    _marker: PhantomData<(G, L, Q)>,
}

impl<G, L, Q> CreateGroupStep<G, L, Q> {
    #[must_use]
    pub fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            _marker: PhantomData,
        }
    }
}

impl<G, L, Q> FleetStep for CreateGroupStep<G, L, Q>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    type Node = NodeName;
    type Context = SagaContext<G, L, Q>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "create_group"
    }

    fn execute(&self, ctx: &Self::Context, node: &NodeName) -> Result<StepVerdict> {
        let response = ctx.gateway().create_group(node, &self.group_id);
        let status = response.status();

        if status == 400 {
            let existing = ctx.gateway().get_group(node, &self.group_id);
            if existing.status() == 200 {
                info!(group_id = %self.group_id, %node, "group already exists on node");
                return Ok(StepVerdict::AlreadyApplied);
            }
            return Ok(StepVerdict::Rejected {
                reason: format!(
                    "create returned 400 and lookup returned {}",
                    existing.status()
                ),
            });
        }

        if response.is_server_error() {
            return Ok(StepVerdict::Rejected {
                reason: format!("create returned {status}: {}", response.body()),
            });
        }

        Ok(StepVerdict::Applied)
    }

    fn compensate(&self, ctx: &Self::Context, processed: &[NodeName]) -> Result<()> {
        trigger_rollback(ctx, OperationKind::Create, &self.group_id, processed)
    }

    fn compensation_description(&self) -> String {
        format!("delete group '{}' from processed nodes", self.group_id)
    }
}

/// The create saga: lock, create on every node, release or roll back.
pub struct CreateGroupOperation<'a, G, L, Q> {
    context: &'a SagaContext<G, L, Q>,
}

impl<'a, G, L, Q> CreateGroupOperation<'a, G, L, Q>
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
    /// Returns an error if the ledger or queue fails. Node failures are
    /// reported as [`JobOutcome::RollbackTriggered`].
    pub fn execute(&self, group_id: &GroupId, nodes: &[NodeName]) -> Result<JobOutcome> {
        let key = LedgerKey::new(OperationKind::Create, group_id);

        let acquired =
            self.context
                .ledger()
                .set_if_absent(&key, LedgerEntry::LOCK_SENTINEL, Expiry::Never)?;
        if !acquired {
            warn!(%group_id, %key, "create or rollback already in progress, skipping");
            return Ok(JobOutcome::Skipped {
                reason: format!("ledger key '{key}' is present"),
            });
        }

        let saga = FleetSaga::new(CreateGroupStep::new(group_id.clone()));
        let (result, audit_log) = saga.execute_with_audit(self.context, nodes);
        debug!(%group_id, "create saga finished:\n{}", audit_log.summary());

        match result? {
            FleetOutcome::Completed { processed } => {
                self.context.ledger().delete(&key)?;
                info!(%group_id, nodes = processed.len(), "group created on all nodes");
                Ok(JobOutcome::Created { nodes: processed })
            }
            FleetOutcome::Compensating {
                failed_node,
                reason,
                processed,
            } => {
                warn!(%group_id, node = %failed_node, %reason, "create failed, rolling back");
                Ok(JobOutcome::RollbackTriggered {
                    failed_node,
                    reason,
                    compensating: processed,
                })
            }
        }
    }
}
