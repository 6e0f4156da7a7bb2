use groupsaga_core::{GroupId, LedgerEntry, LedgerKey, NodeName, OperationKind};
use groupsaga_node::NodeResponse;
use tracing::{debug, error, info, warn};

use super::context::SagaContext;
use super::ledger::{Lookup, Removal, lookup, remove_node};
use crate::Result;
use crate::jobs::{Job, JobOutcome};
use crate::traits::{Ledger, NodeGateway, WorkQueue};

/// Compensates one node of a stopped saga, with bounded retries.
///
/// The ledger record is the source of truth: a node that is no longer
/// listed has already been compensated (or given up on), so running the
/// same job again is harmless.
pub struct RollbackOperation<'a, G, L, Q> {
    context: &'a SagaContext<G, L, Q>,
}

impl<'a, G, L, Q> RollbackOperation<'a, G, L, Q>
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
    /// Returns an error if the ledger or queue fails.
    pub fn execute(
        &self,
        kind: OperationKind,
        group_id: &GroupId,
        node: &NodeName,
        attempt: u32,
    ) -> Result<JobOutcome> {
        let key = LedgerKey::new(kind, group_id);

        match lookup(self.context.ledger(), &key)? {
            Lookup::Absent => {
                info!(%group_id, %node, %key, "no rollback record, nothing to compensate");
                return Ok(noop("no rollback record"));
            }
            Lookup::Malformed(err) => {
                error!(%group_id, %node, %key, error = %err, "malformed rollback record");
                return Ok(noop("malformed rollback record"));
            }
            Lookup::Found {
                entry: LedgerEntry::Lock,
                ..
            } => {
                warn!(%group_id, %node, %key, "create still holds the lock, nothing to compensate");
                return Ok(noop("create lock held"));
            }
            Lookup::Found {
                entry: LedgerEntry::Rollback(record),
                ..
            } if !record.contains(node) => {
                debug!(%group_id, %node, %key, "node already compensated");
                return Ok(noop("node not in rollback record"));
            }
            Lookup::Found { .. } => {}
        }

        let response = self.compensate(kind, group_id, node);
        if response.status() == expected_status(kind) {
            let removal = remove_node(self.context.ledger(), &key, node)?;
            info!(%group_id, %node, task = kind.task_name(), ?removal, "compensated node");
            return Ok(JobOutcome::Compensated { node: node.clone() });
        }

        warn!(
            %group_id,
            %node,
            task = kind.task_name(),
            status = response.status(),
            attempt,
            "compensation failed"
        );

        let retry = self.context.retry();
        if let Some(next) = retry.next_attempt(attempt) {
            let job = Job::rollback(kind, group_id.clone(), node.clone(), next);
            let id = self.context.queue().enqueue_after(job, retry.delay())?;
            debug!(%group_id, %node, attempt = next, %id, "scheduled compensation retry");
            return Ok(JobOutcome::RetryScheduled { attempt: next });
        }

        self.context.ledger().delete(&key)?;
        self.context.queue().enqueue(Job::ProcessDeadLetter {
            group_id: group_id.clone(),
            node: node.clone(),
            task: kind,
        })?;
        error!(
            %group_id,
            %node,
            task = kind.task_name(),
            attempts = attempt + 1,
            "compensation retries exhausted, sent to dead letter"
        );
        Ok(JobOutcome::DeadLettered { node: node.clone() })
    }

    fn compensate(&self, kind: OperationKind, group_id: &GroupId, node: &NodeName) -> NodeResponse {
        match kind {
            OperationKind::Create => self.context.gateway().delete_group(node, group_id),
            OperationKind::Delete => self.context.gateway().create_group(node, group_id),
        }
    }
}

fn expected_status(kind: OperationKind) -> u16 {
    match kind {
        OperationKind::Create => 200,
        OperationKind::Delete => 201,
    }
}

fn noop(reason: &str) -> JobOutcome {
    JobOutcome::Noop {
        reason: reason.to_string(),
    }
}
