use groupsaga_core::{GroupId, LedgerKey, NodeName, OperationKind};
use tracing::{error, info, warn};

use super::ledger::{Removal, remove_node};
use crate::Result;
use crate::jobs::JobOutcome;
use crate::traits::Ledger;

/// Final stop for a compensation that ran out of retries.
///
/// Never calls a node and never retries. Its `error` log line is the
/// operator's signal that a node may be left inconsistent.
pub struct DeadLetterOperation<'a, L> {
    ledger: &'a L,
}

impl<'a, L: Ledger> DeadLetterOperation<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// # Errors
    ///
    /// Returns an error if the ledger fails.
    pub fn execute(
        &self,
        group_id: &GroupId,
        node: &NodeName,
        task: OperationKind,
    ) -> Result<JobOutcome> {
        error!(
            %group_id,
            %node,
            task = task.task_name(),
            "dead letter: compensation abandoned, node may need manual repair"
        );

        let key = LedgerKey::new(task, group_id);
        let outcome = match remove_node(self.ledger, &key, node)? {
            Removal::Removed { remaining } => {
                info!(%key, %node, remaining, "removed dead-lettered node from rollback record");
                JobOutcome::DeadLetterCleared { node: node.clone() }
            }
            Removal::Emptied => {
                info!(%key, %node, "removed last dead-lettered node, record deleted");
                JobOutcome::DeadLetterCleared { node: node.clone() }
            }
            Removal::Absent => {
                info!(%key, %node, "no rollback record for dead letter");
                noop("no rollback record")
            }
            Removal::NotListed => {
                info!(%key, %node, "dead-lettered node not in rollback record");
                noop("node not in rollback record")
            }
            Removal::Locked => {
                warn!(%key, %node, "ledger holds the create lock, not a rollback record");
                noop("create lock held")
            }
            Removal::Malformed(err) => {
                warn!(%key, %node, error = %err, "malformed rollback record");
                noop("malformed rollback record")
            }
        };
        Ok(outcome)
    }
}

fn noop(reason: &str) -> JobOutcome {
    JobOutcome::Noop {
        reason: reason.to_string(),
    }
}
