use std::time::Duration;

use groupsaga_core::{
    CoreError, GroupId, LedgerEntry, LedgerKey, NodeName, OperationKind, RollbackRecord,
};
use tracing::{debug, info};

use super::context::SagaContext;
use crate::jobs::Job;
use crate::traits::{Expiry, Ledger, NodeGateway, WorkQueue};
use crate::{OperationError, Result};

/// Lifetime of a populated rollback record.
pub const ROLLBACK_TTL: Duration = Duration::from_secs(3600);

const MAX_CAS_ATTEMPTS: u32 = 16;

/// A ledger read, decoded.
#[derive(Debug)]
pub enum Lookup {
    Absent,
    Malformed(CoreError),
    Found { raw: String, entry: LedgerEntry },
}

/// # Errors
///
/// Returns an error if the ledger cannot be read. Undecodable values are
/// reported as [`Lookup::Malformed`].
pub fn lookup<L: Ledger + ?Sized>(ledger: &L, key: &LedgerKey) -> Result<Lookup> {
    let Some(raw) = ledger.get(key)? else {
        return Ok(Lookup::Absent);
    };
    Ok(match LedgerEntry::decode(&raw) {
        Ok(entry) => Lookup::Found { raw, entry },
        Err(err) => Lookup::Malformed(err),
    })
}

/// Result of removing one node from a rollback record.
#[derive(Debug)]
pub enum Removal {
    Absent,
    Malformed(CoreError),
    /// The key holds the create lock, not a record.
    Locked,
    NotListed,
    Removed { remaining: usize },
    /// The last node was removed and the key deleted.
    Emptied,
}

/// Removes `node` from the record under `key`.
///
/// The read-modify-write is a compare-and-swap against the value read, so
/// concurrent removals for the same group never lose each other's update.
/// A reduced record keeps the key's remaining expiry.
///
/// # Errors
///
/// Returns an error if the ledger fails, or
/// [`OperationError::LedgerContention`] if the record kept changing under us.
pub fn remove_node<L: Ledger + ?Sized>(
    ledger: &L,
    key: &LedgerKey,
    node: &NodeName,
) -> Result<Removal> {
    for _ in 0..MAX_CAS_ATTEMPTS {
        let (raw, mut record) = match lookup(ledger, key)? {
            Lookup::Absent => return Ok(Removal::Absent),
            Lookup::Malformed(err) => return Ok(Removal::Malformed(err)),
            Lookup::Found {
                entry: LedgerEntry::Lock,
                ..
            } => return Ok(Removal::Locked),
            Lookup::Found {
                raw,
                entry: LedgerEntry::Rollback(record),
            } => (raw, record),
        };

        if !record.remove(node) {
            return Ok(Removal::NotListed);
        }

        let remaining = record.len();
        let swapped = if record.is_empty() {
            ledger.compare_and_swap(key, &raw, None)?
        } else {
            let reduced = LedgerEntry::Rollback(record).encode()?;
            ledger.compare_and_swap(key, &raw, Some((&reduced, Expiry::Keep)))?
        };

        if swapped {
            debug!(%key, %node, remaining, "removed node from rollback record");
            return Ok(if remaining == 0 {
                Removal::Emptied
            } else {
                Removal::Removed { remaining }
            });
        }
        debug!(%key, %node, "rollback record changed concurrently, re-reading");
    }

    Err(OperationError::LedgerContention {
        key: key.to_string(),
        attempts: MAX_CAS_ATTEMPTS,
    })
}

/// Records `processed` as needing compensation and schedules one rollback
/// job per node.
///
/// The record overwrites the create lock, if any, and expires after
/// [`ROLLBACK_TTL`].
///
/// # Errors
///
/// Returns an error if the ledger write or an enqueue fails.
pub fn trigger_rollback<G, L, Q>(
    ctx: &SagaContext<G, L, Q>,
    kind: OperationKind,
    group_id: &GroupId,
    processed: &[NodeName],
) -> Result<()>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    let key = LedgerKey::new(kind, group_id);
    let record = LedgerEntry::Rollback(RollbackRecord::new(group_id.clone(), processed));
    ctx.ledger()
        .set(&key, &record.encode()?, Expiry::After(ROLLBACK_TTL))?;
    debug!(%key, nodes = processed.len(), "wrote rollback record");

    for node in processed {
        let id = ctx
            .queue()
            .enqueue(Job::rollback(kind, group_id.clone(), node.clone(), 0))?;
        debug!(%group_id, %node, task = kind.task_name(), %id, "scheduled rollback");
    }

    info!(
        %group_id,
        task = kind.task_name(),
        nodes = processed.len(),
        "triggered rollback"
    );
    Ok(())
}
