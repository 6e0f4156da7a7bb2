use groupsaga_config::Settings;
use groupsaga_core::{GroupId, LedgerEntry, LedgerKey, NodeName, OperationKind};
use groupsaga_operations::operations::{Lookup, lookup};
use groupsaga_operations::traits::Ledger;

use crate::error::Result;
use crate::runtime::open_ledger;

pub(crate) fn run(settings: &Settings, group_id: &GroupId) -> Result<()> {
    let ledger = open_ledger(settings)?;

    for kind in [OperationKind::Create, OperationKind::Delete] {
        let key = LedgerKey::new(kind, group_id);
        let ttl = ledger.ttl(&key)?;
        let line = match lookup(&ledger, &key)? {
            Lookup::Absent => "absent".to_string(),
            Lookup::Malformed(err) => format!("malformed ({err})"),
            Lookup::Found {
                entry: LedgerEntry::Lock,
                ..
            } => "locked, create in progress".to_string(),
            Lookup::Found {
                entry: LedgerEntry::Rollback(record),
                ..
            } => {
                let nodes: Vec<&str> = record.nodes.iter().map(NodeName::as_str).collect();
                format!("pending rollback on [{}]", nodes.join(", "))
            }
        };
        match ttl {
            Some(ttl) => println!("{key}: {line} (expires in {}s)", ttl.as_secs()),
            None => println!("{key}: {line}"),
        }
    }
    Ok(())
}
