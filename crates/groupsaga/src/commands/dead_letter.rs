use groupsaga_config::Settings;
use groupsaga_core::{GroupId, NodeName, OperationKind};
use groupsaga_operations::operations::DeadLetterOperation;

use crate::error::Result;
use crate::runtime::open_ledger;

pub(crate) fn run(
    settings: &Settings,
    group_id: &GroupId,
    node: &NodeName,
    task: OperationKind,
) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let outcome = DeadLetterOperation::new(&ledger).execute(group_id, node, task)?;
    println!("{outcome}");
    Ok(())
}
