mod dead_letter;
mod ledger;
mod submit;

use clap::Subcommand;
use groupsaga_config::Settings;
use groupsaga_core::{GroupId, NodeName, OperationKind};

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create a group on every node, rolling back on failure
    Create {
        group_id: GroupId,
    },
    /// Delete a group from every node, restoring it on failure
    Delete {
        group_id: GroupId,
    },
    /// Show the rollback records held for a group
    Ledger {
        group_id: GroupId,
    },
    /// Drop a node from a group's rollback record after manual repair
    DeadLetter {
        group_id: GroupId,
        node: NodeName,
        /// `rollback_create_group` or `rollback_delete_group`
        task: OperationKind,
    },
}

impl Commands {
    pub(crate) fn execute(self, settings: &Settings) -> Result<()> {
        match self {
            Self::Create { group_id } => submit::run(settings, submit::Saga::Create, group_id),
            Self::Delete { group_id } => submit::run(settings, submit::Saga::Delete, group_id),
            Self::Ledger { group_id } => ledger::run(settings, &group_id),
            Self::DeadLetter {
                group_id,
                node,
                task,
            } => dead_letter::run(settings, &group_id, &node, task),
        }
    }
}
