use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::types::{GroupId, NodeName, OperationKind};

/// Key of a rollback record: `{task}_{group_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey(String);

impl LedgerKey {
    #[must_use]
    pub fn new(kind: OperationKind, group_id: &GroupId) -> Self {
        Self(format!("{}_{}", kind.task_name(), group_id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Nodes of a group that still need compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub group_id: GroupId,
    pub nodes: IndexSet<NodeName>,
}

impl RollbackRecord {
    #[must_use]
    pub fn new<'a>(group_id: GroupId, nodes: impl IntoIterator<Item = &'a NodeName>) -> Self {
        Self {
            group_id,
            nodes: nodes.into_iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, node: &NodeName) -> bool {
        self.nodes.contains(node)
    }

    /// Returns `false` if the node was not listed.
    pub fn remove(&mut self, node: &NodeName) -> bool {
        self.nodes.shift_remove(node)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Decoded value stored under a [`LedgerKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    /// `[]`: a create saga holds the group, nothing to compensate yet.
    Lock,
    Rollback(RollbackRecord),
}

impl LedgerEntry {
    pub const LOCK_SENTINEL: &'static str = "[]";

    /// # Errors
    ///
    /// Returns [`CoreError::LedgerDecode`] for invalid JSON and
    /// [`CoreError::LedgerShape`] when the value is neither the lock
    /// sentinel nor a record with `group_id` and `nodes`.
    pub fn decode(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Array(items) if items.is_empty() => Ok(Self::Lock),
            Value::Array(_) => Err(CoreError::LedgerShape(
                "non-empty list is not a lock sentinel".to_string(),
            )),
            value @ Value::Object(_) => {
                let record = serde_json::from_value(value)
                    .map_err(|e| CoreError::LedgerShape(e.to_string()))?;
                Ok(Self::Rollback(record))
            }
            other => Err(CoreError::LedgerShape(format!(
                "expected object or list, found {other}"
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        match self {
            Self::Lock => Ok(Self::LOCK_SENTINEL.to_string()),
            Self::Rollback(record) => Ok(serde_json::to_string(record)?),
        }
    }
}
