use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("group id cannot be empty")]
    EmptyGroupId,

    #[error("node name cannot be empty")]
    EmptyNodeName,

    #[error("unknown task '{0}' (expected rollback_create_group or rollback_delete_group)")]
    UnknownTask(String),

    #[error("ledger value is not valid JSON")]
    LedgerDecode(#[from] serde_json::Error),

    #[error("ledger value has unexpected shape: {0}")]
    LedgerShape(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
