use groupsaga_saga::SagaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Core(#[from] groupsaga_core::CoreError),

    #[error(transparent)]
    Config(#[from] groupsaga_config::ConfigError),

    #[error(transparent)]
    Node(#[from] groupsaga_node::NodeError),

    #[error("ledger backend error")]
    Ledger(#[from] redis::RedisError),

    #[error("gave up updating ledger key '{key}' after {attempts} conflicting writes")]
    LedgerContention { key: String, attempts: u32 },

    #[error("work queue is shut down")]
    QueueClosed,

    #[error("job panicked")]
    JobPanicked,

    #[error("failed to spawn queue worker")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("{saga} saga failed on node '{node}'")]
    SagaFailed {
        saga: String,
        node: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error("{saga} saga stopped on node '{node}' and could not schedule compensation for {}", nodes.join(", "))]
    SagaCompensationFailed {
        saga: String,
        node: String,
        description: String,
        nodes: Vec<String>,
        #[source]
        source: Box<OperationError>,
    },
}

pub type Result<T> = std::result::Result<T, OperationError>;

impl From<SagaError<OperationError>> for OperationError {
    fn from(err: SagaError<OperationError>) -> Self {
        match err {
            SagaError::StepFailed { step, node, source } => Self::SagaFailed {
                saga: step,
                node,
                source: Box::new(source),
            },
            SagaError::CompensationFailed {
                step,
                node,
                compensation_error,
                ..
            } => Self::SagaCompensationFailed {
                saga: step,
                node,
                description: compensation_error.description,
                nodes: compensation_error.nodes,
                source: Box::new(compensation_error.error),
            },
            _ => Self::SagaFailed {
                saga: "unknown".to_string(),
                node: "unknown".to_string(),
                source: Box::new(Self::QueueClosed),
            },
        }
    }
}
