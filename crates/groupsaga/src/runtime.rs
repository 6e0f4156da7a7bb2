use std::sync::Arc;

use groupsaga_config::{LedgerBackend, Settings};
use groupsaga_operations::providers::{
    HttpNodeGateway, LocalWorkQueue, MemoryLedger, RedisLedger, WorkerPool,
};
use groupsaga_operations::traits::{JobHandler, Ledger};
use groupsaga_operations::{Orchestrator, RetryPolicy};

use crate::error::Result;

pub(crate) type SharedLedger = Arc<dyn Ledger>;

/// # Errors
///
/// Returns an error if the configured backend cannot be opened.
pub(crate) fn open_ledger(settings: &Settings) -> Result<SharedLedger> {
    let ledger: SharedLedger = match settings.ledger().backend {
        LedgerBackend::Redis => Arc::new(RedisLedger::from_settings(settings.ledger())?),
        LedgerBackend::Memory => Arc::new(MemoryLedger::new()),
    };
    Ok(ledger)
}

/// A queue with workers running the orchestrator.
pub(crate) struct Runtime {
    pub(crate) queue: LocalWorkQueue,
    pool: WorkerPool,
}

impl Runtime {
    pub(crate) fn start(settings: &Settings) -> Result<Self> {
        let gateway = HttpNodeGateway::from_settings(settings.node_client())?;
        let ledger = open_ledger(settings)?;
        let queue = LocalWorkQueue::new();

        let orchestrator = Orchestrator::new(
            gateway,
            ledger,
            queue.clone(),
            settings.nodes().to_vec(),
            RetryPolicy::from(settings.retry()),
        );
        let handler: Arc<dyn JobHandler> = Arc::new(orchestrator);
        let pool = queue.start(settings.queue().workers, handler)?;

        Ok(Self { queue, pool })
    }

    /// Waits until every submitted job and its follow-ups have run.
    pub(crate) fn drain(self) -> LocalWorkQueue {
        self.queue.wait_idle();
        self.pool.shutdown();
        self.queue
    }
}
