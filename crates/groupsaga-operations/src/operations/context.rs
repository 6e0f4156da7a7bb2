use crate::RetryPolicy;
use crate::traits::{Ledger, NodeGateway, WorkQueue};

/// Dependencies shared by every saga and compensation job.
pub struct SagaContext<G, L, Q> {
    gateway: G,
    ledger: L,
    queue: Q,
    retry: RetryPolicy,
}

impl<G: Clone, L: Clone, Q: Clone> Clone for SagaContext<G, L, Q> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            ledger: self.ledger.clone(),
            queue: self.queue.clone(),
            retry: self.retry,
        }
    }
}

impl<G, L, Q> SagaContext<G, L, Q>
where
    G: NodeGateway,
    L: Ledger,
    Q: WorkQueue,
{
    pub fn new(gateway: G, ledger: L, queue: Q, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            ledger,
            queue,
            retry,
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    #[must_use]
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }
}
