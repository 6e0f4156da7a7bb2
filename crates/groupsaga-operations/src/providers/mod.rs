mod local_queue;
mod memory_ledger;
mod node;
mod redis_ledger;

pub use local_queue::{LocalWorkQueue, WorkerPool};
pub use memory_ledger::MemoryLedger;
pub use node::HttpNodeGateway;
pub use redis_ledger::RedisLedger;
