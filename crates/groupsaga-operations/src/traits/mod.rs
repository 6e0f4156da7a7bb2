mod ledger;
mod node_gateway;
mod work_queue;

pub use ledger::{Expiry, Ledger};
pub use node_gateway::NodeGateway;
pub use work_queue::{JobHandler, WorkQueue};
