mod context;
mod create_group;
mod dead_letter;
mod delete_group;
mod ledger;
mod rollback;
mod submit;

pub use context::SagaContext;
pub use create_group::{CreateGroupOperation, CreateGroupStep};
pub use dead_letter::DeadLetterOperation;
pub use delete_group::{DeleteGroupOperation, DeleteGroupStep};
pub use ledger::{Lookup, ROLLBACK_TTL, Removal, lookup, remove_node, trigger_rollback};
pub use rollback::RollbackOperation;
pub use submit::Submitter;
