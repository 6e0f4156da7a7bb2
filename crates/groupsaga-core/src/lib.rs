pub mod error;
mod ledger;
pub mod types;

pub use error::*;
pub use ledger::{LedgerEntry, LedgerKey, RollbackRecord};
pub use types::*;
