mod error;
pub mod jobs;
pub mod operations;
mod orchestrator;
pub mod providers;
mod retry;
pub mod traits;

#[cfg(test)]
mod mocks;

pub use error::{OperationError, Result};
pub use orchestrator::Orchestrator;
pub use retry::RetryPolicy;
