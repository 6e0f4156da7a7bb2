//! Saga pattern for applying one action across an ordered fleet of nodes.
//!
//! A [`FleetStep`] is executed against each node in order. The first node
//! that rejects the action stops the run; nodes after it are never touched.
//! The already-processed prefix is handed to the step's compensation in one
//! call, so the step decides how to undo it (inline, or by scheduling work).

mod audit;
mod error;
mod saga;
mod step;

pub use audit::{NodeStatus, NodeVisit, SagaAuditLog};
pub use error::{CompensationError, SagaError};
pub use saga::{FleetOutcome, FleetSaga};
pub use step::{FleetStep, StepVerdict};
