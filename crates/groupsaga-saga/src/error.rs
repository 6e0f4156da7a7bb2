use std::fmt::Debug;

use thiserror::Error;

/// The step could not start compensating the processed prefix.
#[derive(Debug, Error)]
#[error("{step}: could not {description}")]
pub struct CompensationError<E> {
    pub step: String,
    /// What compensation was about to do, from
    /// [`FleetStep::compensation_description`](crate::FleetStep::compensation_description).
    pub description: String,
    /// Prefix that was due for compensation, in run order.
    pub nodes: Vec<String>,
    #[source]
    pub error: E,
}

/// A run that ended without a verdict for every visited node.
///
/// A node *rejecting* the action is not an error: it is reported as
/// [`crate::FleetOutcome::Compensating`]. These variants cover the step or
/// its compensation failing outright.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E: Debug> {
    /// The step errored on `node`; the prefix before it was compensated.
    #[error("step '{step}' failed on node '{node}'")]
    StepFailed {
        step: String,
        node: String,
        #[source]
        source: E,
    },

    /// The run stopped on `node` and compensating the prefix failed too.
    #[error("step '{step}' stopped at node '{node}', and compensation also failed")]
    CompensationFailed {
        step: String,
        node: String,
        /// Set when the run stopped on an error rather than a rejection.
        step_error: Option<E>,
        #[source]
        compensation_error: CompensationError<E>,
    },
}
