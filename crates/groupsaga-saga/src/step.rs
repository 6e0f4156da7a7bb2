use std::fmt::Display;

/// How a node responded to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepVerdict {
    /// The node performed the action.
    Applied,
    /// The node was already in the desired state. Counts as processed.
    AlreadyApplied,
    /// The node refused or failed; the run stops here.
    Rejected {
        /// Human-readable reason, recorded in the outcome.
        reason: String,
    },
}

impl StepVerdict {
    #[must_use]
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadyApplied)
    }
}

/// The per-node action of a [`FleetSaga`](crate::FleetSaga).
///
/// `Context` carries the injected collaborators (clients, stores, queues)
/// and is shared by every node of a run.
pub trait FleetStep: Send + Sync {
    type Node: Clone + Display;
    type Context;
    type Error;

    /// Task name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Apply the action to one node.
    ///
    /// # Errors
    ///
    /// Returns an error if the step cannot reach a verdict at all. A node
    /// refusing the action is `Ok(StepVerdict::Rejected { .. })`.
    fn execute(&self, ctx: &Self::Context, node: &Self::Node) -> Result<StepVerdict, Self::Error>;

    /// Undo the nodes processed before the run stopped, given in run order.
    ///
    /// Called exactly once per stopped run, also with an empty prefix. Does
    /// nothing unless overridden.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation cannot be started.
    fn compensate(&self, ctx: &Self::Context, processed: &[Self::Node]) -> Result<(), Self::Error> {
        let _ = (ctx, processed);
        Ok(())
    }

    /// Short imperative phrase, e.g. "delete group 'g1' from processed nodes".
    fn compensation_description(&self) -> String {
        format!("compensate {}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rejection_is_unprocessed() {
        assert!(StepVerdict::Applied.is_processed());
        assert!(StepVerdict::AlreadyApplied.is_processed());
        assert!(
            !StepVerdict::Rejected {
                reason: "status 500".to_string()
            }
            .is_processed()
        );
    }
}
