use std::fmt::Debug;

use crate::audit::{NodeStatus, SagaAuditLog};
use crate::error::{CompensationError, SagaError};
use crate::step::{FleetStep, StepVerdict};

/// Result of a saga run that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetOutcome<N> {
    /// Every node processed the step.
    Completed { processed: Vec<N> },
    /// A node rejected the step; `processed` was handed to compensation.
    Compensating {
        failed_node: N,
        reason: String,
        processed: Vec<N>,
    },
}

/// A saga that applies one step to each node of an ordered fleet.
///
/// Nodes are visited sequentially. The first rejection stops the run and
/// only the already-processed prefix is compensated; later nodes are never
/// contacted.
pub struct FleetSaga<S> {
    step: S,
}

impl<S> FleetSaga<S>
where
    S: FleetStep,
    S::Error: Debug,
{
    #[must_use]
    pub fn new(step: S) -> Self {
        Self { step }
    }

    #[must_use]
    pub fn step(&self) -> &S {
        &self.step
    }

    /// Execute the saga over `nodes`.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if a step errors and compensation succeeds.
    /// Returns `SagaError::CompensationFailed` if compensation itself fails.
    pub fn execute(
        &self,
        ctx: &S::Context,
        nodes: &[S::Node],
    ) -> Result<FleetOutcome<S::Node>, SagaError<S::Error>> {
        let (result, _audit_log) = self.execute_internal(ctx, nodes);
        result
    }

    /// Execute the saga and return both the result and an audit log.
    pub fn execute_with_audit(
        &self,
        ctx: &S::Context,
        nodes: &[S::Node],
    ) -> (Result<FleetOutcome<S::Node>, SagaError<S::Error>>, SagaAuditLog) {
        self.execute_internal(ctx, nodes)
    }

    fn execute_internal(
        &self,
        ctx: &S::Context,
        nodes: &[S::Node],
    ) -> (Result<FleetOutcome<S::Node>, SagaError<S::Error>>, SagaAuditLog) {
        let mut audit_log = SagaAuditLog::new();
        let mut processed: Vec<S::Node> = Vec::with_capacity(nodes.len());

        for node in nodes {
            audit_log.visit(node.to_string());

            let step_error = match self.step.execute(ctx, node) {
                Ok(StepVerdict::Applied | StepVerdict::AlreadyApplied) => {
                    audit_log.processed();
                    processed.push(node.clone());
                    continue;
                }
                Ok(StepVerdict::Rejected { reason }) => {
                    audit_log.stopped(reason.clone());
                    Stop::Rejected(reason)
                }
                Err(error) => {
                    audit_log.stopped(format!("{error:?}"));
                    Stop::Errored(error)
                }
            };

            let compensation = self.compensate(ctx, &mut audit_log, &processed);
            let result = match (step_error, compensation) {
                (Stop::Rejected(reason), Ok(())) => Ok(FleetOutcome::Compensating {
                    failed_node: node.clone(),
                    reason,
                    processed,
                }),
                (Stop::Errored(source), Ok(())) => Err(SagaError::StepFailed {
                    step: self.step.name().to_string(),
                    node: node.to_string(),
                    source,
                }),
                (stop, Err(compensation_error)) => Err(SagaError::CompensationFailed {
                    step: self.step.name().to_string(),
                    node: node.to_string(),
                    step_error: stop.into_error(),
                    compensation_error,
                }),
            };
            return (result, audit_log);
        }

        (Ok(FleetOutcome::Completed { processed }), audit_log)
    }

    fn compensate(
        &self,
        ctx: &S::Context,
        audit_log: &mut SagaAuditLog,
        processed: &[S::Node],
    ) -> Result<(), CompensationError<S::Error>> {
        if let Err(error) = self.step.compensate(ctx, processed) {
            audit_log.hand_over(NodeStatus::Stranded);
            return Err(CompensationError {
                step: self.step.name().to_string(),
                description: self.step.compensation_description(),
                nodes: processed.iter().map(ToString::to_string).collect(),
                error,
            });
        }
        audit_log.hand_over(NodeStatus::Compensating);
        Ok(())
    }
}

/// Why a run stopped before the end of the fleet.
enum Stop<E> {
    Rejected(String),
    Errored(E),
}

impl<E> Stop<E> {
    fn into_error(self) -> Option<E> {
        match self {
            Self::Rejected(_) => None,
            Self::Errored(error) => Some(error),
        }
    }
}
