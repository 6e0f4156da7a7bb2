use groupsaga_config::Settings;
use groupsaga_core::GroupId;
use groupsaga_operations::jobs::{JobOutcome, TaskState, TaskStatus};
use groupsaga_operations::operations::Submitter;
use tracing::debug;

use crate::error::{CliError, Result};
use crate::runtime::Runtime;

#[derive(Clone, Copy)]
pub(crate) enum Saga {
    Create,
    Delete,
}

pub(crate) fn run(settings: &Settings, saga: Saga, group_id: GroupId) -> Result<()> {
    let runtime = Runtime::start(settings)?;
    let submitter = Submitter::new(runtime.queue.clone());

    let id = match saga {
        Saga::Create => submitter.submit_create(group_id)?,
        Saga::Delete => submitter.submit_delete(group_id)?,
    };
    debug!(%id, "waiting for saga and follow-up jobs");

    let queue = runtime.drain();
    let statuses = queue.statuses();
    for status in &statuses {
        print_status(status);
    }

    let failed = statuses.iter().filter(|status| is_failure(status)).count();
    if failed > 0 {
        return Err(CliError::TasksFailed { failed });
    }
    Ok(())
}

/// Errors, rollbacks and abandoned compensations all need an operator.
fn is_failure(status: &TaskStatus) -> bool {
    status.state == TaskState::Failure
        || matches!(
            status.outcome,
            Some(JobOutcome::RollbackTriggered { .. } | JobOutcome::DeadLettered { .. })
        )
}

fn print_status(status: &TaskStatus) {
    let detail = match (&status.outcome, &status.error) {
        (Some(outcome), _) => outcome.to_string(),
        (None, Some(error)) => error.clone(),
        (None, None) => String::new(),
    };
    println!("{}  {:<7}  {}  {detail}", status.id, status.state, status.job);
}
