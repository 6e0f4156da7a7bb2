use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to load settings")]
    Config(#[from] groupsaga_config::ConfigError),

    #[error("operation failed")]
    Operation(#[from] groupsaga_operations::OperationError),

    #[error("{failed} task(s) failed or were rolled back")]
    TasksFailed { failed: usize },
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use groupsaga_operations::OperationError;

    use super::CliError;

    #[test]
    fn tasks_failed_reports_count() {
        let err = CliError::TasksFailed { failed: 2 };

        assert_eq!(err.to_string(), "2 task(s) failed or were rolled back");
    }

    #[test]
    fn operation_error_has_source_chain() {
        let cli_err: CliError = OperationError::QueueClosed.into();

        let source = std::error::Error::source(&cli_err);

        assert!(matches!(cli_err, CliError::Operation(_)));
        assert_eq!(
            source.map(ToString::to_string).as_deref(),
            Some("work queue is shut down")
        );
    }

    #[test]
    fn config_error_converts_via_from() {
        let cli_err: CliError = groupsaga_config::ConfigError::NoNodes.into();

        assert!(matches!(cli_err, CliError::Config(_)));
        assert!(std::error::Error::source(&cli_err).is_some());
    }
}
