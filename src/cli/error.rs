//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Messages of `err` and of every error below it, outermost first.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    std::iter::successors(Some(err), |e| e.source())
        .map(ToString::to_string)
        .collect()
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::NOINPUT,
                InfraError::Parse { .. } => crate::exitcode::DATAERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Domain(_) => crate::exitcode::USAGE,
                    ApplicationError::OperationFailed { source, .. } => {
                        match source.downcast_ref::<InfraError>() {
                            Some(InfraError::Io { .. }) => crate::exitcode::NOINPUT,
                            Some(InfraError::Parse { .. }) => crate::exitcode::DATAERR,
                            _ => crate::exitcode::SOFTWARE,
                        }
                    }
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn given_domain_error_when_mapping_exit_code_then_usage() {
        let err = CliError::from(ApplicationError::from(DomainError::UnknownSortKey(
            "x".into(),
        )));
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn given_failed_fetch_when_mapping_exit_code_then_noinput() {
        let io = InfraError::io(
            "read cas.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let err = CliError::from(ApplicationError::OperationFailed {
            context: "fetch".into(),
            source: Box::new(io),
        });
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }

    #[test]
    fn given_parse_failure_when_collecting_chain_then_decoder_position_included() {
        let source = serde_json::from_str::<Vec<u8>>("[1, oops]").unwrap_err();
        let err = CliError::from(ApplicationError::OperationFailed {
            context: "fetch CA records".into(),
            source: Box::new(InfraError::parse("decode cas.json", source)),
        });

        let chain = error_chain(&err);

        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0], "operation failed: fetch CA records");
        assert_eq!(chain[1], "invalid record data: decode cas.json");
        assert!(chain[2].contains("line 1 column"), "{}", chain[2]);
    }

    #[test]
    fn given_wrapped_domain_error_when_collecting_chain_then_message_not_repeated() {
        let err = CliError::from(ApplicationError::from(DomainError::UnknownSortKey(
            "x".into(),
        )));

        assert_eq!(error_chain(&err), vec![err.to_string()]);
    }

    #[test]
    fn given_config_error_when_mapping_exit_code_then_config() {
        let err = CliError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }
}
