//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::StoreError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    /// A keyed write matched no single row.
    #[error("not applied: {0}")]
    NotApplied(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::NotApplied(_) => crate::exitcode::DATAERR,
            CliError::Application(e) => match e {
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::Store(StoreError::InvalidRow(_)) => crate::exitcode::DATAERR,
                ApplicationError::Store(StoreError::InvalidSchemaPrefix(_)) => {
                    crate::exitcode::CONFIG
                }
                ApplicationError::Store(StoreError::Io { .. }) => crate::exitcode::IOERR,
                ApplicationError::Store(_) => crate::exitcode::UNAVAILABLE,
            },
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Application(ApplicationError::Store(e))
    }
}
