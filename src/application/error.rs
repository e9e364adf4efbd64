//! Application-level errors (wraps store errors)

use thiserror::Error;

use crate::infrastructure::StoreError;

/// Application errors wrap store errors and add application-level context.
///
/// Domain validation failures arrive wrapped in [`StoreError::InvalidRow`], since
/// the store is where rows are validated.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
