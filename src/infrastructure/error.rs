//! Row store errors (transport and input faults; zero-row writes are not errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Faults raised at the row store boundary.
///
/// A write that matches no row is reported as `Ok(false)`, never as one of these.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid row: {0}")]
    InvalidRow(#[from] DomainError),

    #[error("invalid schema prefix: {0}")]
    InvalidSchemaPrefix(String),

    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("row store connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for row store operations.
pub type StoreResult<T> = Result<T, StoreError>;
