//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the persisted row layout.
/// Malformed hierarchies are never an error; they are dropped during assembly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("ident must not be empty")]
    EmptyIdent,

    #[error("{field} too long ({len} > {max} chars): {value}")]
    FieldTooLong {
        field: &'static str,
        value: String,
        len: usize,
        max: usize,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
