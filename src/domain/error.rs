//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid view parameters.
///
/// Malformed records, unresolvable parents and cycles are not errors: the
/// resolver degrades them to skipped records or orphans.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("unknown sort direction: {0}")]
    UnknownSortDirection(String),

    #[error("unknown filter field: {0}")]
    UnknownFilterField(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
