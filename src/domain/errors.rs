//! Domain errors for the task cache service.

use std::time::Duration;

use thiserror::Error;

/// Domain-level errors that can occur in the task service.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store call timed out after {0:?}")]
    StoreTimeout(Duration),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl DomainError {
    /// Whether this error is the distinct "not found" outcome rather than a failure.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_))
    }

    /// Whether this error originated at the record store boundary.
    pub const fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::StoreTimeout(_) | Self::SerializationError(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_store_failure() {
        let not_found = DomainError::TaskNotFound(7);
        assert!(not_found.is_not_found());
        assert!(!not_found.is_store_failure());
        assert_eq!(not_found.to_string(), "Task not found: 7");

        let timeout = DomainError::StoreTimeout(Duration::from_secs(5));
        assert!(timeout.is_store_failure());
        assert!(!timeout.is_not_found());
    }

    #[test]
    fn test_sqlx_error_maps_to_database_error() {
        let err: DomainError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
