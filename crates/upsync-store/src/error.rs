//! Store error types with transient/permanent classification.

use thiserror::Error;

use crate::ids::RecordId;

/// Error reported by a record store.
///
/// Outer-level errors on a batch call mean the round-trip itself failed
/// (nothing in the batch was applied beyond what the store reports);
/// per-record errors inside a batch result mean the store rejected that
/// record while its siblings proceeded.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is unreachable or refused the call as a whole.
    #[error("store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The store did not respond within its own timeout policy.
    #[error("store call timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// A business rule of the store rejected the record.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// A unique-value rule of the store rejected the record.
    #[error("duplicate value for '{field}': {value}")]
    DuplicateValue { field: String, value: String },

    /// The record targeted by an update does not exist.
    #[error("record not found: {id}")]
    RecordNotFound { id: RecordId },

    /// The record payload is malformed for this store.
    #[error("invalid record: {message}")]
    InvalidRecord { message: String },

    /// Internal store error.
    #[error("internal store error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Check if this error is transient and the call may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StoreError::Timeout { .. } => "STORE_TIMEOUT",
            StoreError::ConstraintViolation { .. } => "CONSTRAINT_VIOLATION",
            StoreError::DuplicateValue { .. } => "DUPLICATE_VALUE",
            StoreError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            StoreError::InvalidRecord { .. } => "INVALID_RECORD",
            StoreError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error with a source.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a constraint violation error.
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Create a duplicate value error.
    pub fn duplicate_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        StoreError::DuplicateValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        StoreError::InvalidRecord {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::unavailable("down").is_transient());
        assert!(StoreError::Timeout { timeout_secs: 30 }.is_transient());
        assert!(!StoreError::constraint_violation("required field missing").is_transient());
        assert!(!StoreError::invalid_record("bad payload").is_transient());
        assert!(!StoreError::RecordNotFound {
            id: RecordId::new("A1")
        }
        .is_transient());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StoreError::unavailable("down").error_code(),
            "STORE_UNAVAILABLE"
        );
        assert_eq!(
            StoreError::duplicate_value("name", "Doe").error_code(),
            "DUPLICATE_VALUE"
        );
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Timeout { timeout_secs: 30 };
        assert_eq!(err.to_string(), "store call timed out after 30 seconds");

        let err = StoreError::duplicate_value("name", "Doe");
        assert_eq!(err.to_string(), "duplicate value for 'name': Doe");
    }

    #[test]
    fn test_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::unavailable_with_source("connect failed", source);

        assert!(err.is_transient());
        if let StoreError::Unavailable { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("expected Unavailable variant");
        }
    }
}
