//! Reconciliation error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use upsync_store::{NaturalKey, StoreError};

/// Errors that can occur during a reconciliation run.
///
/// `Validation` aborts the whole batch before any store write;
/// `RecordRejected` and `LinkTargetFailed` are local to one record;
/// `StoreUnavailable` marks every record not yet submitted in the
/// failed phase.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileError {
    /// An incoming record cannot be matched or deduplicated.
    #[error("invalid record at index {index}: {message}")]
    Validation { index: usize, message: String },

    /// The store was unreachable or the bulk round-trip failed as a whole.
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The store rejected this individual record.
    #[error("record rejected by store ({code}): {reason}")]
    RecordRejected { code: String, reason: String },

    /// A same-batch link could not resolve because the create it
    /// referenced failed.
    #[error("link target was not created for key '{key}'")]
    LinkTargetFailed { key: NaturalKey },
}

impl ReconcileError {
    /// Create a validation error for the record at `index`.
    pub fn validation(index: usize, message: impl Into<String>) -> Self {
        ReconcileError::Validation {
            index,
            message: message.into(),
        }
    }

    /// Capture a whole-call store failure.
    pub fn store_unavailable(source: &StoreError) -> Self {
        ReconcileError::StoreUnavailable {
            message: source.to_string(),
        }
    }

    /// Capture a per-record store rejection.
    pub fn record_rejected(source: &StoreError) -> Self {
        ReconcileError::RecordRejected {
            code: source.error_code().to_string(),
            reason: source.to_string(),
        }
    }

    /// Check if this error is transient: a re-run may succeed once the
    /// store is reachable again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReconcileError::StoreUnavailable { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReconcileError::Validation { .. } => "VALIDATION",
            ReconcileError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            ReconcileError::RecordRejected { .. } => "RECORD_REJECTED",
            ReconcileError::LinkTargetFailed { .. } => "LINK_TARGET_FAILED",
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_transience() {
        let err = ReconcileError::validation(3, "missing natural key");
        assert_eq!(err.error_code(), "VALIDATION");
        assert!(!err.is_transient());
        assert!(err.to_string().contains("index 3"));

        let err = ReconcileError::store_unavailable(&StoreError::unavailable("down"));
        assert_eq!(err.error_code(), "STORE_UNAVAILABLE");
        assert!(err.is_transient());
    }

    #[test]
    fn test_record_rejected_carries_store_reason() {
        let source = StoreError::constraint_violation("name is required");
        let err = ReconcileError::record_rejected(&source);

        assert_eq!(err.error_code(), "RECORD_REJECTED");
        match err {
            ReconcileError::RecordRejected { code, reason } => {
                assert_eq!(code, "CONSTRAINT_VIOLATION");
                assert!(reason.contains("name is required"));
            }
            _ => panic!("expected RecordRejected"),
        }
    }
}
