//! Custom error types for bankrec
//!
//! Business-rule rejections (not found, conflict, validation) are kept apart
//! from infrastructure failures (storage, I/O, JSON) so the edge layer can
//! decide how to surface each.

use thiserror::Error;

use crate::models::Money;

/// The main error type for bankrec operations
#[derive(Error, Debug)]
pub enum RecError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Input or data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Completion attempted while the cleared balance disagrees with the statement
    #[error("Cannot complete reconciliation with a non-zero difference ({difference})")]
    UnbalancedReconciliation { difference: Money },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// State-machine precondition violations
    #[error("{message}")]
    Conflict {
        message: String,
        /// Id of the record the caller should resume instead (if any)
        existing_id: Option<String>,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RecError {
    /// Create a "not found" error for bank accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bank account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for bank transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for reconciliation sessions
    pub fn reconciliation_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Reconciliation",
            identifier: identifier.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            existing_id: None,
        }
    }

    /// Create a conflict error pointing at an existing record
    pub fn conflict_with(message: impl Into<String>, existing_id: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            existing_id: Some(existing_id.into()),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Duplicate { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnbalancedReconciliation { .. }
        )
    }

    /// Check if this error comes from the infrastructure rather than a business rule
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Storage(_)
        )
    }
}

impl From<std::io::Error> for RecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for bankrec operations
pub type RecResult<T> = Result<T, RecError>;
