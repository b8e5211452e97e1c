//! Error types for the form store

use thiserror::Error;

use crate::roles::UserRole;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Form not found by id
    #[error("form not found: {id}")]
    FormNotFound { id: String },

    /// The caller's role does not permit the operation
    #[error("role {role} cannot modify this form")]
    Forbidden { role: UserRole },

    /// Submitted version does not match the stored version
    #[error("version conflict: expected {expected}, found {found}")]
    PreconditionFailed { expected: u64, found: u64 },

    /// Another writer holds the form lock
    #[error("form is locked by another writer")]
    LockBusy,

    /// Asset not found by key
    #[error("asset not found: {key}")]
    AssetNotFound { key: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a form-not-found error
    pub fn form_not_found(id: impl std::fmt::Display) -> Self {
        Self::FormNotFound { id: id.to_string() }
    }

    /// True when the error is the optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}
