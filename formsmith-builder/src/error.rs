//! Error types for the builder session and the save protocol

use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while editing a builder session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Field not found by id
    #[error("field not found: {id}")]
    FieldNotFound { id: String },

    /// A field with this id already exists in the session
    #[error("duplicate field id: {id}")]
    DuplicateFieldId { id: String },

    /// The operation is disabled while previewing
    #[error("operation not available in preview mode")]
    PreviewMode,

    /// `id` and `type` cannot be rewritten through property edits
    #[error("property '{key}' is immutable")]
    ImmutableProperty { key: String },

    /// A property edit produced a shape the variant cannot hold
    #[error("invalid value for property '{key}': {message}")]
    InvalidProperty { key: String, message: String },

    /// The submitted order is not a permutation of the current field ids
    #[error("invalid reorder: {message}")]
    InvalidReorder { message: String },

    /// A drag operation was applied without an active drag
    #[error("no active drag")]
    NoActiveDrag,
}

impl SessionError {
    pub fn field_not_found(id: impl std::fmt::Display) -> Self {
        Self::FieldNotFound { id: id.to_string() }
    }

    pub fn invalid_property(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid_reorder(message: impl Into<String>) -> Self {
        Self::InvalidReorder {
            message: message.into(),
        }
    }
}

/// Errors that can occur during a save round trip.
///
/// Discriminated variants, never string matching: the caller decides retry
/// policy per variant (transport failures are retryable, conflicts are not).
#[derive(Debug, Error)]
pub enum SaveError {
    /// A save is already in flight for this session
    #[error("a save is already in progress")]
    SaveInFlight,

    /// The form failed client-side validation before submission
    #[error("form is not valid: {message}")]
    Validation { message: String },

    /// The caller's role does not permit saving
    #[error("not authorized to save this form")]
    Authorization,

    /// The form no longer exists on the server
    #[error("form not found: {id}")]
    NotFound { id: String },

    /// Another writer saved first; reload before retrying
    #[error("version conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    /// The store could not be reached or failed mid-flight
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<formsmith_store::StoreError> for SaveError {
    fn from(err: formsmith_store::StoreError) -> Self {
        use formsmith_store::StoreError;
        match err {
            StoreError::PreconditionFailed { expected, found } => {
                Self::Conflict { expected, found }
            }
            StoreError::Forbidden { .. } => Self::Authorization,
            StoreError::FormNotFound { id } => Self::NotFound { id },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsmith_store::StoreError;

    #[test]
    fn test_error_display() {
        let err = SessionError::field_not_found("f1");
        assert_eq!(err.to_string(), "field not found: f1");
    }

    #[test]
    fn store_errors_map_to_discriminated_save_errors() {
        let conflict: SaveError = StoreError::PreconditionFailed {
            expected: 2,
            found: 3,
        }
        .into();
        assert!(matches!(
            conflict,
            SaveError::Conflict {
                expected: 2,
                found: 3
            }
        ));

        let not_found: SaveError = StoreError::form_not_found("01X").into();
        assert!(matches!(not_found, SaveError::NotFound { .. }));

        let busy: SaveError = StoreError::LockBusy.into();
        assert!(matches!(busy, SaveError::Transport(_)));
    }
}
