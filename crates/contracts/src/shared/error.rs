//! Error taxonomy for the CRUD workflow.
//!
//! No automatic retries anywhere: every variant maps to one recovery
//! path the user drives by re-triggering the action.

use thiserror::Error;

/// One failing field: dotted path + message, surfaced inline next to
/// the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrudError {
    /// Field rule or async-validator rejection. Submit is blocked, all
    /// failing fields surface at once, nothing leaves the client.
    #[error("validation failed for {} field(s)", .0.len())]
    LocalValidation(Vec<FieldError>),

    /// Server-side rejection of a create/update (duplicate version and
    /// the like). The draft is preserved so the user can correct it.
    #[error("{0}")]
    RemoteRejection(String),

    /// Network or server failure; the operation is abandoned and must
    /// be retried manually.
    #[error("request failed: {0}")]
    Transport(String),

    /// Update/delete target already gone; the list is refreshed to
    /// reconcile the view.
    #[error("record not found")]
    NotFound,
}

impl CrudError {
    /// Message suitable for a transient notification.
    pub fn notification(&self) -> String {
        match self {
            Self::LocalValidation(errors) => errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "validation failed".to_string()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CrudError::RemoteRejection("Version already exists".into());
        assert_eq!(err.to_string(), "Version already exists");
        assert_eq!(CrudError::NotFound.to_string(), "record not found");
    }

    #[test]
    fn test_local_validation_counts_fields() {
        let err = CrudError::LocalValidation(vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("alias", "Alias is required"),
        ]);
        assert_eq!(err.to_string(), "validation failed for 2 field(s)");
        assert_eq!(err.notification(), "Name is required");
    }
}
