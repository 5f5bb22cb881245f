use thiserror::Error;

use crate::database::DatabaseError;

/// Failures of user management operations.
///
/// Every variant is terminal for the call that produced it. `field` names the
/// request field (wire name) the failure relates to.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("{reason}")]
    Conflict { field: &'static str, reason: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { field: &'static str, reason: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl UserError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        UserError::Validation { field, reason: reason.into() }
    }

    pub fn not_found(what: &'static str) -> Self {
        UserError::NotFound { what }
    }

    pub fn conflict(field: &'static str, reason: impl Into<String>) -> Self {
        UserError::Conflict { field, reason: reason.into() }
    }

    pub fn permission_denied(field: &'static str, reason: impl Into<String>) -> Self {
        UserError::PermissionDenied { field, reason: reason.into() }
    }
}
