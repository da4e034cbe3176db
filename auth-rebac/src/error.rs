use error_common::{codes, ErrorKind};
use thiserror::Error;

use crate::models::RoleScope;

/// Failures raised by the local persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("Unknown permission code: {0}")]
    UnknownPermission(String),

    #[error("Permission {code} is not allowed for {role_scope} roles")]
    ScopeMismatch { code: String, role_scope: RoleScope },

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Relation engine request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Relation engine returned status {status}")]
    EngineStatus { status: u16 },

    #[error("Relation engine response could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthzError {
    /// Coarse classification used by the HTTP edge to pick a status code.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthzError::UnknownPermission(_)
            | AuthzError::ScopeMismatch { .. }
            | AuthzError::InvalidRole(_)
            | AuthzError::InvalidIdentifier(_) => ErrorKind::Validation,
            AuthzError::Configuration(_) => ErrorKind::Internal,
            AuthzError::Transport(_) | AuthzError::EngineStatus { .. } | AuthzError::Decode(_) => {
                ErrorKind::Unavailable
            }
            AuthzError::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            AuthzError::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            AuthzError::Store(StoreError::Backend(_)) => ErrorKind::Unavailable,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::UnknownPermission(_) => codes::validation::UNKNOWN_PERMISSION,
            AuthzError::ScopeMismatch { .. } => codes::validation::SCOPE_MISMATCH,
            AuthzError::InvalidRole(_) => codes::validation::INVALID_INPUT,
            AuthzError::InvalidIdentifier(_) => codes::validation::INVALID_IDENTIFIER,
            AuthzError::Configuration(_) => codes::authorization::MISCONFIGURED,
            AuthzError::Transport(_) | AuthzError::Decode(_) => {
                codes::authorization::ENGINE_UNAVAILABLE
            }
            AuthzError::EngineStatus { .. } => codes::authorization::ENGINE_REJECTED,
            AuthzError::Store(StoreError::NotFound(_)) => codes::database::NOT_FOUND,
            AuthzError::Store(StoreError::Conflict(_)) => codes::database::CONSTRAINT_VIOLATION,
            AuthzError::Store(StoreError::Backend(_)) => codes::database::QUERY_FAILED,
        }
    }

    /// True when the request was rejected before any remote or local write.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_client_kind() {
        let err = AuthzError::ScopeMismatch {
            code: "tenant.manage".to_string(),
            role_scope: RoleScope::Tenant,
        };
        assert!(err.is_validation());
        assert_eq!(err.kind().http_status(), 400);
        assert_eq!(err.code(), codes::validation::SCOPE_MISMATCH);
        assert_eq!(
            err.to_string(),
            "Permission tenant.manage is not allowed for tenant roles"
        );
    }

    #[test]
    fn engine_failures_are_unavailable() {
        let err = AuthzError::EngineStatus { status: 503 };
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(!err.is_validation());
    }

    #[test]
    fn store_errors_keep_their_kind() {
        let conflict = AuthzError::from(StoreError::Conflict("duplicate".to_string()));
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let missing = AuthzError::from(StoreError::NotFound("role".to_string()));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
