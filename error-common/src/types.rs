use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a failure, used to pick an HTTP status and a log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller sent something that can be fixed and resent.
    Validation,
    /// A duplicate code or identifier at the relational layer.
    Conflict,
    /// The addressed record does not exist.
    NotFound,
    /// A downstream service (relation engine, database) could not answer.
    Unavailable,
    /// Anything else, including misconfiguration.
    Internal,
}

impl ErrorKind {
    /// HTTP status code conventionally returned for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unavailable | ErrorKind::Internal => 500,
        }
    }

    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::NotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// JSON error body returned by HTTP handlers.
///
/// Server-side failures carry a generic message; the detailed cause only goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }
}

/// Log a failure at a level matching its kind.
pub fn log_error(context: &str, kind: ErrorKind, error: &dyn std::error::Error) {
    if kind.is_client_error() {
        tracing::warn!(context = context, kind = %kind, error = %error, "request rejected");
    } else {
        tracing::error!(context = context, kind = %kind, error = %error, "request failed");
    }
}
