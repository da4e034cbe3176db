use auth_rebac::AuthzError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{codes, log_error, ErrorBody, ErrorKind};
use thiserror::Error;

pub const ENGINE_UNAVAILABLE_MESSAGE: &str = "authorization service unavailable";

/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        source: AuthzError,
    },

    #[error(transparent)]
    Authorization(#[from] AuthzError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) | ApiError::Unauthorized => ErrorKind::Validation,
            ApiError::Authorization(err) => err.kind(),
            ApiError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::from_u16(self.kind().http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest(message) => {
                ErrorBody::new(message.clone()).with_code(codes::validation::INVALID_INPUT)
            }
            ApiError::Unauthorized => ErrorBody::new("unauthorized")
                .with_code(codes::authentication::INVALID_CREDENTIALS),
            ApiError::Internal { message, .. } => ErrorBody::new(*message),
            ApiError::Authorization(err) => match err.kind() {
                ErrorKind::Unavailable => ErrorBody::new(ENGINE_UNAVAILABLE_MESSAGE),
                ErrorKind::Internal => ErrorBody::new("internal error").with_code(err.code()),
                _ => ErrorBody::new(err.to_string()).with_code(err.code()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        log_error("portal-server", kind, &self);
        (self.status_code(), Json(self.body())).into_response()
    }
}
