//! Request middleware.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::error::ApiError;
use crate::settings::WebhookCredentials;
use crate::AppState;

/// CORS for the browser portal; identity comes from proxy headers, not cookies.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, PartialEq, Eq)]
enum BasicAuthRejection {
    NotConfigured,
    Missing,
    Malformed,
    Mismatch,
}

impl BasicAuthRejection {
    fn as_str(&self) -> &'static str {
        match self {
            BasicAuthRejection::NotConfigured => "webhook credentials are not configured",
            BasicAuthRejection::Missing => "missing or invalid auth header",
            BasicAuthRejection::Malformed => "invalid basic auth header",
            BasicAuthRejection::Mismatch => "basic auth credentials mismatch",
        }
    }
}

fn check_basic_auth(
    headers: &HeaderMap,
    expected: &WebhookCredentials,
) -> Result<(), BasicAuthRejection> {
    if expected.username.is_empty() || expected.password.is_empty() {
        return Err(BasicAuthRejection::NotConfigured);
    }

    let encoded = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .ok_or(BasicAuthRejection::Missing)?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| BasicAuthRejection::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthRejection::Malformed)?;
    let (user, pass) = decoded
        .split_once(':')
        .ok_or(BasicAuthRejection::Malformed)?;

    let user_match = user.as_bytes().ct_eq(expected.username.as_bytes());
    let pass_match = pass.as_bytes().ct_eq(expected.password.as_bytes());
    if bool::from(user_match & pass_match) {
        Ok(())
    } else {
        Err(BasicAuthRejection::Mismatch)
    }
}

/// Guard for identity-provider webhooks: HTTP Basic auth against the
/// configured webhook credentials.
pub async fn require_webhook_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(rejection) = check_basic_auth(request.headers(), &state.webhook) {
        let presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        warn!(
            authorization = %state.redactor.redact(presented),
            path = %request.uri().path(),
            "{}",
            rejection.as_str()
        );
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}
