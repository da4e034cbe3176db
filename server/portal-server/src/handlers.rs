//! Route handlers.

use auth_rebac::{parse_role_list, AuthorizationRequest, DecisionReason};
use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::AppState;

/// Object that any caller may read, so the UI can bootstrap.
pub const SELF_OBJECT: &str = "/api/v1/me";

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<Identity> {
    Json(Identity::from_headers(&headers, &state.identity_headers))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizePayload {
    pub namespace: String,
    pub object: String,
    pub action: String,
    pub subject: String,
    pub user_type: String,
    pub tenant_id: String,
    /// Comma separated role list
    pub roles: String,
}

impl AuthorizePayload {
    /// Decode the request body, falling back to the request line when the
    /// body is missing, malformed or lacks an object or action.
    pub fn from_request(body: &[u8], method: &Method, uri: &Uri) -> Self {
        let mut payload: Self = serde_json::from_slice(body).unwrap_or_default();
        if payload.object.is_empty() || payload.action.is_empty() {
            payload.object = uri.path().to_string();
            payload.action = method.as_str().to_string();
            payload.namespace.clear();
        }
        payload
    }

    fn is_self_lookup(&self) -> bool {
        self.object == SELF_OBJECT
            && (self.action.is_empty() || self.action.eq_ignore_ascii_case(Method::GET.as_str()))
    }
}

pub async fn authorize(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = AuthorizePayload::from_request(&body, &method, &uri);
    info!(object = %payload.object, action = %payload.action, "authorize request");

    if payload.is_self_lookup() {
        return Ok(Json(json!({ "allowed": true })).into_response());
    }

    let mut identity = Identity::from_headers(&headers, &state.identity_headers);
    if identity.is_anonymous() {
        identity = Identity {
            subject: payload.subject.trim().to_string(),
            user_type: payload.user_type.trim().to_string(),
            tenant_id: payload.tenant_id.trim().to_string(),
            roles: parse_role_list(&payload.roles),
        };
    }

    let mut request = AuthorizationRequest::new(&payload.object, &payload.action, &identity.subject)
        .with_tenant(&identity.tenant_id)
        .with_roles(&identity.roles);
    if !payload.namespace.is_empty() {
        request = request.with_namespace(&payload.namespace);
    }

    let decision = state.authorizer.authorize(&request).await?;
    if decision.reason == DecisionReason::MissingSubject {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({ "allowed": false, "reason": "missing subject" })),
        )
            .into_response());
    }

    Ok(Json(json!({ "allowed": decision.allowed })).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationHook {
    pub identity: RegisteredIdentity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisteredIdentity {
    pub id: String,
    pub traits: IdentityTraits,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdentityTraits {
    pub phone: String,
    pub user_type: String,
    pub tenant_id: String,
    pub roles: Vec<String>,
}

/// Identity-provider registration webhook: writes membership tuples for
/// the roles the new identity claims.
pub async fn registration_hook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let hook: RegistrationHook = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "invalid registration payload");
        ApiError::bad_request("invalid payload")
    })?;

    let identity = hook.identity.id.trim();
    if identity.is_empty() {
        return Err(ApiError::bad_request("missing identity id"));
    }

    let traits = &hook.identity.traits;
    if traits.roles.is_empty() {
        info!(identity, "registration hook executed without roles");
        return Ok(StatusCode::NO_CONTENT);
    }

    let tenant = Some(traits.tenant_id.as_str()).filter(|t| !t.trim().is_empty());
    let written = state
        .memberships
        .assign_roles(tenant, &traits.roles, identity)
        .await
        .map_err(|source| ApiError::Internal {
            message: "failed to assign role",
            source,
        })?;

    info!(
        identity,
        roles = ?traits.roles,
        tenant = %traits.tenant_id,
        phone = %state.redactor.redact(&traits.phone),
        written,
        "assigned roles for identity"
    );
    Ok(StatusCode::NO_CONTENT)
}
