use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::client::RelationTupleClient;
use crate::config::RelationLayout;
use crate::error::Result;
use crate::models::{scope_token, AuthorizationRequest, Decision, DecisionReason};

/// Role names that bypass the relation engine entirely.
pub const PLATFORM_ADMIN_ROLES: [&str; 2] = ["platform_admin", "platform-admin"];

/// Placeholder for UUID path segments in authorization objects.
pub const UUID_TOKEN: &str = ":uuid";

/// Whether any claimed role is a platform admin marker, ignoring case.
///
/// Holders are allowed everything without an engine check. This is the trust
/// boundary of the role claim source.
pub fn is_platform_admin<S: AsRef<str>>(roles: &[S]) -> bool {
    roles.iter().any(|role| {
        let role = role.as_ref().trim();
        PLATFORM_ADMIN_ROLES
            .iter()
            .any(|admin| role.eq_ignore_ascii_case(admin))
    })
}

fn is_canonical_uuid(segment: &str) -> bool {
    segment.len() == 36
        && segment.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

/// Clean a request path into an authorization object.
///
/// Dot segments are resolved, the leading slash is dropped and canonical UUID
/// segments become `:uuid`. An empty result is `/`.
pub fn normalize_object(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    segments
        .into_iter()
        .map(|segment| {
            if is_canonical_uuid(segment) {
                UUID_TOKEN
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a comma separated role list, trimming entries and dropping
/// case-insensitive duplicates.
pub fn parse_role_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty() && seen.insert(role.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Request-time authorization decisions.
pub struct AuthorizationResolver {
    client: Arc<dyn RelationTupleClient>,
    layout: RelationLayout,
}

impl AuthorizationResolver {
    pub fn new(client: Arc<dyn RelationTupleClient>, layout: RelationLayout) -> Self {
        Self { client, layout }
    }

    /// Namespace and object checked for `request`.
    pub fn resolve_target(&self, request: &AuthorizationRequest) -> (String, String) {
        let object = normalize_object(&request.object);
        if let Some(namespace) = request.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            return (namespace.to_string(), object);
        }

        let scope = scope_token(request.tenant_id.as_deref());
        (
            self.layout.namespace().to_string(),
            format!("{scope}:{object}"),
        )
    }

    /// Decide `request`.
    ///
    /// A missing subject is denied and platform admins are allowed, both
    /// without contacting the engine.
    ///
    /// # Errors
    ///
    /// Engine failures are returned as errors, never as a denial.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> Result<Decision> {
        let subject = request.subject.trim();
        if subject.is_empty() {
            debug!(object = %request.object, "denied request without subject");
            return Ok(Decision::deny(DecisionReason::MissingSubject));
        }

        if is_platform_admin(&request.roles) {
            info!(subject, object = %request.object, "platform admin bypass");
            return Ok(Decision::allow(DecisionReason::PlatformAdmin));
        }

        let (namespace, object) = self.resolve_target(request);
        let relation = self.layout.resolve_relation(&request.action);

        let allowed = self
            .client
            .check(&namespace, &object, &relation, subject)
            .await
            .map_err(|err| {
                error!(
                    subject,
                    namespace = %namespace,
                    object = %object,
                    relation = %relation,
                    error = %err,
                    "authorization check failed"
                );
                err
            })?;

        debug!(subject, namespace = %namespace, object = %object, relation = %relation, allowed, "authorization decided");
        let reason = DecisionReason::Checked {
            namespace,
            object,
            relation,
        };
        Ok(if allowed {
            Decision::allow(reason)
        } else {
            Decision::deny(reason)
        })
    }
}
