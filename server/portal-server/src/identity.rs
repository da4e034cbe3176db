use auth_rebac::parse_role_list;
use axum::http::HeaderMap;
use serde::Serialize;

use crate::settings::IdentityHeaders;

/// Caller identity forwarded by the authenticating proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub user_type: String,
    pub tenant_id: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Read the identity headers; missing or non-UTF-8 headers are empty.
    pub fn from_headers(headers: &HeaderMap, names: &IdentityHeaders) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            subject: read(&names.subject_header),
            user_type: read(&names.user_type_header),
            tenant_id: read(&names.tenant_header),
            roles: parse_role_list(&read(&names.roles_header)),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject.is_empty()
    }
}
