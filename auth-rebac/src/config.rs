use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AuthzError, Result};
use crate::models::{scope_token, RelationTuple, Role, Subject, SubjectSet};

pub const DEFAULT_NAMESPACE: &str = "Tenant";
pub const DEFAULT_GROUP_NAMESPACE: &str = "Group";
pub const DEFAULT_MEMBERSHIP_RELATION: &str = "member";
pub const FALLBACK_RELATION: &str = "can";
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Connection and naming settings for the Keto relation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KetoConfig {
    pub read_remote: String,
    pub write_remote: Option<String>,
    pub namespace_prefix: String,
    pub group_namespace: String,
    pub permission_relation: Option<String>,
    pub membership_relation: String,
    pub request_timeout_ms: u64,
}

impl Default for KetoConfig {
    fn default() -> Self {
        Self {
            read_remote: String::new(),
            write_remote: None,
            namespace_prefix: DEFAULT_NAMESPACE.to_string(),
            group_namespace: DEFAULT_GROUP_NAMESPACE.to_string(),
            permission_relation: None,
            membership_relation: DEFAULT_MEMBERSHIP_RELATION.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl KetoConfig {
    pub fn new(read_remote: &str) -> Self {
        Self {
            read_remote: read_remote.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_write_remote(mut self, write_remote: &str) -> Self {
        self.write_remote = Some(write_remote.to_string());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_ms == 0 {
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.request_timeout_ms)
        }
    }

    /// Parsed read endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Configuration`] when the remote is missing or not a URL.
    pub fn read_endpoint(&self) -> Result<Url> {
        parse_remote("read", &self.read_remote)
    }

    /// Parsed write endpoint; `None` when no write remote is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Configuration`] when the remote is set but not a URL.
    pub fn write_endpoint(&self) -> Result<Option<Url>> {
        self.write_remote
            .as_deref()
            .map(str::trim)
            .filter(|remote| !remote.is_empty())
            .map(|remote| parse_remote("write", remote))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns [`AuthzError::Configuration`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.read_endpoint()?;
        self.write_endpoint()?;
        Ok(())
    }
}

fn parse_remote(name: &str, raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AuthzError::Configuration(format!(
            "keto {name} remote is not configured"
        )));
    }
    Url::parse(raw)
        .map_err(|e| AuthzError::Configuration(format!("invalid keto {name} remote {raw:?}: {e}")))
}

/// Namespace names, relations and object shapes used in the relation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationLayout {
    namespace: String,
    group_namespace: String,
    membership_relation: String,
    default_relation: Option<String>,
}

impl Default for RelationLayout {
    fn default() -> Self {
        Self::from_config(&KetoConfig::default())
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

impl RelationLayout {
    pub fn from_config(config: &KetoConfig) -> Self {
        Self {
            namespace: non_empty_or(&config.namespace_prefix, DEFAULT_NAMESPACE),
            group_namespace: non_empty_or(&config.group_namespace, DEFAULT_GROUP_NAMESPACE),
            membership_relation: non_empty_or(
                &config.membership_relation,
                DEFAULT_MEMBERSHIP_RELATION,
            ),
            default_relation: config
                .permission_relation
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn group_namespace(&self) -> &str {
        &self.group_namespace
    }

    pub fn membership_relation(&self) -> &str {
        &self.membership_relation
    }

    /// The requested action, else the configured default, else `can`.
    pub fn resolve_relation(&self, action: &str) -> String {
        let action = action.trim();
        if !action.is_empty() {
            return action.to_string();
        }
        self.default_relation
            .clone()
            .unwrap_or_else(|| FALLBACK_RELATION.to_string())
    }

    /// Object naming a role inside the tenant namespace: `<scope>:<role_code>`.
    pub fn role_object(&self, scope: &str, role_code: &str) -> String {
        format!("{scope}:{role_code}")
    }

    /// The subject set "members of this role", used as grantee for bindings.
    ///
    /// # Errors
    ///
    /// Fails when the role's tenant id disagrees with its scope.
    pub fn role_members(&self, role: &Role) -> Result<SubjectSet> {
        let scope = role.scope_token()?;
        Ok(SubjectSet::new(
            self.namespace.clone(),
            self.role_object(&scope, &role.code),
            self.membership_relation.clone(),
        ))
    }

    /// Tuple recording that `identity` holds `role`.
    ///
    /// # Errors
    ///
    /// Fails when the role's tenant id disagrees with its scope.
    pub fn role_membership(&self, role: &Role, identity: &str) -> Result<RelationTuple> {
        let scope = role.scope_token()?;
        Ok(self.role_membership_by_code(&scope, &role.code, identity))
    }

    /// Same as [`Self::role_membership`] when only the scope token and role code are known.
    pub fn role_membership_by_code(
        &self,
        scope: &str,
        role_code: &str,
        identity: &str,
    ) -> RelationTuple {
        RelationTuple::new(
            self.namespace.clone(),
            self.role_object(scope, role_code),
            self.membership_relation.clone(),
            Subject::id(identity),
        )
    }

    /// `<tenant|global>:group:<group_id>`.
    pub fn group_object(&self, tenant_id: Option<&str>, group_id: &str) -> String {
        format!("{}:group:{group_id}", scope_token(tenant_id))
    }

    pub fn group_membership(
        &self,
        tenant_id: Option<&str>,
        group_id: &str,
        identity: &str,
    ) -> RelationTuple {
        RelationTuple::new(
            self.group_namespace.clone(),
            self.group_object(tenant_id, group_id),
            self.membership_relation.clone(),
            Subject::id(identity),
        )
    }
}
