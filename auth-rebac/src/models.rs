use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AuthzError, Result};

/// Scope token used for roles and requests that are not bound to a tenant.
pub const GLOBAL_SCOPE: &str = "global";

/// Where a role lives: platform-wide or inside one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    Global,
    Tenant,
}

impl RoleScope {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleScope::Global => "global",
            RoleScope::Tenant => "tenant",
        }
    }

    /// Parse a stored or user supplied scope name.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidRole`] for anything other than `global` or `tenant`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "global" => Ok(RoleScope::Global),
            "tenant" => Ok(RoleScope::Tenant),
            other => Err(AuthzError::InvalidRole(format!("unknown role scope {other:?}"))),
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which role scopes a permission or binding template admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
    Global,
    Tenant,
    Any,
}

impl Applicability {
    pub fn admits(self, scope: RoleScope) -> bool {
        match self {
            Applicability::Any => true,
            Applicability::Global => scope == RoleScope::Global,
            Applicability::Tenant => scope == RoleScope::Tenant,
        }
    }

    /// Lenient parse for catalog rows; unrecognised values admit any scope.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "global" => Applicability::Global,
            "tenant" => Applicability::Tenant,
            _ => Applicability::Any,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Applicability::Global => "global",
            Applicability::Tenant => "tenant",
            Applicability::Any => "any",
        }
    }
}

/// Scope token for an optional tenant id: the trimmed id, or `global`.
pub fn scope_token(tenant_id: Option<&str>) -> String {
    match tenant_id.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tenant) => tenant.to_string(),
        None => GLOBAL_SCOPE.to_string(),
    }
}

/// Entry of the permission catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub code: String,
    pub scope: Applicability,
    pub description: String,
}

impl Permission {
    pub fn new(code: &str, scope: Applicability, description: &str) -> Self {
        Self {
            code: code.to_string(),
            scope,
            description: description.to_string(),
        }
    }
}

/// A named bundle of permission codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub scope: RoleScope,
    pub tenant_id: Option<Uuid>,
    pub code: String,
    pub permissions: Vec<String>,
    pub version: i32,
}

impl Role {
    pub fn global(code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope: RoleScope::Global,
            tenant_id: None,
            code: code.to_string(),
            permissions: Vec::new(),
            version: 1,
        }
    }

    pub fn tenant(tenant_id: Uuid, code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope: RoleScope::Tenant,
            tenant_id: Some(tenant_id),
            code: code.to_string(),
            permissions: Vec::new(),
            version: 1,
        }
    }

    #[must_use]
    pub fn with_permissions<S: AsRef<str>>(mut self, permissions: &[S]) -> Self {
        self.permissions = permissions.iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    /// `global` for global roles, the tenant id for tenant roles.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidRole`] when the tenant id does not agree with the scope.
    pub fn scope_token(&self) -> Result<String> {
        match (self.scope, self.tenant_id) {
            (RoleScope::Global, None) => Ok(GLOBAL_SCOPE.to_string()),
            (RoleScope::Tenant, Some(tenant)) => Ok(tenant.to_string()),
            (RoleScope::Tenant, None) => Err(AuthzError::InvalidRole(format!(
                "tenant role {} has no tenant id",
                self.code
            ))),
            (RoleScope::Global, Some(_)) => Err(AuthzError::InvalidRole(format!(
                "global role {} must not carry a tenant id",
                self.code
            ))),
        }
    }
}

/// A concrete `(object, relation)` pair derived for a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedBinding {
    pub object: String,
    pub relation: String,
}

impl ResolvedBinding {
    pub fn new(object: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            relation: relation.into(),
        }
    }

    /// Identity used for set comparison: `relation|object`.
    pub fn key(&self) -> String {
        format!("{}|{}", self.relation, self.object)
    }
}

/// "Every member of `namespace:object` via `relation`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectSet {
    pub namespace: String,
    pub object: String,
    pub relation: String,
}

impl SubjectSet {
    pub fn new(
        namespace: impl Into<String>,
        object: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            object: object.into(),
            relation: relation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Id(String),
    Set(SubjectSet),
}

impl Subject {
    pub fn id(id: impl Into<String>) -> Self {
        Subject::Id(id.into())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Id(id) => f.write_str(id),
            Subject::Set(set) => write!(f, "{}:{}#{}", set.namespace, set.object, set.relation),
        }
    }
}

/// `namespace:object#relation@subject` stored in the relation engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationTuple {
    pub namespace: String,
    pub object: String,
    pub relation: String,
    pub subject: Subject,
}

impl RelationTuple {
    pub fn new(
        namespace: impl Into<String>,
        object: impl Into<String>,
        relation: impl Into<String>,
        subject: Subject,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            object: object.into(),
            relation: relation.into(),
            subject,
        }
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}",
            self.namespace, self.object, self.relation, self.subject
        )
    }
}

/// Input to an authorization check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(default)]
    pub namespace: Option<String>,
    pub object: String,
    pub action: String,
    pub subject: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AuthorizationRequest {
    pub fn new(object: &str, action: &str, subject: &str) -> Self {
        Self {
            object: object.to_string(),
            action: action.to_string(),
            subject: subject.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    #[must_use]
    pub fn with_roles<S: AsRef<str>>(mut self, roles: &[S]) -> Self {
        self.roles = roles.iter().map(|r| r.as_ref().to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    MissingSubject,
    PlatformAdmin,
    Checked {
        namespace: String,
        object: String,
        relation: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}
