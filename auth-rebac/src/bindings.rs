use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::normalize_code;
use crate::error::{AuthzError, Result};
use crate::models::{Applicability, RoleScope};

/// One `(object, relation)` target granted by a permission code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingTemplate {
    pub scope: Applicability,
    pub object: String,
    pub relation: String,
}

impl BindingTemplate {
    pub fn new(scope: Applicability, object: &str, relation: &str) -> Self {
        Self {
            scope,
            object: object.to_string(),
            relation: relation.to_string(),
        }
    }

    pub fn applies_to(&self, role_scope: RoleScope) -> bool {
        self.scope.admits(role_scope)
    }
}

fn global(object: &str, relation: &str) -> BindingTemplate {
    BindingTemplate::new(Applicability::Global, object, relation)
}

fn tenant(object: &str, relation: &str) -> BindingTemplate {
    BindingTemplate::new(Applicability::Tenant, object, relation)
}

/// Permission code to binding templates. Built once and shared read-only.
///
/// The YAML form is a mapping of code to a list of `{scope, object, relation}`:
///
/// ```yaml
/// role.manage:
///   - { scope: tenant, object: api/v1/roles, relation: editors }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingTable {
    entries: BTreeMap<String, Vec<BindingTemplate>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, code: &str, templates: Vec<BindingTemplate>) -> Self {
        self.entries
            .entry(normalize_code(code))
            .or_default()
            .extend(templates);
        self
    }

    /// Table used by the portal deployment.
    pub fn standard() -> Self {
        Self::new()
            .with(
                "tenant.manage",
                vec![
                    global("api/v1/tenants", "admins"),
                    global("api/v1/tenants/:uuid", "admins"),
                ],
            )
            .with(
                "tenant.view",
                vec![
                    global("api/v1/tenants", "viewers"),
                    global("api/v1/tenants/:uuid", "viewers"),
                ],
            )
            .with(
                "role.manage",
                vec![
                    tenant("api/v1/roles", "editors"),
                    tenant("api/v1/roles/:uuid", "editors"),
                ],
            )
            .with(
                "role.assign",
                vec![
                    tenant("api/v1/roles/:uuid/members", "editors"),
                    tenant("api/v1/roles/:uuid/members/:uuid", "editors"),
                ],
            )
            .with(
                "role.view",
                vec![
                    tenant("api/v1/roles", "viewers"),
                    tenant("api/v1/roles/:uuid", "viewers"),
                    tenant("api/v1/roles/:uuid/members", "viewers"),
                    tenant("api/v1/permissions", "viewers"),
                    global("api/v1/permissions", "viewers"),
                ],
            )
            .with(
                "group.manage",
                vec![
                    tenant("api/v1/groups", "editors"),
                    tenant("api/v1/groups/:uuid", "editors"),
                    tenant("api/v1/groups/:uuid/members", "editors"),
                    tenant("api/v1/groups/:uuid/members/:uuid", "editors"),
                ],
            )
            .with(
                "group.view",
                vec![
                    tenant("api/v1/groups", "viewers"),
                    tenant("api/v1/groups/:uuid", "viewers"),
                    tenant("api/v1/groups/:uuid/members", "viewers"),
                ],
            )
            .with(
                "group.member.manage",
                vec![
                    tenant("api/v1/groups/:uuid/members", "editors"),
                    tenant("api/v1/groups/:uuid/members/:uuid", "editors"),
                ],
            )
            .with("user.invite", vec![tenant("api/v1/users", "editors")])
            .with(
                "user.disable",
                vec![
                    tenant("api/v1/users", "editors"),
                    tenant("api/v1/users/:uuid", "editors"),
                ],
            )
            .with(
                "user.view",
                vec![
                    tenant("api/v1/users", "viewers"),
                    tenant("api/v1/users/:uuid", "viewers"),
                ],
            )
    }

    /// Load an alternate table.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Configuration`] when the document does not parse.
    pub fn from_yaml(source: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<BindingTemplate>> = serde_yaml::from_str(source)
            .map_err(|e| AuthzError::Configuration(format!("invalid binding table: {e}")))?;

        Ok(raw
            .into_iter()
            .fold(Self::new(), |table, (code, templates)| table.with(&code, templates)))
    }

    /// Templates for a code; empty when the code grants nothing.
    pub fn templates(&self, code: &str) -> &[BindingTemplate] {
        self.entries
            .get(&normalize_code(code))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
