use std::collections::{BTreeMap, HashSet};

use crate::error::{AuthzError, Result};
use crate::models::{Applicability, Permission, RoleScope};

/// Canonical form of a permission code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Read-only lookup of permission code to declared scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    entries: BTreeMap<String, Permission>,
}

impl PermissionCatalog {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let entries = permissions
            .into_iter()
            .map(|mut permission| {
                permission.code = normalize_code(&permission.code);
                (permission.code.clone(), permission)
            })
            .collect();
        Self { entries }
    }

    /// Codes shipped with the standard binding table.
    pub fn builtin() -> Self {
        use Applicability::{Any, Global, Tenant};

        Self::new([
            Permission::new("tenant.manage", Global, "Create, update and delete tenants"),
            Permission::new("tenant.view", Global, "List and read tenants"),
            Permission::new("role.manage", Tenant, "Create, update and delete roles"),
            Permission::new("role.assign", Tenant, "Assign roles to users"),
            Permission::new("role.view", Any, "List roles and permissions"),
            Permission::new("group.manage", Tenant, "Create, update and delete groups"),
            Permission::new("group.view", Tenant, "List and read groups"),
            Permission::new("group.member.manage", Tenant, "Add and remove group members"),
            Permission::new("user.invite", Tenant, "Invite users into a tenant"),
            Permission::new("user.disable", Tenant, "Disable users"),
            Permission::new("user.view", Tenant, "List and read users"),
        ])
    }

    pub fn get(&self, code: &str) -> Option<&Permission> {
        self.entries.get(&normalize_code(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by code.
    pub fn list(&self) -> impl Iterator<Item = &Permission> {
        self.entries.values()
    }

    /// Trim, lower-case and de-duplicate `requested`, keeping first occurrence order.
    ///
    /// # Errors
    ///
    /// [`AuthzError::UnknownPermission`] for a code missing from the catalog and
    /// [`AuthzError::ScopeMismatch`] for a code the role's scope may not carry.
    pub fn normalize<S: AsRef<str>>(
        &self,
        role_scope: RoleScope,
        requested: &[S],
    ) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut codes = Vec::with_capacity(requested.len());

        for raw in requested {
            let code = normalize_code(raw.as_ref());
            if code.is_empty() || !seen.insert(code.clone()) {
                continue;
            }

            let permission = self
                .entries
                .get(&code)
                .ok_or_else(|| AuthzError::UnknownPermission(raw.as_ref().trim().to_string()))?;

            if !permission.scope.admits(role_scope) {
                return Err(AuthzError::ScopeMismatch { code, role_scope });
            }

            codes.push(code);
        }

        Ok(codes)
    }
}
