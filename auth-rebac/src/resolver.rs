use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::bindings::BindingTable;
use crate::catalog::PermissionCatalog;
use crate::error::Result;
use crate::models::{ResolvedBinding, Role};

/// Resolved bindings keyed by [`ResolvedBinding::key`]; ordered so diffs are deterministic.
pub type BindingSet = BTreeMap<String, ResolvedBinding>;

/// Expands a role's permission codes into concrete engine bindings.
#[derive(Debug, Clone)]
pub struct BindingResolver {
    catalog: Arc<PermissionCatalog>,
    table: Arc<BindingTable>,
}

impl BindingResolver {
    pub fn new(catalog: Arc<PermissionCatalog>, table: Arc<BindingTable>) -> Self {
        Self { catalog, table }
    }

    /// Built-in catalog and standard table.
    pub fn standard() -> Self {
        Self::new(
            Arc::new(PermissionCatalog::builtin()),
            Arc::new(BindingTable::standard()),
        )
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    /// Resolve `permissions` for `role`.
    ///
    /// An empty permission list resolves to an empty set without inspecting the role.
    ///
    /// # Errors
    ///
    /// Unknown codes, codes outside the role's scope, and roles whose tenant id
    /// disagrees with their scope.
    pub fn resolve_bindings<S: AsRef<str>>(
        &self,
        role: &Role,
        permissions: &[S],
    ) -> Result<BindingSet> {
        let codes = self.catalog.normalize(role.scope, permissions)?;
        let mut bindings = BindingSet::new();
        if codes.is_empty() {
            return Ok(bindings);
        }

        let scope = role.scope_token()?;
        for code in &codes {
            for template in self.table.templates(code) {
                if !template.applies_to(role.scope) {
                    continue;
                }
                let binding = ResolvedBinding::new(
                    format!("{scope}:{}", template.object),
                    template.relation.clone(),
                );
                bindings.insert(binding.key(), binding);
            }
        }

        debug!(
            role = %role.code,
            scope = %scope,
            codes = codes.len(),
            bindings = bindings.len(),
            "resolved role bindings"
        );
        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;
    use uuid::Uuid;

    #[test]
    fn tenant_role_bindings_are_tenant_qualified() {
        let tenant = Uuid::new_v4();
        let role = Role::tenant(tenant, "support");
        let bindings = BindingResolver::standard()
            .resolve_bindings(&role, &["role.manage"])
            .unwrap();

        let keys: Vec<&str> = bindings.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                format!("editors|{tenant}:api/v1/roles"),
                format!("editors|{tenant}:api/v1/roles/:uuid"),
            ]
        );
    }

    #[test]
    fn overlapping_codes_collapse() {
        let role = Role::tenant(Uuid::new_v4(), "ops");
        let resolver = BindingResolver::standard();

        let both = resolver
            .resolve_bindings(&role, &["group.manage", "group.member.manage"])
            .unwrap();
        let manage_only = resolver.resolve_bindings(&role, &["group.manage"]).unwrap();
        assert_eq!(both, manage_only);
        assert_eq!(both.len(), 4);
    }

    #[test]
    fn only_applicable_templates_are_used() {
        let global = Role::global("auditor");
        let bindings = BindingResolver::standard()
            .resolve_bindings(&global, &["role.view"])
            .unwrap();
        assert_eq!(bindings.len(), 1);
        assert!(bindings.contains_key("viewers|global:api/v1/permissions"));
    }

    #[test]
    fn empty_permissions_resolve_to_nothing() {
        let mut broken = Role::tenant(Uuid::new_v4(), "support");
        broken.tenant_id = None;
        let bindings = BindingResolver::standard()
            .resolve_bindings::<&str>(&broken, &[])
            .unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn scope_mismatch_is_reported() {
        let role = Role::tenant(Uuid::new_v4(), "support");
        let err = BindingResolver::standard()
            .resolve_bindings(&role, &["tenant.view"])
            .unwrap_err();
        assert!(matches!(err, AuthzError::ScopeMismatch { .. }));
    }
}
