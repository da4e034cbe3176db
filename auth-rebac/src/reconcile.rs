use std::sync::Arc;
use tracing::{error, info};

use crate::client::RelationTupleClient;
use crate::config::RelationLayout;
use crate::error::Result;
use crate::models::{RelationTuple, ResolvedBinding, Role, Subject};
use crate::resolver::BindingResolver;

/// What a reconciliation run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<ResolvedBinding>,
    pub removed: Vec<ResolvedBinding>,
    pub unchanged: usize,
}

impl SyncReport {
    pub fn writes(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    pub fn is_noop(&self) -> bool {
        self.writes() == 0
    }
}

/// Moves a role's engine bindings from one permission set to another.
pub struct ReconciliationEngine {
    client: Arc<dyn RelationTupleClient>,
    resolver: Arc<BindingResolver>,
    layout: RelationLayout,
}

impl ReconciliationEngine {
    pub fn new(
        client: Arc<dyn RelationTupleClient>,
        resolver: Arc<BindingResolver>,
        layout: RelationLayout,
    ) -> Self {
        Self {
            client,
            resolver,
            layout,
        }
    }

    pub fn resolver(&self) -> &BindingResolver {
        &self.resolver
    }

    /// Subject every binding of `role` is granted to: the role's members.
    ///
    /// # Errors
    ///
    /// Fails when the role's tenant id disagrees with its scope.
    pub fn grantee(&self, role: &Role) -> Result<Subject> {
        Ok(Subject::Set(self.layout.role_members(role)?))
    }

    fn binding_tuple(&self, binding: &ResolvedBinding, subject: &Subject) -> RelationTuple {
        RelationTuple::new(
            self.layout.namespace(),
            binding.object.clone(),
            binding.relation.clone(),
            subject.clone(),
        )
    }

    /// Delete bindings only in `previous`, then write bindings only in `current`.
    ///
    /// Both permission sets are validated before the first remote call. The
    /// first remote failure aborts the run; earlier writes are kept.
    ///
    /// # Errors
    ///
    /// Validation errors from binding resolution, or the first engine error.
    pub async fn sync(
        &self,
        role: &Role,
        previous: &[String],
        current: &[String],
    ) -> Result<SyncReport> {
        let old = self.resolver.resolve_bindings(role, previous)?;
        let new = self.resolver.resolve_bindings(role, current)?;
        if old.is_empty() && new.is_empty() {
            return Ok(SyncReport::default());
        }

        let subject = self.grantee(role)?;
        let mut report = SyncReport::default();

        for (key, binding) in &old {
            if new.contains_key(key) {
                report.unchanged += 1;
                continue;
            }
            let tuple = self.binding_tuple(binding, &subject);
            if let Err(err) = self.client.delete_relation(&tuple).await {
                error!(
                    role = %role.code,
                    object = %binding.object,
                    relation = %binding.relation,
                    error = %err,
                    "failed to remove role binding"
                );
                return Err(err);
            }
            report.removed.push(binding.clone());
        }

        for (key, binding) in &new {
            if old.contains_key(key) {
                continue;
            }
            let tuple = self.binding_tuple(binding, &subject);
            if let Err(err) = self.client.upsert_relation(&tuple).await {
                error!(
                    role = %role.code,
                    object = %binding.object,
                    relation = %binding.relation,
                    error = %err,
                    "failed to add role binding"
                );
                return Err(err);
            }
            report.added.push(binding.clone());
        }

        if !report.is_noop() {
            info!(
                role = %role.code,
                added = report.added.len(),
                removed = report.removed.len(),
                unchanged = report.unchanged,
                "role bindings reconciled"
            );
        }
        Ok(report)
    }
}
