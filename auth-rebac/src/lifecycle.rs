use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AuthzError, Result};
use crate::membership::MembershipSynchronizer;
use crate::models::Role;
use crate::reconcile::{ReconciliationEngine, SyncReport};
use crate::saga::SagaOutcome;
use crate::store::{RoleAssignmentStore, RoleStore};

/// Drives role create, update and delete through binding reconciliation.
pub struct RoleLifecycle {
    engine: Arc<ReconciliationEngine>,
    memberships: Arc<MembershipSynchronizer>,
    roles: Arc<dyn RoleStore>,
    assignments: Arc<dyn RoleAssignmentStore>,
}

impl RoleLifecycle {
    pub fn new(
        engine: Arc<ReconciliationEngine>,
        memberships: Arc<MembershipSynchronizer>,
        roles: Arc<dyn RoleStore>,
        assignments: Arc<dyn RoleAssignmentStore>,
    ) -> Self {
        Self {
            engine,
            memberships,
            roles,
            assignments,
        }
    }

    /// Bind a freshly stored role.
    ///
    /// When binding fails, bindings already written are withdrawn and the role
    /// row is deleted, each attempted once. A permission set that fails
    /// validation wrote nothing, so only the row is deleted.
    pub async fn created(&self, role: &Role) -> SagaOutcome {
        let error = match self.engine.sync(role, &[], &role.permissions).await {
            Ok(report) => {
                info!(role = %role.code, bindings = report.added.len(), "role created");
                return SagaOutcome::Applied;
            }
            Err(error) => error,
        };

        let unbind = if error.is_validation() {
            Ok(())
        } else {
            self.engine
                .sync(role, &role.permissions, &[])
                .await
                .map(|_| ())
        };
        let delete = self
            .roles
            .delete_role(role.id)
            .await
            .map_err(AuthzError::from);

        match (unbind, delete) {
            (Ok(()), Ok(())) => {
                warn!(role = %role.code, error = %error, "role binding failed; role deleted");
                SagaOutcome::PartiallyApplied {
                    error,
                    compensated: true,
                    compensation_error: None,
                }
            }
            (unbind, delete) => {
                let role_deleted = delete.is_ok();
                let compensation_error = delete.err().or(unbind.err());
                error!(
                    role = %role.code,
                    role_id = %role.id,
                    error = %error,
                    role_deleted,
                    compensation_error = ?compensation_error,
                    needs_repair = true,
                    "role binding failed and could not be rolled back"
                );
                SagaOutcome::PartiallyApplied {
                    error,
                    compensated: false,
                    compensation_error,
                }
            }
        }
    }

    /// Move bindings from `previous` to the role's current permissions.
    ///
    /// # Errors
    ///
    /// Validation or engine errors; nothing is rolled back.
    pub async fn updated(&self, role: &Role, previous: &[String]) -> Result<SyncReport> {
        self.engine.sync(role, previous, &role.permissions).await
    }

    /// Withdraw every binding and membership tuple, then delete the role row.
    ///
    /// # Errors
    ///
    /// The first failure; the role row is only deleted after all tuples are gone.
    pub async fn deleted(&self, role: &Role) -> Result<()> {
        let report = self.engine.sync(role, &role.permissions, &[]).await?;
        let memberships = self
            .memberships
            .remove_all_role_memberships(self.assignments.as_ref(), role)
            .await?;
        self.roles.delete_role(role.id).await?;

        info!(
            role = %role.code,
            bindings = report.removed.len(),
            memberships,
            "role deleted"
        );
        Ok(())
    }
}
