use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::RelationTupleClient;
use crate::config::RelationLayout;
use crate::error::{AuthzError, Result};
use crate::models::{scope_token, Role};
use crate::saga::{after_compensation, SagaOutcome};
use crate::store::{GroupMember, GroupMemberStore, RoleAssignmentStore, ASSIGNMENT_PAGE_SIZE};

/// Keeps relational membership rows and engine membership tuples in step.
///
/// Additions write the local row first and the tuple second; removals run in
/// the opposite order. When the engine write fails the local change is undone
/// once and the engine error is reported.
pub struct MembershipSynchronizer {
    client: Arc<dyn RelationTupleClient>,
    layout: RelationLayout,
}

impl MembershipSynchronizer {
    pub fn new(client: Arc<dyn RelationTupleClient>, layout: RelationLayout) -> Self {
        Self { client, layout }
    }

    pub fn layout(&self) -> &RelationLayout {
        &self.layout
    }

    pub async fn assign_role(
        &self,
        store: &dyn RoleAssignmentStore,
        role: &Role,
        identity_id: Uuid,
    ) -> SagaOutcome {
        let identity = identity_id.to_string();
        let tuple = match self.layout.role_membership(role, &identity) {
            Ok(tuple) => tuple,
            Err(error) => return SagaOutcome::Failed { error },
        };

        if let Err(err) = store
            .upsert_assignment(role.id, identity_id, role.tenant_id)
            .await
        {
            return SagaOutcome::Failed { error: err.into() };
        }

        if let Err(error) = self.client.upsert_relation(&tuple).await {
            let compensation = store
                .delete_assignment(role.id, identity_id)
                .await
                .map_err(AuthzError::from);
            return after_compensation("assign_role", &tuple.object, &identity, error, compensation);
        }

        info!(role = %role.code, object = %tuple.object, member = %identity, "role assigned");
        SagaOutcome::Applied
    }

    pub async fn remove_role(
        &self,
        store: &dyn RoleAssignmentStore,
        role: &Role,
        identity_id: Uuid,
    ) -> SagaOutcome {
        let identity = identity_id.to_string();
        let tuple = match self.layout.role_membership(role, &identity) {
            Ok(tuple) => tuple,
            Err(error) => return SagaOutcome::Failed { error },
        };

        if let Err(err) = store.delete_assignment(role.id, identity_id).await {
            return SagaOutcome::Failed { error: err.into() };
        }

        if let Err(error) = self.client.delete_relation(&tuple).await {
            let compensation = store
                .upsert_assignment(role.id, identity_id, role.tenant_id)
                .await
                .map_err(AuthzError::from);
            return after_compensation("remove_role", &tuple.object, &identity, error, compensation);
        }

        info!(role = %role.code, object = %tuple.object, member = %identity, "role removed");
        SagaOutcome::Applied
    }

    /// Write membership tuples for role codes claimed at registration time.
    ///
    /// No local rows are involved. Blank codes are skipped, duplicates
    /// (case-insensitive) are written once. Returns the number of tuples written.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidIdentifier`] for a blank identity, otherwise the first engine error.
    pub async fn assign_roles<S: AsRef<str> + Sync>(
        &self,
        tenant_id: Option<&str>,
        roles: &[S],
        identity: &str,
    ) -> Result<usize> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AuthzError::InvalidIdentifier("identity id is empty".to_string()));
        }

        let scope = scope_token(tenant_id);
        let mut seen = HashSet::new();
        let mut written = 0;
        for role in roles {
            let code = role.as_ref().trim();
            if code.is_empty() || !seen.insert(code.to_lowercase()) {
                continue;
            }
            let tuple = self.layout.role_membership_by_code(&scope, code, identity);
            self.client.upsert_relation(&tuple).await?;
            debug!(object = %tuple.object, member = identity, "registration role tuple written");
            written += 1;
        }
        Ok(written)
    }

    pub async fn add_group_member(
        &self,
        store: &dyn GroupMemberStore,
        member: &GroupMember,
    ) -> SagaOutcome {
        let tenant = member.tenant_id.to_string();
        let identity = member.identity_id.to_string();
        let tuple =
            self.layout
                .group_membership(Some(&tenant), &member.group_id.to_string(), &identity);

        if let Err(err) = store.insert_member(member).await {
            return SagaOutcome::Failed { error: err.into() };
        }

        if let Err(error) = self.client.upsert_relation(&tuple).await {
            let compensation = store
                .delete_member(member.group_id, member.identity_id)
                .await
                .map_err(AuthzError::from);
            return after_compensation(
                "add_group_member",
                &tuple.object,
                &identity,
                error,
                compensation,
            );
        }

        info!(tenant = %tenant, object = %tuple.object, member = %identity, "group member added");
        SagaOutcome::Applied
    }

    /// `member` must be the stored record so it can be re-inserted on failure.
    pub async fn remove_group_member(
        &self,
        store: &dyn GroupMemberStore,
        member: &GroupMember,
    ) -> SagaOutcome {
        let tenant = member.tenant_id.to_string();
        let identity = member.identity_id.to_string();
        let tuple =
            self.layout
                .group_membership(Some(&tenant), &member.group_id.to_string(), &identity);

        if let Err(err) = store.delete_member(member.group_id, member.identity_id).await {
            return SagaOutcome::Failed { error: err.into() };
        }

        if let Err(error) = self.client.delete_relation(&tuple).await {
            let compensation = store.insert_member(member).await.map_err(AuthzError::from);
            return after_compensation(
                "remove_group_member",
                &tuple.object,
                &identity,
                error,
                compensation,
            );
        }

        info!(tenant = %tenant, object = %tuple.object, member = %identity, "group member removed");
        SagaOutcome::Applied
    }

    /// Delete the membership tuple of every identity assigned to `role`.
    ///
    /// Local rows are left alone; they go away with the role row.
    ///
    /// # Errors
    ///
    /// The first store or engine error.
    pub async fn remove_all_role_memberships(
        &self,
        store: &dyn RoleAssignmentStore,
        role: &Role,
    ) -> Result<usize> {
        let scope = role.scope_token()?;
        let mut offset = 0;
        let mut removed = 0;

        loop {
            let (page, total) = store
                .list_assignments(role.id, ASSIGNMENT_PAGE_SIZE, offset)
                .await?;
            if page.is_empty() {
                break;
            }

            for assignment in &page {
                let tuple = self.layout.role_membership_by_code(
                    &scope,
                    &role.code,
                    &assignment.identity_id.to_string(),
                );
                self.client.delete_relation(&tuple).await?;
                removed += 1;
            }

            offset += ASSIGNMENT_PAGE_SIZE;
            if offset >= total {
                break;
            }
        }

        debug!(role = %role.code, removed, "role membership tuples removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockRelationTupleClient;
    use crate::error::StoreError;
    use crate::memory::InMemoryRelationStore;
    use crate::models::Subject;
    use crate::store::{MockGroupMemberStore, MockRoleAssignmentStore};
    use mockall::Sequence;

    fn failing_client() -> MockRelationTupleClient {
        let mut client = MockRelationTupleClient::new();
        client
            .expect_upsert_relation()
            .returning(|_| Err(AuthzError::EngineStatus { status: 503 }));
        client
            .expect_delete_relation()
            .returning(|_| Err(AuthzError::EngineStatus { status: 503 }));
        client
    }

    #[tokio::test]
    async fn assign_role_writes_row_then_tuple() {
        let engine = Arc::new(InMemoryRelationStore::new());
        let sync = MembershipSynchronizer::new(engine.clone(), RelationLayout::default());
        let tenant = Uuid::new_v4();
        let role = Role::tenant(tenant, "support");
        let identity = Uuid::new_v4();

        let mut store = MockRoleAssignmentStore::new();
        store
            .expect_upsert_assignment()
            .withf(move |_, id, t| *id == identity && *t == Some(tenant))
            .times(1)
            .returning(|_, _, _| Ok(()));
        store.expect_delete_assignment().times(0);

        let outcome = sync.assign_role(&store, &role, identity).await;
        assert!(outcome.is_applied());
        assert_eq!(
            engine.tuples(),
            vec![crate::models::RelationTuple::new(
                "Tenant",
                format!("{tenant}:support"),
                "member",
                Subject::id(identity.to_string()),
            )]
        );
    }

    #[tokio::test]
    async fn assign_role_rolls_back_row_when_engine_fails() {
        let sync = MembershipSynchronizer::new(Arc::new(failing_client()), RelationLayout::default());
        let role = Role::global("auditor");
        let mut seq = Sequence::new();

        let mut store = MockRoleAssignmentStore::new();
        store
            .expect_upsert_assignment()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_delete_assignment()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let outcome = sync.assign_role(&store, &role, Uuid::new_v4()).await;
        assert!(matches!(
            outcome,
            SagaOutcome::PartiallyApplied {
                compensated: true,
                ..
            }
        ));
        assert!(matches!(
            outcome.into_result(),
            Err(AuthzError::EngineStatus { status: 503 })
        ));
    }

    #[tokio::test]
    async fn assign_role_store_failure_skips_engine() {
        let mut client = MockRelationTupleClient::new();
        client.expect_upsert_relation().times(0);
        let sync = MembershipSynchronizer::new(Arc::new(client), RelationLayout::default());

        let mut store = MockRoleAssignmentStore::new();
        store
            .expect_upsert_assignment()
            .returning(|_, _, _| Err(StoreError::Backend("down".to_string())));

        let outcome = sync
            .assign_role(&store, &Role::global("auditor"), Uuid::new_v4())
            .await;
        assert!(matches!(
            outcome,
            SagaOutcome::Failed {
                error: AuthzError::Store(StoreError::Backend(_))
            }
        ));
    }

    #[tokio::test]
    async fn remove_role_reinserts_row_and_reports_failed_compensation() {
        let sync = MembershipSynchronizer::new(Arc::new(failing_client()), RelationLayout::default());
        let role = Role::global("auditor");

        let mut store = MockRoleAssignmentStore::new();
        store
            .expect_delete_assignment()
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_upsert_assignment()
            .times(1)
            .returning(|_, _, _| Err(StoreError::Backend("down".to_string())));

        let outcome = sync.remove_role(&store, &role, Uuid::new_v4()).await;
        assert!(outcome.needs_repair());
    }

    #[tokio::test]
    async fn group_member_removal_reinserts_full_record() {
        let sync = MembershipSynchronizer::new(Arc::new(failing_client()), RelationLayout::default());
        let mut member = GroupMember::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        member.title = Some("Lead".to_string());
        let expected = member.clone();

        let mut store = MockGroupMemberStore::new();
        store.expect_delete_member().times(1).returning(|_, _| Ok(()));
        store
            .expect_insert_member()
            .withf(move |m| *m == expected)
            .times(1)
            .returning(|_| Ok(()));

        let outcome = sync.remove_group_member(&store, &member).await;
        assert!(!outcome.needs_repair());
        assert!(outcome.error().is_some());
    }

    #[tokio::test]
    async fn assign_roles_dedups_and_scopes() {
        let engine = Arc::new(InMemoryRelationStore::new());
        let sync = MembershipSynchronizer::new(engine.clone(), RelationLayout::default());

        let written = sync
            .assign_roles(Some("t1"), &["support", " Support", "", "billing"], "u1")
            .await
            .unwrap();
        assert_eq!(written, 2);

        let objects: Vec<String> = engine.tuples().into_iter().map(|t| t.object).collect();
        assert_eq!(objects, vec!["t1:billing", "t1:support"]);
    }

    #[tokio::test]
    async fn assign_roles_rejects_blank_identity() {
        let sync = MembershipSynchronizer::new(
            Arc::new(InMemoryRelationStore::new()),
            RelationLayout::default(),
        );
        let err = sync.assign_roles(None, &["support"], " ").await.unwrap_err();
        assert!(matches!(err, AuthzError::InvalidIdentifier(_)));
    }
}
