//! Binding reconciliation against the in-memory relation store.

use auth_rebac::*;
use std::sync::Arc;
use uuid::Uuid;

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| (*c).to_string()).collect()
}

fn setup() -> (Arc<InMemoryRelationStore>, ReconciliationEngine) {
    let store = Arc::new(InMemoryRelationStore::new());
    let engine = ReconciliationEngine::new(
        store.clone(),
        Arc::new(BindingResolver::standard()),
        RelationLayout::default(),
    );
    (store, engine)
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let (store, engine) = setup();
    let role = Role::tenant(Uuid::new_v4(), "support");
    let permissions = codes(&["role.manage", "group.view", "user.view"]);

    let first = engine.sync(&role, &[], &permissions).await.unwrap();
    assert_eq!(first.added.len(), 7);
    assert_eq!(store.len(), 7);

    store.reset_counters();
    let second = engine.sync(&role, &permissions, &permissions).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(second.unchanged, 7);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_deletion_path_only_touches_removed_permission() {
    let tenant = Uuid::new_v4();
    let (store, engine) = setup();
    let role = Role::tenant(tenant, "support");

    engine
        .sync(&role, &[], &codes(&["role.manage", "user.view"]))
        .await
        .unwrap();
    store.reset_counters();

    let report = engine
        .sync(&role, &codes(&["role.manage", "user.view"]), &codes(&["user.view"]))
        .await
        .unwrap();

    let removed: Vec<String> = report.removed.iter().map(ResolvedBinding::key).collect();
    assert_eq!(
        removed,
        vec![
            format!("editors|{tenant}:api/v1/roles"),
            format!("editors|{tenant}:api/v1/roles/:uuid"),
        ]
    );
    assert!(report.added.is_empty());
    assert_eq!(store.delete_count(), 2);
    assert_eq!(store.upsert_count(), 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_role_deletion_removes_every_binding() {
    let (store, engine) = setup();
    let role = Role::tenant(Uuid::new_v4(), "support");

    engine.sync(&role, &[], &codes(&["role.manage"])).await.unwrap();
    let report = engine.sync(&role, &codes(&["role.manage"]), &[]).await.unwrap();

    assert_eq!(report.removed.len(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_scope_mismatch_makes_no_engine_call() {
    let (store, engine) = setup();
    let role = Role::tenant(Uuid::new_v4(), "support");

    let err = engine
        .sync(&role, &[], &codes(&["user.view", "tenant.manage"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthzError::ScopeMismatch { .. }));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_unknown_previous_permission_is_rejected() {
    let (store, engine) = setup();
    let role = Role::global("auditor");

    let err = engine
        .sync(&role, &codes(&["legacy.permission"]), &codes(&["tenant.view"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthzError::UnknownPermission(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_engine_failure_aborts_run() {
    let (store, engine) = setup();
    store.set_unavailable(true);
    let role = Role::global("operator");

    let err = engine
        .sync(&role, &[], &codes(&["tenant.manage", "tenant.view"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthzError::EngineStatus { status: 503 }));
    assert_eq!(store.upsert_count(), 1);
}

#[tokio::test]
async fn test_members_of_role_gain_access() {
    let tenant = Uuid::new_v4();
    let (store, engine) = setup();
    let role = Role::tenant(tenant, "support");
    engine.sync(&role, &[], &codes(&["group.view"])).await.unwrap();

    let layout = RelationLayout::default();
    store
        .upsert_relation(&layout.role_membership(&role, "alice").unwrap())
        .await
        .unwrap();

    let object = format!("{tenant}:api/v1/groups/:uuid");
    assert!(store.check("Tenant", &object, "viewers", "alice").await.unwrap());
    assert!(!store.check("Tenant", &object, "editors", "alice").await.unwrap());
    assert!(!store.check("Tenant", &object, "viewers", "bob").await.unwrap());
}
