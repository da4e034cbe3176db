use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::client::RelationTupleClient;
use crate::error::{AuthzError, Result};
use crate::models::{RelationTuple, Subject, SubjectSet};

/// In-process relation store for tests and local development.
///
/// Checks follow direct tuples and one level of subject sets, which is enough
/// for role grants of the form `object#relation@(role#member)`.
#[derive(Debug, Default)]
pub struct InMemoryRelationStore {
    tuples: DashSet<RelationTuple>,
    checks: AtomicUsize,
    upserts: AtomicUsize,
    deletes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuples(tuples: impl IntoIterator<Item = RelationTuple>) -> Self {
        let store = Self::new();
        for tuple in tuples {
            store.tuples.insert(tuple);
        }
        store
    }

    /// Make every subsequent call fail as if the engine returned 503.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contains(&self, tuple: &RelationTuple) -> bool {
        self.tuples.contains(tuple)
    }

    /// Snapshot of stored tuples in a stable order.
    pub fn tuples(&self) -> Vec<RelationTuple> {
        let mut tuples: Vec<RelationTuple> = self.tuples.iter().map(|t| t.key().clone()).collect();
        tuples.sort();
        tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Upserts plus deletes.
    pub fn write_count(&self) -> usize {
        self.upsert_count() + self.delete_count()
    }

    pub fn reset_counters(&self) {
        self.checks.store(0, Ordering::SeqCst);
        self.upserts.store(0, Ordering::SeqCst);
        self.deletes.store(0, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthzError::EngineStatus { status: 503 });
        }
        Ok(())
    }

    fn holds(&self, namespace: &str, object: &str, relation: &str, subject_id: &str) -> bool {
        self.tuples.iter().any(|entry| {
            let tuple = entry.key();
            tuple.namespace == namespace
                && tuple.object == object
                && tuple.relation == relation
                && tuple.subject == Subject::Id(subject_id.to_string())
        })
    }
}

#[async_trait]
impl RelationTupleClient for InMemoryRelationStore {
    async fn check(
        &self,
        namespace: &str,
        object: &str,
        relation: &str,
        subject_id: &str,
    ) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        if self.holds(namespace, object, relation, subject_id) {
            return Ok(true);
        }

        let granted_sets: Vec<SubjectSet> = self
            .tuples
            .iter()
            .filter_map(|entry| {
                let tuple = entry.key();
                match &tuple.subject {
                    Subject::Set(set)
                        if tuple.namespace == namespace
                            && tuple.object == object
                            && tuple.relation == relation =>
                    {
                        Some(set.clone())
                    }
                    _ => None,
                }
            })
            .collect();

        Ok(granted_sets
            .iter()
            .any(|set| self.holds(&set.namespace, &set.object, &set.relation, subject_id)))
    }

    async fn upsert_relation(&self, tuple: &RelationTuple) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        self.tuples.insert(tuple.clone());
        Ok(())
    }

    async fn delete_relation(&self, tuple: &RelationTuple) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        self.tuples.remove(tuple);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> RelationTuple {
        RelationTuple::new(
            "Tenant",
            "t1:api/v1/roles",
            "editors",
            Subject::Set(SubjectSet::new("Tenant", "t1:support", "member")),
        )
    }

    fn membership(user: &str) -> RelationTuple {
        RelationTuple::new("Tenant", "t1:support", "member", Subject::id(user))
    }

    #[tokio::test]
    async fn check_follows_subject_sets() {
        let store = InMemoryRelationStore::with_tuples([grant(), membership("alice")]);

        assert!(store
            .check("Tenant", "t1:api/v1/roles", "editors", "alice")
            .await
            .unwrap());
        assert!(!store
            .check("Tenant", "t1:api/v1/roles", "editors", "bob")
            .await
            .unwrap());
        assert!(store
            .check("Tenant", "t1:support", "member", "alice")
            .await
            .unwrap());
        assert_eq!(store.check_count(), 3);
    }

    #[tokio::test]
    async fn writes_are_idempotent() {
        let store = InMemoryRelationStore::new();
        store.upsert_relation(&grant()).await.unwrap();
        store.upsert_relation(&grant()).await.unwrap();
        assert_eq!(store.len(), 1);

        store.delete_relation(&grant()).await.unwrap();
        store.delete_relation(&grant()).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.write_count(), 4);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryRelationStore::new();
        store.set_unavailable(true);

        let err = store.upsert_relation(&grant()).await.unwrap_err();
        assert!(matches!(err, AuthzError::EngineStatus { status: 503 }));
        assert!(store.check("Tenant", "x", "y", "z").await.is_err());
        assert!(store.is_empty());

        store.set_unavailable(false);
        store.reset_counters();
        store.upsert_relation(&grant()).await.unwrap();
        assert_eq!(store.upsert_count(), 1);
        assert_eq!(store.check_count(), 0);
    }
}
