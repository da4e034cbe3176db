//! In-memory relational stores shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use auth_rebac::{GroupMember, GroupMemberStore, RoleAssignment, RoleAssignmentStore, RoleStore, StoreError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

fn unavailable() -> StoreError {
    StoreError::Backend("store unavailable".to_string())
}

/// Number of writes allowed before every write fails; `None` is unlimited.
#[derive(Default)]
pub struct WriteBudget(Mutex<Option<usize>>);

impl WriteBudget {
    pub fn set(&self, remaining: Option<usize>) {
        *self.0.lock().unwrap() = remaining;
    }

    fn take(&self) -> Result<(), StoreError> {
        let mut budget = self.0.lock().unwrap();
        match budget.as_mut() {
            None => Ok(()),
            Some(0) => Err(unavailable()),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct FakeRoleStore {
    pub deleted: Mutex<Vec<Uuid>>,
    pub fail_delete: AtomicBool,
}

impl FakeRoleStore {
    pub fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleStore for FakeRoleStore {
    async fn delete_role(&self, role_id: Uuid) -> Result<(), StoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.deleted.lock().unwrap().push(role_id);
        Ok(())
    }
}

/// Assignments keyed by `(role_id, identity_id)`.
#[derive(Default)]
pub struct FakeAssignmentStore {
    pub rows: Mutex<BTreeMap<(Uuid, Uuid), RoleAssignment>>,
    pub budget: WriteBudget,
}

impl FakeAssignmentStore {
    pub fn with_members(role_id: Uuid, tenant_id: Option<Uuid>, count: usize) -> (Self, Vec<Uuid>) {
        let store = Self::default();
        let mut identities = Vec::with_capacity(count);
        {
            let mut rows = store.rows.lock().unwrap();
            for _ in 0..count {
                let identity_id = Uuid::new_v4();
                rows.insert(
                    (role_id, identity_id),
                    RoleAssignment {
                        role_id,
                        identity_id,
                        tenant_id,
                        created_at: Utc::now(),
                    },
                );
                identities.push(identity_id);
            }
        }
        (store, identities)
    }

    pub fn contains(&self, role_id: Uuid, identity_id: Uuid) -> bool {
        self.rows.lock().unwrap().contains_key(&(role_id, identity_id))
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Allow `remaining` more writes, then fail every write.
    pub fn fail_writes_after(&self, remaining: usize) {
        self.budget.set(Some(remaining));
    }
}

#[async_trait]
impl RoleAssignmentStore for FakeAssignmentStore {
    async fn upsert_assignment(
        &self,
        role_id: Uuid,
        identity_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        self.budget.take()?;
        self.rows.lock().unwrap().insert(
            (role_id, identity_id),
            RoleAssignment {
                role_id,
                identity_id,
                tenant_id,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_assignment(&self, role_id: Uuid, identity_id: Uuid) -> Result<(), StoreError> {
        self.budget.take()?;
        self.rows.lock().unwrap().remove(&(role_id, identity_id));
        Ok(())
    }

    async fn list_assignments(
        &self,
        role_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RoleAssignment>, i64), StoreError> {
        let rows = self.rows.lock().unwrap();
        let matching: Vec<RoleAssignment> = rows
            .values()
            .filter(|a| a.role_id == role_id)
            .cloned()
            .collect();
        let total = i64::try_from(matching.len()).unwrap();
        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap())
            .take(usize::try_from(limit).unwrap())
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
pub struct FakeGroupStore {
    pub members: Mutex<BTreeMap<(Uuid, Uuid), GroupMember>>,
    pub budget: WriteBudget,
}

impl FakeGroupStore {
    pub fn get(&self, group_id: Uuid, identity_id: Uuid) -> Option<GroupMember> {
        self.members.lock().unwrap().get(&(group_id, identity_id)).cloned()
    }

    /// Allow `remaining` more writes, then fail every write.
    pub fn fail_writes_after(&self, remaining: usize) {
        self.budget.set(Some(remaining));
    }
}

#[async_trait]
impl GroupMemberStore for FakeGroupStore {
    async fn insert_member(&self, member: &GroupMember) -> Result<(), StoreError> {
        self.budget.take()?;
        self.members
            .lock()
            .unwrap()
            .insert((member.group_id, member.identity_id), member.clone());
        Ok(())
    }

    async fn delete_member(&self, group_id: Uuid, identity_id: Uuid) -> Result<(), StoreError> {
        self.budget.take()?;
        self.members.lock().unwrap().remove(&(group_id, identity_id));
        Ok(())
    }
}
