//! Seams to the relational store that owns roles, assignments and group members.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Page size used when walking every assignment of a role.
pub const ASSIGNMENT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role_id: Uuid,
    pub identity_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub identity_id: Uuid,
    pub tenant_id: Uuid,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub is_primary: bool,
}

impl GroupMember {
    pub fn new(tenant_id: Uuid, group_id: Uuid, identity_id: Uuid) -> Self {
        Self {
            group_id,
            identity_id,
            tenant_id,
            display_name: None,
            phone: None,
            title: None,
            is_primary: false,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Delete a role row. Deleting an absent role succeeds.
    async fn delete_role(&self, role_id: Uuid) -> Result<(), StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleAssignmentStore: Send + Sync {
    async fn upsert_assignment(
        &self,
        role_id: Uuid,
        identity_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<(), StoreError>;

    /// Deleting an absent assignment succeeds.
    async fn delete_assignment(&self, role_id: Uuid, identity_id: Uuid) -> Result<(), StoreError>;

    /// One page of assignments plus the total count.
    async fn list_assignments(
        &self,
        role_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RoleAssignment>, i64), StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupMemberStore: Send + Sync {
    async fn insert_member(&self, member: &GroupMember) -> Result<(), StoreError>;

    /// Deleting an absent member succeeds.
    async fn delete_member(&self, group_id: Uuid, identity_id: Uuid) -> Result<(), StoreError>;
}
