//! PostgreSQL implementations of the relational seams.
//!
//! Queries are checked at runtime so the crate builds without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::PermissionCatalog;
use crate::error::StoreError;
use crate::models::{Applicability, Permission};
use crate::store::{GroupMember, GroupMemberStore, RoleAssignment, RoleAssignmentStore, RoleStore};

/// Schema expected by the stores below.
pub const SCHEMA: &str = include_str!("../migrations/0001_authorization.sql");

/// Load the permission catalog from the `permissions` table.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when the query fails.
pub async fn load_permission_catalog(pool: &PgPool) -> Result<PermissionCatalog, StoreError> {
    let rows = sqlx::query("SELECT code, scope, description FROM permissions ORDER BY code")
        .fetch_all(pool)
        .await?;

    let mut permissions = Vec::with_capacity(rows.len());
    for row in rows {
        let code: String = row.try_get("code")?;
        let scope: String = row.try_get("scope")?;
        let description: String = row.try_get("description")?;
        permissions.push(Permission {
            code,
            scope: Applicability::parse_lenient(&scope),
            description,
        });
    }

    debug!(count = permissions.len(), "permission catalog loaded");
    Ok(PermissionCatalog::new(permissions))
}

/// Role and role assignment tables.
#[derive(Debug, Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn delete_role(&self, role_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        debug!(role_id = %role_id, rows = result.rows_affected(), "role row deleted");
        Ok(())
    }
}

#[async_trait]
impl RoleAssignmentStore for PgRoleStore {
    async fn upsert_assignment(
        &self,
        role_id: Uuid,
        identity_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO role_assignments (role_id, identity_id, tenant_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_id, identity_id) DO UPDATE SET tenant_id = EXCLUDED.tenant_id
            "#,
        )
        .bind(role_id)
        .bind(identity_id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_assignment(&self, role_id: Uuid, identity_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM role_assignments WHERE role_id = $1 AND identity_id = $2")
            .bind(role_id)
            .bind(identity_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_assignments(
        &self,
        role_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RoleAssignment>, i64), StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT role_id, identity_id, tenant_id, created_at
            FROM role_assignments
            WHERE role_id = $1
            ORDER BY created_at, identity_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_assignments WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;

        let mut assignments = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: DateTime<Utc> = row.try_get("created_at")?;
            assignments.push(RoleAssignment {
                role_id: row.try_get("role_id")?,
                identity_id: row.try_get("identity_id")?,
                tenant_id: row.try_get("tenant_id")?,
                created_at,
            });
        }

        Ok((assignments, total))
    }
}

/// Group membership table.
#[derive(Debug, Clone)]
pub struct PgGroupMemberStore {
    pool: PgPool,
}

impl PgGroupMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupMemberStore for PgGroupMemberStore {
    async fn insert_member(&self, member: &GroupMember) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO group_members
                (group_id, identity_id, tenant_id, display_name, phone, title, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (group_id, identity_id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                phone = EXCLUDED.phone,
                title = EXCLUDED.title,
                is_primary = EXCLUDED.is_primary
            "#,
        )
        .bind(member.group_id)
        .bind(member.identity_id)
        .bind(member.tenant_id)
        .bind(member.display_name.as_deref().map(str::trim))
        .bind(member.phone.as_deref().map(str::trim))
        .bind(member.title.as_deref())
        .bind(member.is_primary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_member(&self, group_id: Uuid, identity_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND identity_id = $2")
            .bind(group_id)
            .bind(identity_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
