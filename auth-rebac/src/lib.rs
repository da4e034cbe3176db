//! Relationship-based authorization for the agent portal
//!
//! Maps catalog-driven roles onto relation tuples stored in Ory Keto and
//! answers request-time authorization checks against them:
//! - Permission catalog and the binding table from permission codes to engine objects
//! - Deterministic binding resolution and minimal add/remove reconciliation
//! - Role and group membership kept in step with the relational store, with
//!   typed compensation outcomes
//! - Request-time decisions with tenant scoping and a platform-admin bypass
//!
//! # Core Concepts
//!
//! - **Scope token**: the tenant id, or `global` for platform-wide roles and requests
//! - **Binding**: `<scope>:<object template>` plus a relation, granted to the
//!   members of a role
//! - **Grantee**: the subject set `Tenant:<scope>:<role code>#member`
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use auth_rebac::{
//!     AuthorizationRequest, AuthorizationResolver, BindingResolver, InMemoryRelationStore,
//!     MembershipSynchronizer, ReconciliationEngine, RelationLayout, Role,
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(InMemoryRelationStore::new());
//!     let layout = RelationLayout::default();
//!     let reconciler = ReconciliationEngine::new(
//!         engine.clone(),
//!         Arc::new(BindingResolver::standard()),
//!         layout.clone(),
//!     );
//!
//!     let tenant = Uuid::new_v4();
//!     let role = Role::tenant(tenant, "support").with_permissions(&["role.view"]);
//!     reconciler.sync(&role, &[], &role.permissions).await?;
//!
//!     let members = MembershipSynchronizer::new(engine.clone(), layout.clone());
//!     members.assign_roles(Some(&tenant.to_string()), &["support"], "alice").await?;
//!
//!     let authorizer = AuthorizationResolver::new(engine, layout);
//!     let request = AuthorizationRequest::new("/api/v1/roles", "viewers", "alice")
//!         .with_tenant(&tenant.to_string());
//!     assert!(authorizer.authorize(&request).await?.allowed);
//!
//!     Ok(())
//! }
//! ```

pub mod authorizer;
pub mod bindings;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod keto;
pub mod lifecycle;
pub mod membership;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod reconcile;
pub mod resolver;
pub mod saga;
pub mod store;

pub use authorizer::{is_platform_admin, normalize_object, parse_role_list, AuthorizationResolver};
pub use bindings::{BindingTable, BindingTemplate};
pub use catalog::PermissionCatalog;
pub use client::RelationTupleClient;
pub use config::{KetoConfig, RelationLayout};
pub use error::*;
pub use keto::KetoClient;
pub use lifecycle::RoleLifecycle;
pub use membership::MembershipSynchronizer;
pub use memory::InMemoryRelationStore;
pub use models::*;
pub use reconcile::{ReconciliationEngine, SyncReport};
pub use resolver::{BindingResolver, BindingSet};
pub use saga::SagaOutcome;
pub use store::{GroupMember, GroupMemberStore, RoleAssignment, RoleAssignmentStore, RoleStore};
