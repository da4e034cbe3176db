use async_trait::async_trait;

use crate::error::Result;
use crate::models::RelationTuple;

/// Operations the authorization core needs from a relation engine.
///
/// All operations are idempotent: writing an existing tuple and deleting an
/// absent one both succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelationTupleClient: Send + Sync {
    /// Whether `subject_id` holds `relation` on `namespace:object`.
    async fn check(
        &self,
        namespace: &str,
        object: &str,
        relation: &str,
        subject_id: &str,
    ) -> Result<bool>;

    async fn upsert_relation(&self, tuple: &RelationTuple) -> Result<()>;

    async fn delete_relation(&self, tuple: &RelationTuple) -> Result<()>;
}
