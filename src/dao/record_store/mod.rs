#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{ClusterResultEntity, SnapshotEntity, StageInfoEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Authoritative store of competition records.
///
/// Both writes are idempotent and report `Ok(false)` when the store did not apply
/// them (unknown team, rejected update). Cluster and area writes never touch each
/// other's fields.
pub trait RecordStore: Send + Sync {
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<SnapshotEntity>>;
    fn update_cluster_result(
        &self,
        team_id: String,
        result: ClusterResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn update_area_result(
        &self,
        team_id: String,
        result: StageInfoEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
