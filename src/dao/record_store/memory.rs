//! Record store kept in process memory, optionally seeded from a JSON snapshot.
//!
//! Used when no database is configured and by the engine tests, which can make
//! individual teams fail their writes and slow writes down to observe concurrency.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use dashmap::DashSet;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::dao::{
    models::{ClusterResultEntity, SnapshotEntity, StageInfoEntity, TeamEntity},
    record_store::RecordStore,
    storage::{StorageError, StorageResult},
};

/// Failures while seeding the in-memory store.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("failed to read snapshot file `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot file `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<MemoryStoreError> for StorageError {
    fn from(err: MemoryStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    snapshot: RwLock<SnapshotEntity>,
    failing: DashSet<String>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new(snapshot: SnapshotEntity) -> Self {
        Self::with_latency(snapshot, None)
    }

    /// Build a store whose writes each take `latency` to complete.
    pub fn with_latency(snapshot: SnapshotEntity, latency: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                snapshot: RwLock::new(snapshot),
                latency,
                ..MemoryInner::default()
            }),
        }
    }

    /// Seed the store from a JSON snapshot file.
    pub fn from_json_file(path: &Path) -> Result<Self, MemoryStoreError> {
        let contents = fs::read_to_string(path).map_err(|source| MemoryStoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot =
            serde_json::from_str(&contents).map_err(|source| MemoryStoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(snapshot))
    }

    /// Make every later write for `team_id` report failure.
    pub fn fail_writes_for(&self, team_id: impl Into<String>) {
        self.inner.failing.insert(team_id.into());
    }

    pub fn restore_writes_for(&self, team_id: &str) {
        self.inner.failing.remove(team_id);
    }

    /// Number of writes attempted so far, failed ones included.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Highest number of writes observed in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.inner.peak_in_flight.load(Ordering::SeqCst)
    }

    pub async fn team(&self, team_id: &str) -> Option<TeamEntity> {
        let guard = self.inner.snapshot.read().await;
        guard.teams.iter().find(|team| team.id == team_id).cloned()
    }

    async fn write<F>(&self, team_id: &str, apply: F) -> StorageResult<bool>
    where
        F: FnOnce(&mut TeamEntity) -> StorageResult<()>,
    {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .peak_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        if let Some(latency) = self.inner.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = if self.inner.failing.contains(team_id) {
            Ok(false)
        } else {
            let mut guard = self.inner.snapshot.write().await;
            match guard.teams.iter_mut().find(|team| team.id == team_id) {
                Some(team) => apply(team).map(|()| true),
                None => Ok(false),
            }
        };

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<SnapshotEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.snapshot.read().await.clone()) })
    }

    fn update_cluster_result(
        &self,
        team_id: String,
        result: ClusterResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(&team_id, |team| {
                    team.apply_cluster_result(&result);
                    Ok(())
                })
                .await
        })
    }

    fn update_area_result(
        &self,
        team_id: String,
        result: StageInfoEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(&team_id, |team| {
                    team.apply_area_result(&result).map_err(|source| {
                        StorageError::corrupt(format!("stage info for `{}`", team.id), source)
                    })
                })
                .await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::parse_stage_info;
    use serde_json::json;

    fn store() -> MemoryRecordStore {
        let snapshot: SnapshotEntity = serde_json::from_value(json!({
            "teams": [{
                "id": "t1", "activity_id": "a1", "school_id": "s1",
                "score": 88, "rank": "1", "medal_override": "", "flag": "TRUE",
                "stage_status": "Area",
                "stage_info": "{\"score\": 64, \"rank\": \"5\", \"medal\": \"\"}"
            }]
        }))
        .unwrap();
        MemoryRecordStore::new(snapshot)
    }

    #[tokio::test]
    async fn area_write_keeps_cluster_columns() {
        let store = store();
        let applied = store
            .update_area_result(
                "t1".into(),
                StageInfoEntity {
                    score: 93.0,
                    rank: "1".into(),
                    medal: String::new(),
                },
            )
            .await
            .unwrap();
        assert!(applied);

        let team = store.team("t1").await.unwrap();
        assert_eq!(team.score, 88.0);
        assert_eq!(team.rank, "1");
        assert_eq!(team.flag, "TRUE");
        assert_eq!(team.stage_status, "Area");
        assert_eq!(parse_stage_info("t1", &team.stage_info).score, 93.0);
    }

    #[tokio::test]
    async fn cluster_write_keeps_area_blob() {
        let store = store();
        let blob_before = store.team("t1").await.unwrap().stage_info;
        let applied = store
            .update_cluster_result(
                "t1".into(),
                ClusterResultEntity {
                    score: 40.0,
                    rank: "4".into(),
                    medal: String::new(),
                    flag: String::new(),
                    stage_status: String::new(),
                },
            )
            .await
            .unwrap();
        assert!(applied);

        let team = store.team("t1").await.unwrap();
        assert_eq!(team.stage_info, blob_before);
        assert_eq!(team.score, 40.0);
        assert!(team.stage_status.is_empty());
    }

    #[tokio::test]
    async fn writes_are_idempotent() {
        let store = store();
        let result = ClusterResultEntity {
            score: 71.0,
            rank: "2".into(),
            medal: "Gold".into(),
            flag: String::new(),
            stage_status: String::new(),
        };
        store
            .update_cluster_result("t1".into(), result.clone())
            .await
            .unwrap();
        let once = store.team("t1").await.unwrap();
        store
            .update_cluster_result("t1".into(), result)
            .await
            .unwrap();
        assert_eq!(store.team("t1").await.unwrap(), once);
    }

    #[tokio::test]
    async fn unknown_and_failing_teams_report_false() {
        let store = store();
        assert!(
            !store
                .update_area_result("missing".into(), StageInfoEntity::default())
                .await
                .unwrap()
        );

        store.fail_writes_for("t1");
        assert!(
            !store
                .update_area_result("t1".into(), StageInfoEntity::default())
                .await
                .unwrap()
        );
        assert_eq!(store.write_count(), 2);

        store.restore_writes_for("t1");
        assert!(
            store
                .update_area_result("t1".into(), StageInfoEntity::default())
                .await
                .unwrap()
        );
    }
}
