use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        ACTIVITY_COLLECTION_NAME, CLUSTER_COLLECTION_NAME, SCHOOL_COLLECTION_NAME,
        TEAM_COLLECTION_NAME, cluster_result_update, record_id, stage_info_update,
    },
};
use crate::dao::{
    models::{ClusterResultEntity, SnapshotEntity, StageInfoEntity, TeamEntity},
    record_store::RecordStore,
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MongoRecordStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoRecordStore {
    /// Connect to MongoDB and ensure the team lookup index exists.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_, database) = establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection::<Document>(TEAM_COLLECTION_NAME).await;
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("team_id_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TEAM_COLLECTION_NAME,
                index: "id",
                source,
            })?;

        Ok(())
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn list<T>(&self, name: &'static str) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(name)
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListCollection {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCollection {
                collection: name,
                source,
            })
    }

    async fn read_snapshot(&self) -> MongoResult<SnapshotEntity> {
        let (activities, schools, clusters, teams) = futures::try_join!(
            self.list(ACTIVITY_COLLECTION_NAME),
            self.list(SCHOOL_COLLECTION_NAME),
            self.list(CLUSTER_COLLECTION_NAME),
            self.list::<TeamEntity>(TEAM_COLLECTION_NAME),
        )?;

        Ok(SnapshotEntity {
            activities,
            teams,
            schools,
            clusters,
        })
    }

    async fn update_team(&self, team_id: String, update: Document) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(TEAM_COLLECTION_NAME)
            .await
            .update_one(record_id(&team_id), update)
            .await
            .map_err(|source| MongoDaoError::UpdateTeam { team_id, source })?;
        Ok(result.matched_count > 0)
    }
}

impl RecordStore for MongoRecordStore {
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<SnapshotEntity>> {
        let store = self.clone();
        Box::pin(async move { store.read_snapshot().await.map_err(Into::into) })
    }

    fn update_cluster_result(
        &self,
        team_id: String,
        result: ClusterResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_team(team_id, cluster_result_update(&result))
                .await
                .map_err(Into::into)
        })
    }

    fn update_area_result(
        &self,
        team_id: String,
        result: StageInfoEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let blob = serde_json::to_string(&result).map_err(|source| {
                MongoDaoError::EncodeStageInfo {
                    team_id: team_id.clone(),
                    source,
                }
            })?;
            store
                .update_team(team_id, stage_info_update(&blob))
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
