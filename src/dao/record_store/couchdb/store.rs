use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::warn;

use crate::dao::{
    models::{ClusterResultEntity, SnapshotEntity, StageInfoEntity, TeamEntity},
    record_store::RecordStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        ACTIVITY_PREFIX, AllDocsResponse, CLUSTER_PREFIX, CouchDocument, END_SUFFIX,
        SCHOOL_PREFIX, TEAM_PREFIX, team_doc_id,
    },
};

/// Outcome of a conditional document update.
enum PutOutcome {
    Stored,
    Conflict,
}

#[derive(Clone)]
pub struct CouchRecordStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchRecordStore {
    /// Connect to CouchDB and check that the record database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.check_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    async fn check_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::DatabaseStatus {
                database,
                status: response.status(),
            })
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Stored),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value::<CouchDocument<T>>(doc)
                    .map(|document| document.body)
                    .map_err(|source| CouchDaoError::DeserializeValue {
                        path: format!("{ALL_DOCS}?startkey={prefix}"),
                        source,
                    })
            })
            .collect()
    }

    /// Read-modify-write of one team document; `Ok(false)` when absent or contended.
    async fn update_team<F>(&self, team_id: &str, apply: F) -> CouchResult<bool>
    where
        F: FnOnce(&mut TeamEntity) -> CouchResult<()>,
    {
        let doc_id = team_doc_id(team_id);
        let Some(mut document) = self
            .get_document::<CouchDocument<TeamEntity>>(&doc_id)
            .await?
        else {
            return Ok(false);
        };

        apply(&mut document.body)?;

        match self.put_document(&doc_id, &document).await? {
            PutOutcome::Stored => Ok(true),
            PutOutcome::Conflict => {
                warn!(team_id, "team document changed concurrently; write not applied");
                Ok(false)
            }
        }
    }
}

impl RecordStore for CouchRecordStore {
    fn load_snapshot(&self) -> BoxFuture<'static, StorageResult<SnapshotEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let (activities, schools, clusters, teams) = futures::try_join!(
                store.list_documents(ACTIVITY_PREFIX),
                store.list_documents(SCHOOL_PREFIX),
                store.list_documents(CLUSTER_PREFIX),
                store.list_documents(TEAM_PREFIX),
            )?;

            Ok(SnapshotEntity {
                activities,
                teams,
                schools,
                clusters,
            })
        })
    }

    fn update_cluster_result(
        &self,
        team_id: String,
        result: ClusterResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_team(&team_id, |team| {
                    team.apply_cluster_result(&result);
                    Ok(())
                })
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
            store
                .update_team(&team_id, |team| {
                    team.apply_area_result(&result)
                        .map_err(|source| CouchDaoError::EncodeStageInfo {
                            team_id: team.id.clone(),
                            source,
                        })
                })
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_database().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_database().await.map_err(Into::into) })
    }
}
