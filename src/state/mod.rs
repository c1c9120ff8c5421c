pub mod session;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::record_store::RecordStore,
    error::ServiceError,
    scoring::activity::ActivityLog,
};

pub use self::session::ScoringSession;
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: record store handle, sessions and broadcast hubs.
pub struct AppState {
    record_store: RwLock<Option<Arc<dyn RecordStore>>>,
    sse: SseHub,
    sessions: DashMap<Uuid, Arc<ScoringSession>>,
    activity_log: Arc<ActivityLog>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a record store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            record_store: RwLock::new(None),
            sse: SseHub::new(config.sse_capacity),
            sessions: DashMap::new(),
            activity_log: Arc::new(ActivityLog::new(config.activity_log_capacity)),
            degraded: degraded_tx,
            config,
        })
    }

    /// Obtain a handle to the current record store, if one is installed.
    pub async fn record_store(&self) -> Option<Arc<dyn RecordStore>> {
        let guard = self.record_store.read().await;
        guard.as_ref().cloned()
    }

    /// Record store or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_record_store(&self) -> Result<Arc<dyn RecordStore>, ServiceError> {
        self.record_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new record store implementation and leave degraded mode.
    pub async fn set_record_store(&self, store: Arc<dyn RecordStore>) {
        {
            let mut guard = self.record_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current record store and enter degraded mode.
    pub async fn clear_record_store(&self) {
        {
            let mut guard = self.record_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub used for the SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Open scoring sessions keyed by their identifier.
    pub fn sessions(&self) -> &DashMap<Uuid, Arc<ScoringSession>> {
        &self.sessions
    }

    pub fn activity_log(&self) -> &Arc<ActivityLog> {
        &self.activity_log
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::record_store::memory::MemoryRecordStore;

    #[tokio::test]
    async fn degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_record_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .set_record_store(Arc::new(MemoryRecordStore::default()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_record_store().await;
        assert!(state.is_degraded().await);
        assert!(state.record_store().await.is_none());
    }
}
