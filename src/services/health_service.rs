use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether a record store is installed, probing it when present.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_record_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "record store health check failed");
            }
        }
        Err(_) => warn!("record store unavailable (degraded mode)"),
    }

    let open_sessions = state.sessions().len();
    if state.is_degraded().await {
        HealthResponse::degraded(open_sessions)
    } else {
        HealthResponse::ok(open_sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::record_store::memory::MemoryRecordStore, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .set_record_store(Arc::new(MemoryRecordStore::default()))
            .await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.open_sessions, 0);
    }
}
