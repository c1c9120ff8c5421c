use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        activity::ActivityEntryDto,
        scoring::{BatchSummaryDto, ResetProgressDto},
        sse::{
            ActivityLoggedEvent, BatchSavedEvent, ResetProgressEvent, ServerEvent, SystemStatus,
        },
    },
    state::SharedState,
};

const EVENT_RESET_PROGRESS: &str = "reset.progress";
const EVENT_ACTIVITY_LOGGED: &str = "activity.logged";
const EVENT_BATCH_SAVED: &str = "batch.saved";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the progress (or final summary) of a session reset.
pub fn broadcast_reset_progress(state: &SharedState, session_id: Uuid, progress: ResetProgressDto) {
    let payload = ResetProgressEvent {
        session_id,
        progress,
    };
    send_event(state, EVENT_RESET_PROGRESS, &payload);
}

/// Broadcast a newly recorded activity entry.
pub fn broadcast_activity_logged(state: &SharedState, entry: ActivityEntryDto) {
    send_event(state, EVENT_ACTIVITY_LOGGED, &ActivityLoggedEvent(entry));
}

/// Broadcast the aggregate result of a batch save.
pub fn broadcast_batch_saved(state: &SharedState, session_id: Uuid, summary: BatchSummaryDto) {
    let payload = BatchSavedEvent {
        session_id,
        summary,
    };
    send_event(state, EVENT_BATCH_SAVED, &payload);
}

/// Broadcast whether the backend runs without a record store.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn events_are_named_and_json_encoded() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.sse().subscribe();

        broadcast_system_status(&state, true);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("system.status"));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["degraded"], true);
    }
}
