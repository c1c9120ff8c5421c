use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::activity::ActivityEntryDto, services::scoring_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/activity-log",
    tag = "activity",
    responses((status = 200, description = "Recent saves, newest first", body = [ActivityEntryDto]))
)]
/// List the most recent saved scores.
pub async fn activity_log(State(state): State<SharedState>) -> Json<Vec<ActivityEntryDto>> {
    Json(scoring_service::recent_activity(&state).await)
}

/// Configure the activity routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/activity-log", get(activity_log))
}
