use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        scoring::{
            AutoRankResponse, BatchSummaryDto, FieldUpdate, ResetProgressDto, ResetRequest,
            ResetStartedResponse, SaveTeamResponse,
        },
        session::{BoardResponse, BoardRowDto, OpenSessionRequest},
    },
    error::AppError,
    services::scoring_service,
    state::SharedState,
};

/// Routes exposing scoring sessions to the operator UI.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_board).delete(close_session))
        .route("/sessions/{id}/teams/{team_id}", put(set_field))
        .route("/sessions/{id}/edits", delete(discard_edits))
        .route("/sessions/{id}/auto-rank", post(auto_rank))
        .route("/sessions/{id}/teams/{team_id}/save", post(save_team))
        .route("/sessions/{id}/save", post(save_dirty))
        .route("/sessions/{id}/reset", post(start_reset).get(reset_progress))
}

/// Open a scoring session for an activity and scope.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 200, description = "Session opened", body = BoardResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Unknown activity"),
        (status = 503, description = "No record store available")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<OpenSessionRequest>>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = scoring_service::open_session(&state, payload).await?;
    Ok(Json(board))
}

/// Derived board of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Current board", body = BoardResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_board(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = scoring_service::board(&state, id).await?;
    Ok(Json(board))
}

/// Close a session and drop its pending edits.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "A reset is running")
    )
)]
pub async fn close_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    scoring_service::close_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change one field of a team's pending edit.
#[utoipa::path(
    put,
    path = "/sessions/{id}/teams/{team_id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("team_id" = String, Path, description = "Team identifier")
    ),
    request_body = FieldUpdate,
    responses(
        (status = 200, description = "Updated row", body = BoardRowDto),
        (status = 400, description = "Invalid value"),
        (status = 404, description = "Unknown session or team"),
        (status = 409, description = "A reset is running")
    )
)]
pub async fn set_field(
    State(state): State<SharedState>,
    Path((id, team_id)): Path<(Uuid, String)>,
    Valid(Json(payload)): Valid<Json<FieldUpdate>>,
) -> Result<Json<BoardRowDto>, AppError> {
    let row = scoring_service::set_field(&state, id, &team_id, payload).await?;
    Ok(Json(row))
}

/// Discard every pending edit, keeping the session.
#[utoipa::path(
    delete,
    path = "/sessions/{id}/edits",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Board without edits", body = BoardResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn discard_edits(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = scoring_service::discard_edits(&state, id).await?;
    Ok(Json(board))
}

/// Write computed ranks into the session's edits.
#[utoipa::path(
    post,
    path = "/sessions/{id}/auto-rank",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Ranks applied", body = AutoRankResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn auto_rank(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AutoRankResponse>, AppError> {
    let response = scoring_service::auto_rank(&state, id).await?;
    Ok(Json(response))
}

/// Save the pending edit of one team.
#[utoipa::path(
    post,
    path = "/sessions/{id}/teams/{team_id}/save",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("team_id" = String, Path, description = "Team identifier")
    ),
    responses(
        (status = 200, description = "Save attempted", body = SaveTeamResponse),
        (status = 400, description = "Nothing to save"),
        (status = 404, description = "Unknown session or team")
    )
)]
pub async fn save_team(
    State(state): State<SharedState>,
    Path((id, team_id)): Path<(Uuid, String)>,
) -> Result<Json<SaveTeamResponse>, AppError> {
    let response = scoring_service::save_team(&state, id, &team_id).await?;
    Ok(Json(response))
}

/// Save every dirty team of the session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/save",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Batch result", body = BatchSummaryDto),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn save_dirty(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchSummaryDto>, AppError> {
    let summary = scoring_service::save_dirty(&state, id).await?;
    Ok(Json(summary))
}

/// Reset every team of the session to a blank result.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reset",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = ResetRequest,
    responses(
        (status = 202, description = "Reset started", body = ResetStartedResponse),
        (status = 400, description = "Missing confirmation"),
        (status = 409, description = "A reset is already running")
    )
)]
pub async fn start_reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ResetRequest>>,
) -> Result<(StatusCode, Json<ResetStartedResponse>), AppError> {
    let started = scoring_service::start_reset(&state, id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(started)))
}

/// Latest progress of the session's reset.
#[utoipa::path(
    get,
    path = "/sessions/{id}/reset",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Reset progress", body = ResetProgressDto),
        (status = 404, description = "No reset for this session")
    )
)]
pub async fn reset_progress(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResetProgressDto>, AppError> {
    let progress = scoring_service::reset_progress(&state, id).await?;
    Ok(Json(progress))
}
