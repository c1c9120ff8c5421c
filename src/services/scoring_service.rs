use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::MutexGuard;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        activity::ActivityEntryDto,
        scoring::{
            AutoRankResponse, BatchSummaryDto, FieldUpdate, ResetProgressDto, ResetRequest,
            ResetStartedResponse, SaveTeamResponse,
        },
        session::{BoardResponse, BoardRowDto, OpenSessionRequest, SessionSummary},
    },
    error::ServiceError,
    scoring::{
        batch::{BatchCoordinator, ResetEvent, ResetProgress},
        board::{authoritative_results, build_board, rank_candidates},
        rank,
        snapshot::Competition,
        team::{ResultWrite, Scope},
    },
    services::sse_events,
    state::{
        ScoringSession, SharedState,
        session::{ResetStatus, Workspace},
    },
};

/// Open a scoring session, capturing a baseline of the teams it shows.
pub async fn open_session(
    state: &SharedState,
    request: OpenSessionRequest,
) -> Result<BoardResponse, ServiceError> {
    request.validate()?;

    let store = state.require_record_store().await?;
    let competition = Competition::from(store.load_snapshot().await?);

    if !competition.activities.contains_key(&request.activity_id) {
        return Err(ServiceError::NotFound(format!(
            "activity `{}` not found",
            request.activity_id
        )));
    }

    let session = Arc::new(ScoringSession::new(
        request.activity_id,
        request.scope,
        request.cluster_id,
        &competition,
    ));
    state.sessions().insert(session.id, Arc::clone(&session));

    let workspace = session.workspace().lock().await;
    info!(
        session_id = %session.id,
        activity_id = %session.activity_id,
        scope = session.scope.as_str(),
        teams = workspace.baseline.teams.len(),
        "scoring session opened"
    );
    Ok(render_board(&session, &workspace))
}

/// Current board of a session.
pub async fn board(state: &SharedState, id: Uuid) -> Result<BoardResponse, ServiceError> {
    let session = find_session(state, id)?;
    let workspace = session.workspace().lock().await;
    Ok(render_board(&session, &workspace))
}

/// Close a session, dropping its pending edits.
pub async fn close_session(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let session = find_session(state, id)?;

    let dropped = lock_idle(&session).await?.overlay.len();
    state.sessions().remove(&id);
    info!(session_id = %id, dropped_edits = dropped, "scoring session closed");
    Ok(())
}

/// Discard every pending edit of a session, keeping the session open.
pub async fn discard_edits(state: &SharedState, id: Uuid) -> Result<BoardResponse, ServiceError> {
    let session = find_session(state, id)?;

    let mut workspace = lock_idle(&session).await?;
    workspace.overlay.discard();
    info!(session_id = %id, "pending edits discarded");
    Ok(render_board(&session, &workspace))
}

/// Apply one field change to a team's pending edit.
pub async fn set_field(
    state: &SharedState,
    id: Uuid,
    team_id: &str,
    update: FieldUpdate,
) -> Result<BoardRowDto, ServiceError> {
    update.validate()?;
    let session = find_session(state, id)?;
    if matches!(update, FieldUpdate::Flag(_)) && session.scope == Scope::Area {
        return Err(ServiceError::InvalidInput(
            "the qualification flag only exists in cluster scope".into(),
        ));
    }

    let mut workspace = lock_idle(&session).await?;
    let authoritative = workspace
        .team(team_id)
        .map(|team| team.result(session.scope))
        .ok_or_else(|| team_not_found(team_id))?;
    workspace
        .overlay
        .set(team_id, update.into(), &authoritative);

    board_row(&session, &workspace, team_id).ok_or_else(|| team_not_found(team_id))
}

/// Write computed ranks of every visible team into the overlay.
pub async fn auto_rank(state: &SharedState, id: Uuid) -> Result<AutoRankResponse, ServiceError> {
    let session = find_session(state, id)?;

    let mut workspace = lock_idle(&session).await?;
    let Workspace { baseline, overlay } = &mut *workspace;
    let results = authoritative_results(baseline.teams.values(), session.scope);
    let candidates = rank_candidates(&results, session.scope);
    let written = rank::auto_rank(&candidates, overlay);

    info!(session_id = %id, written, "auto-rank applied");
    Ok(AutoRankResponse { written })
}

/// Persist the pending edit of one team.
///
/// A failed write is reported in the response and keeps the edit.
pub async fn save_team(
    state: &SharedState,
    id: Uuid,
    team_id: &str,
) -> Result<SaveTeamResponse, ServiceError> {
    let session = find_session(state, id)?;
    let store = state.require_record_store().await?;

    let mut workspace = lock_idle(&session).await?;
    let item = workspace
        .batch_item(team_id, session.scope)
        .ok_or_else(|| team_not_found(team_id))?;
    if workspace.overlay.get(team_id).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "team `{team_id}` has no pending changes"
        )));
    }

    let coordinator =
        BatchCoordinator::new(store, session.scope, Arc::clone(state.activity_log()));
    let (saved, message) = match coordinator.save_one(&mut workspace.overlay, &item).await {
        Ok(saved) => {
            workspace.apply_write(&saved.team_id, &saved.write);
            sse_events::broadcast_activity_logged(state, saved.entry.into());
            (true, "saved".to_string())
        }
        Err(err) => (false, format!("save failed: {err}")),
    };

    Ok(SaveTeamResponse {
        team_id: team_id.to_string(),
        saved,
        message,
        row: board_row(&session, &workspace, team_id),
    })
}

/// Persist every dirty visible team one after another.
pub async fn save_dirty(state: &SharedState, id: Uuid) -> Result<BatchSummaryDto, ServiceError> {
    let session = find_session(state, id)?;
    let store = state.require_record_store().await?;

    let mut workspace = lock_idle(&session).await?;
    let items = workspace.batch_items(session.scope);
    let coordinator =
        BatchCoordinator::new(store, session.scope, Arc::clone(state.activity_log()));
    let report = coordinator.save_dirty(&mut workspace.overlay, &items).await;

    for saved in report.saved {
        workspace.apply_write(&saved.team_id, &saved.write);
        sse_events::broadcast_activity_logged(state, saved.entry.into());
    }

    let summary = BatchSummaryDto::from(report.summary);
    sse_events::broadcast_batch_saved(state, id, summary.clone());
    Ok(summary)
}

/// Start a reset of every visible team in the background.
pub async fn start_reset(
    state: &SharedState,
    id: Uuid,
    request: ResetRequest,
) -> Result<ResetStartedResponse, ServiceError> {
    request.validate()?;
    let session = find_session(state, id)?;
    let store = state.require_record_store().await?;

    // Claimed before waiting for the workspace: operations queued on the lock
    // then find the session busy and are refused.
    if !session.try_begin_reset() {
        return Err(ServiceError::Busy(
            "a reset is already running on this session".into(),
        ));
    }

    let team_ids = session.workspace().lock().await.visible_ids();
    let total = team_ids.len();
    let chunk_size = state.config().reset_chunk_size;
    let coordinator =
        BatchCoordinator::new(store, session.scope, Arc::clone(state.activity_log()));
    let events = coordinator.reset(team_ids, chunk_size);

    tokio::spawn(drive_reset(Arc::clone(state), session, events));

    Ok(ResetStartedResponse { total, chunk_size })
}

/// Latest progress of the session's reset.
pub async fn reset_progress(state: &SharedState, id: Uuid) -> Result<ResetProgressDto, ServiceError> {
    let session = find_session(state, id)?;
    session
        .reset_status()
        .await
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("no reset has run for session `{id}`")))
}

/// Recent activity entries, newest first.
pub async fn recent_activity(state: &SharedState) -> Vec<ActivityEntryDto> {
    state
        .activity_log()
        .recent()
        .await
        .into_iter()
        .map(Into::into)
        .collect()
}

async fn drive_reset(
    state: SharedState,
    session: Arc<ScoringSession>,
    events: impl Stream<Item = ResetEvent> + Send,
) {
    let mut events = Box::pin(events);
    let mut finished = false;
    let mut last = ResetProgress {
        current: 0,
        total: 0,
        succeeded: 0,
        failed: 0,
        elapsed_ms: 0,
    };

    while let Some(event) = events.next().await {
        let status = match event {
            ResetEvent::Started { total } => {
                last.total = total;
                ResetStatus {
                    progress: last,
                    summary: None,
                }
            }
            ResetEvent::Progress(progress) => {
                last = progress;
                ResetStatus {
                    progress,
                    summary: None,
                }
            }
            ResetEvent::Finished(summary) => {
                let blank = ResultWrite::blank(session.scope);
                let mut workspace = session.workspace().lock().await;
                for team_id in &summary.succeeded {
                    workspace.overlay.clear(team_id);
                    workspace.apply_write(team_id, &blank);
                }
                if !summary.failed.is_empty() {
                    warn!(
                        session_id = %session.id,
                        failed = summary.failed.len(),
                        "reset finished with failures"
                    );
                }
                ResetStatus {
                    progress: last,
                    summary: Some(summary),
                }
            }
        };

        let running = status.is_running();
        session.set_reset_status(status.clone()).await;
        if !running {
            session.end_reset();
            finished = true;
        }
        sse_events::broadcast_reset_progress(&state, session.id, status.into());
    }

    if !finished {
        session.end_reset();
    }
}

fn find_session(state: &SharedState, id: Uuid) -> Result<Arc<ScoringSession>, ServiceError> {
    state
        .sessions()
        .get(&id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))
}

/// Lock the workspace of a session no reset owns.
///
/// The busy flag is read once the lock is held, so an operation that waited
/// behind a reset claim is refused.
async fn lock_idle(session: &ScoringSession) -> Result<MutexGuard<'_, Workspace>, ServiceError> {
    let workspace = session.workspace().lock().await;
    if session.is_busy() {
        return Err(ServiceError::Busy(
            "a reset is running on this session".into(),
        ));
    }
    Ok(workspace)
}

fn team_not_found(team_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("team `{team_id}` is not part of this session"))
}

fn render_board(session: &ScoringSession, workspace: &Workspace) -> BoardResponse {
    let rows = build_board(&workspace.baseline, session.scope, &workspace.overlay);
    let activity_name = workspace
        .baseline
        .activity_name(&session.activity_id)
        .unwrap_or_default()
        .to_string();
    let dirty_count = rows.iter().filter(|row| row.dirty).count();

    BoardResponse {
        session: SessionSummary::new(session, activity_name, rows.len(), dirty_count),
        rows: rows.into_iter().map(Into::into).collect(),
    }
}

fn board_row(session: &ScoringSession, workspace: &Workspace, team_id: &str) -> Option<BoardRowDto> {
    build_board(&workspace.baseline, session.scope, &workspace.overlay)
        .into_iter()
        .find(|row| row.team_id == team_id)
        .map(Into::into)
}
