//! DTOs describing scoring sessions and their derived board.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_timestamp,
    scoring::{
        board::BoardRow,
        medal::DID_NOT_PARTICIPATE,
        promote::StageStatus,
        team::{FLAG_TRUE, Scope},
    },
    state::ScoringSession,
};

/// Payload opening a scoring screen for one activity and scope.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OpenSessionRequest {
    #[validate(length(min = 1, message = "activity_id must not be empty"))]
    pub activity_id: String,
    pub scope: Scope,
    /// Restrict the screen to one cluster.
    #[serde(default)]
    #[validate(length(min = 1, message = "cluster_id must not be empty when given"))]
    pub cluster_id: Option<String>,
}

/// Session metadata returned with every board.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub activity_id: String,
    pub activity_name: String,
    pub scope: Scope,
    pub cluster_id: Option<String>,
    /// RFC 3339 timestamp of when the baseline was captured.
    pub opened_at: String,
    pub team_count: usize,
    pub dirty_count: usize,
    /// Whether a reset currently owns the session.
    pub busy: bool,
}

impl SessionSummary {
    pub fn new(
        session: &ScoringSession,
        activity_name: String,
        team_count: usize,
        dirty_count: usize,
    ) -> Self {
        Self {
            id: session.id,
            activity_id: session.activity_id.clone(),
            activity_name,
            scope: session.scope,
            cluster_id: session.cluster_id.clone(),
            opened_at: format_timestamp(session.opened_at),
            team_count,
            dirty_count,
            busy: session.is_busy(),
        }
    }
}

/// One team row of the board.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardRowDto {
    pub team_id: String,
    pub team_name: String,
    pub school_name: String,
    pub cluster_id: Option<String>,
    pub cluster_name: Option<String>,
    /// Effective score (`-1` = did not participate, `0` = not scored).
    pub score: f64,
    /// Effective rank; replaced by "did not participate" for absent teams.
    pub rank: String,
    /// Displayed medal label, empty when not yet scored.
    pub medal: String,
    /// Medal entered by the operator, empty or `auto` for the computed tier.
    pub manual_medal: String,
    /// Cluster representative flag.
    pub flag: bool,
    /// Whether the row has unsaved changes.
    pub dirty: bool,
    /// Rank the auto-ranker would assign, when the team is scored.
    pub computed_rank: Option<String>,
    /// Stage status a cluster save would record.
    pub promotion: Option<String>,
}

impl From<BoardRow> for BoardRowDto {
    fn from(value: BoardRow) -> Self {
        let rank = if value.result.is_absent() {
            DID_NOT_PARTICIPATE.to_string()
        } else {
            value.result.rank.clone()
        };

        Self {
            team_id: value.team_id,
            team_name: value.team_name,
            school_name: value.school_name,
            cluster_id: value.cluster_id,
            cluster_name: value.cluster_name,
            score: value.result.score,
            rank,
            medal: value.medal.label().to_string(),
            manual_medal: value.result.medal,
            flag: value.result.flag == FLAG_TRUE,
            dirty: value.dirty,
            computed_rank: value.computed_rank.map(|target| target.to_string()),
            promotion: value.promotion.map(|status: StageStatus| status.as_str().to_string()),
        }
    }
}

/// Derived board of a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardResponse {
    pub session: SessionSummary,
    pub rows: Vec<BoardRowDto>,
}
