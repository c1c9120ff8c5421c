//! Scoring sessions: one operator screen with its baseline and pending edits.

use std::sync::atomic::{AtomicBool, Ordering};

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::scoring::{
    batch::{BatchItem, BatchSummary, ResetProgress},
    overlay::EditOverlay,
    snapshot::Competition,
    team::{ResultWrite, Scope, Team, TeamId},
};

/// Latest known state of a reset sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetStatus {
    pub progress: ResetProgress,
    /// Set once the sweep has finished.
    pub summary: Option<BatchSummary>,
}

impl ResetStatus {
    pub fn is_running(&self) -> bool {
        self.summary.is_none()
    }
}

/// Baseline and overlay guarded together so saves see a consistent pair.
pub struct Workspace {
    /// Teams visible on the screen, as read when the session was opened and updated
    /// with every confirmed write.
    pub baseline: Competition,
    pub overlay: EditOverlay,
}

impl Workspace {
    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.baseline.teams.get(team_id)
    }

    /// Describe a visible team for the batch coordinator.
    pub fn batch_item(&self, team_id: &str, scope: Scope) -> Option<BatchItem> {
        let team = self.team(team_id)?;
        Some(BatchItem {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            school_name: self
                .baseline
                .school_name(&team.school_id)
                .unwrap_or_default()
                .to_string(),
            activity_name: self
                .baseline
                .activity_name(&team.activity_id)
                .unwrap_or_default()
                .to_string(),
            authoritative: team.result(scope),
        })
    }

    /// Batch items for every visible team, in baseline order.
    pub fn batch_items(&self, scope: Scope) -> Vec<BatchItem> {
        self.baseline
            .teams
            .keys()
            .filter_map(|team_id| self.batch_item(team_id, scope))
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<TeamId> {
        self.baseline.teams.keys().cloned().collect()
    }

    /// Fold a confirmed write into the baseline.
    pub fn apply_write(&mut self, team_id: &str, write: &ResultWrite) {
        if let Some(team) = self.baseline.teams.get_mut(team_id) {
            team.apply_write(write);
        }
    }
}

/// Restrict `competition` to the teams a session for these parameters shows.
pub fn capture_baseline(
    competition: &Competition,
    activity_id: &str,
    scope: Scope,
    cluster_id: Option<&str>,
) -> Competition {
    Competition {
        activities: competition.activities.clone(),
        schools: competition.schools.clone(),
        clusters: competition.clusters.clone(),
        teams: competition
            .visible_teams(activity_id, scope, cluster_id)
            .map(|team| (team.id.clone(), team.clone()))
            .collect(),
    }
}

/// A scoring screen opened by an operator for one activity and scope.
pub struct ScoringSession {
    pub id: Uuid,
    pub activity_id: String,
    pub scope: Scope,
    pub cluster_id: Option<String>,
    pub opened_at: OffsetDateTime,
    busy: AtomicBool,
    workspace: Mutex<Workspace>,
    reset: RwLock<Option<ResetStatus>>,
}

impl ScoringSession {
    pub fn new(
        activity_id: String,
        scope: Scope,
        cluster_id: Option<String>,
        competition: &Competition,
    ) -> Self {
        let baseline = capture_baseline(competition, &activity_id, scope, cluster_id.as_deref());
        Self {
            id: Uuid::new_v4(),
            activity_id,
            scope,
            cluster_id,
            opened_at: OffsetDateTime::now_utc(),
            busy: AtomicBool::new(false),
            workspace: Mutex::new(Workspace {
                baseline,
                overlay: EditOverlay::new(),
            }),
            reset: RwLock::new(None),
        }
    }

    pub fn workspace(&self) -> &Mutex<Workspace> {
        &self.workspace
    }

    /// Whether a reset currently owns the session.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the session for a reset; `false` when one is already running.
    pub fn try_begin_reset(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn end_reset(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    pub async fn reset_status(&self) -> Option<ResetStatus> {
        self.reset.read().await.clone()
    }

    pub async fn set_reset_status(&self, status: ResetStatus) {
        *self.reset.write().await = Some(status);
    }
}
