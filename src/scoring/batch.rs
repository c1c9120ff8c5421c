//! Persistence of overlay edits and the reset sweep.
//!
//! Saves run one team at a time and never abort on a failed write: every attempt is
//! accounted for in a [`BatchSummary`]. The reset sweep writes blank results in
//! fixed-size chunks, each chunk concurrently, and reports progress as a stream.

use std::{sync::Arc, time::Instant};

use async_stream::stream;
use futures::{Stream, future::join_all};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    dao::{record_store::RecordStore, storage::StorageError},
    scoring::{
        activity::{ActivityEntry, ActivityLog},
        overlay::EditOverlay,
        team::{ResultWrite, Scope, StageResult, TeamId},
    },
};

/// Why a single team write did not land.
#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error("record store did not apply the write")]
    Rejected,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Everything needed to persist one team and describe it in the activity feed.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub team_id: TeamId,
    pub team_name: String,
    pub school_name: String,
    pub activity_name: String,
    pub authoritative: StageResult,
}

/// A team write the store confirmed.
#[derive(Debug, Clone)]
pub struct SavedTeam {
    pub team_id: TeamId,
    pub write: ResultWrite,
    pub entry: ActivityEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Complete,
    Partial,
    Failed,
}

/// Aggregate accounting of a batch save or reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: Vec<TeamId>,
    pub failed: Vec<TeamId>,
}

impl BatchSummary {
    pub fn outcome(&self) -> BatchOutcome {
        if self.failed.is_empty() {
            BatchOutcome::Complete
        } else if self.succeeded.is_empty() {
            BatchOutcome::Failed
        } else {
            BatchOutcome::Partial
        }
    }

    /// Human readable result line for the operator.
    pub fn message(&self) -> String {
        match self.outcome() {
            BatchOutcome::Complete if self.attempted == 0 => "nothing to save".to_string(),
            BatchOutcome::Complete => format!("all {} succeeded", self.attempted),
            BatchOutcome::Partial => {
                format!("{} of {} succeeded", self.succeeded.len(), self.attempted)
            }
            BatchOutcome::Failed => format!("all {} failed", self.attempted),
        }
    }

    fn record(&mut self, team_id: TeamId, ok: bool) {
        self.attempted += 1;
        if ok {
            self.succeeded.push(team_id);
        } else {
            self.failed.push(team_id);
        }
    }
}

/// Result of a sequential batch save.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub saved: Vec<SavedTeam>,
}

/// Snapshot of a running reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetProgress {
    pub current: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResetEvent {
    Started { total: usize },
    Progress(ResetProgress),
    Finished(BatchSummary),
}

/// Persists overlay edits of one scope through a record store.
#[derive(Clone)]
pub struct BatchCoordinator {
    store: Arc<dyn RecordStore>,
    scope: Scope,
    log: Arc<ActivityLog>,
}

impl BatchCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope, log: Arc<ActivityLog>) -> Self {
        Self { store, scope, log }
    }

    /// Persist the resolved edit of one team.
    ///
    /// On success the edit is cleared and an activity entry recorded. On failure the
    /// edit stays in the overlay untouched.
    pub async fn save_one(
        &self,
        overlay: &mut EditOverlay,
        item: &BatchItem,
    ) -> Result<SavedTeam, WriteFailure> {
        let resolved = overlay.resolve(&item.team_id, &item.authoritative);
        let write = ResultWrite::from_resolved(self.scope, &resolved);

        if let Err(err) = persist(self.store.as_ref(), &item.team_id, &write).await {
            warn!(
                team_id = %item.team_id,
                scope = self.scope.as_str(),
                error = %err,
                "failed to save team result"
            );
            return Err(err);
        }

        overlay.clear(&item.team_id);

        let entry = ActivityEntry {
            logged_at: OffsetDateTime::now_utc(),
            team_id: item.team_id.clone(),
            team_name: item.team_name.clone(),
            school_name: item.school_name.clone(),
            activity_name: item.activity_name.clone(),
            scope: self.scope,
            score: write.score(),
        };
        self.log.record(entry.clone()).await;

        info!(
            team_id = %item.team_id,
            scope = self.scope.as_str(),
            score = write.score(),
            "team result saved"
        );

        Ok(SavedTeam {
            team_id: item.team_id.clone(),
            write,
            entry,
        })
    }

    /// Save every dirty item one after another.
    ///
    /// Items without a dirty edit are skipped.
    pub async fn save_dirty(&self, overlay: &mut EditOverlay, items: &[BatchItem]) -> BatchReport {
        let mut report = BatchReport::default();

        for item in items {
            if !overlay.is_dirty(&item.team_id) {
                continue;
            }
            match self.save_one(overlay, item).await {
                Ok(saved) => {
                    report.summary.record(item.team_id.clone(), true);
                    report.saved.push(saved);
                }
                Err(_) => report.summary.record(item.team_id.clone(), false),
            }
        }

        info!(
            scope = self.scope.as_str(),
            attempted = report.summary.attempted,
            succeeded = report.summary.succeeded.len(),
            "batch save finished"
        );
        report
    }

    /// Write blank results for `team_ids`, `chunk_size` teams at a time.
    ///
    /// A chunk is submitted only after the previous one fully resolved. The stream
    /// always ends with [`ResetEvent::Finished`].
    pub fn reset(
        &self,
        team_ids: Vec<TeamId>,
        chunk_size: usize,
    ) -> impl Stream<Item = ResetEvent> + Send + 'static {
        let store = Arc::clone(&self.store);
        let scope = self.scope;
        let chunk_size = chunk_size.max(1);

        stream! {
            let total = team_ids.len();
            let started = Instant::now();
            let blank = ResultWrite::blank(scope);
            let mut summary = BatchSummary::default();
            let mut current = 0;

            info!(scope = scope.as_str(), total, chunk_size, "reset started");
            yield ResetEvent::Started { total };

            for chunk in team_ids.chunks(chunk_size) {
                let results = join_all(
                    chunk
                        .iter()
                        .map(|team_id| persist(store.as_ref(), team_id, &blank)),
                )
                .await;

                for (team_id, result) in chunk.iter().zip(results) {
                    if let Err(err) = &result {
                        warn!(team_id = %team_id, scope = scope.as_str(), error = %err, "failed to reset team");
                    }
                    summary.record(team_id.clone(), result.is_ok());
                }

                current = (current + chunk_size).min(total);
                let progress = ResetProgress {
                    current,
                    total,
                    succeeded: summary.succeeded.len(),
                    failed: summary.failed.len(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
                debug!(current, total, "reset chunk done");
                yield ResetEvent::Progress(progress);
            }

            info!(
                scope = scope.as_str(),
                succeeded = summary.succeeded.len(),
                failed = summary.failed.len(),
                "reset finished"
            );
            yield ResetEvent::Finished(summary);
        }
    }
}

async fn persist(
    store: &dyn RecordStore,
    team_id: &str,
    write: &ResultWrite,
) -> Result<(), WriteFailure> {
    let applied = match write {
        ResultWrite::Cluster(result) => {
            store
                .update_cluster_result(team_id.to_string(), result.clone().into())
                .await?
        }
        ResultWrite::Area(info) => {
            store
                .update_area_result(team_id.to_string(), info.clone().into())
                .await?
        }
    };

    if applied {
        Ok(())
    } else {
        Err(WriteFailure::Rejected)
    }
}
