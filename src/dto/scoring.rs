//! DTOs for edits, saves and resets.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        session::BoardRowDto,
        validation::{validate_confirmed, validate_rank, validate_score},
    },
    scoring::{
        batch::{BatchOutcome, BatchSummary, ResetProgress},
        overlay::FieldChange,
        team::FLAG_TRUE,
    },
    state::session::ResetStatus,
};

/// Single-field change of a team's pending edit.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    /// Score in `[-1, 100]`; `-1` marks a team that did not participate.
    Score(f64),
    /// Rank, empty or a positive number.
    Rank(String),
    /// Manual medal; empty or `auto` restores the computed tier.
    Medal(String),
    /// Cluster representative flag.
    Flag(bool),
}

impl Validate for FieldUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self {
            FieldUpdate::Score(score) => {
                if let Err(err) = validate_score(*score) {
                    errors.add("value", err);
                }
            }
            FieldUpdate::Rank(rank) => {
                if let Err(err) = validate_rank(rank.trim()) {
                    errors.add("value", err);
                }
            }
            FieldUpdate::Medal(_) | FieldUpdate::Flag(_) => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<FieldUpdate> for FieldChange {
    fn from(value: FieldUpdate) -> Self {
        match value {
            FieldUpdate::Score(score) => FieldChange::Score(score),
            FieldUpdate::Rank(rank) => FieldChange::Rank(rank.trim().to_string()),
            FieldUpdate::Medal(medal) => FieldChange::Medal(medal.trim().to_string()),
            FieldUpdate::Flag(true) => FieldChange::Flag(FLAG_TRUE.to_string()),
            FieldUpdate::Flag(false) => FieldChange::Flag(String::new()),
        }
    }
}

/// Result of an auto-rank run.
#[derive(Debug, Serialize, ToSchema)]
pub struct AutoRankResponse {
    /// Number of edits the run wrote into the overlay.
    pub written: usize,
}

/// Result of a single-team save.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveTeamResponse {
    pub team_id: String,
    pub saved: bool,
    pub message: String,
    /// Refreshed row after the save attempt.
    pub row: Option<BoardRowDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcomeDto {
    Complete,
    Partial,
    Failed,
}

impl From<BatchOutcome> for BatchOutcomeDto {
    fn from(value: BatchOutcome) -> Self {
        match value {
            BatchOutcome::Complete => BatchOutcomeDto::Complete,
            BatchOutcome::Partial => BatchOutcomeDto::Partial,
            BatchOutcome::Failed => BatchOutcomeDto::Failed,
        }
    }
}

/// Aggregate result of a batch save or reset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchSummaryDto {
    pub outcome: BatchOutcomeDto,
    pub message: String,
    pub attempted: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl From<BatchSummary> for BatchSummaryDto {
    fn from(value: BatchSummary) -> Self {
        Self {
            outcome: value.outcome().into(),
            message: value.message(),
            attempted: value.attempted,
            succeeded: value.succeeded,
            failed: value.failed,
        }
    }
}

/// Request starting a reset sweep over the session's teams.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequest {
    /// Must be `true`; a reset cannot be undone.
    #[serde(default)]
    pub confirm: bool,
}

impl Validate for ResetRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_confirmed(self.confirm) {
            errors.add("confirm", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Acknowledgement of a started reset.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetStartedResponse {
    pub total: usize,
    pub chunk_size: usize,
}

/// Pollable state of the latest reset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResetProgressDto {
    pub running: bool,
    pub current: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    /// Present once the reset finished.
    pub summary: Option<BatchSummaryDto>,
}

impl From<ResetProgress> for ResetProgressDto {
    fn from(value: ResetProgress) -> Self {
        Self {
            running: true,
            current: value.current,
            total: value.total,
            succeeded: value.succeeded,
            failed: value.failed,
            elapsed_ms: value.elapsed_ms,
            summary: None,
        }
    }
}

impl From<ResetStatus> for ResetProgressDto {
    fn from(value: ResetStatus) -> Self {
        let running = value.is_running();
        Self {
            running,
            summary: value.summary.map(Into::into),
            ..Self::from(value.progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_updates_parse_from_tagged_json() {
        let update: FieldUpdate =
            serde_json::from_str(r#"{ "field": "score", "value": 87.5 }"#).unwrap();
        assert!(update.validate().is_ok());
        assert_eq!(FieldChange::from(update), FieldChange::Score(87.5));

        let update: FieldUpdate =
            serde_json::from_str(r#"{ "field": "flag", "value": true }"#).unwrap();
        assert_eq!(FieldChange::from(update), FieldChange::Flag("TRUE".into()));
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let update: FieldUpdate =
            serde_json::from_str(r#"{ "field": "score", "value": 120 }"#).unwrap();
        assert!(update.validate().is_err());

        let update: FieldUpdate =
            serde_json::from_str(r#"{ "field": "rank", "value": "first" }"#).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        assert!(serde_json::from_str::<FieldUpdate>(r#"{ "field": "stage", "value": "x" }"#).is_err());
    }

    #[test]
    fn reset_requires_confirmation() {
        let request: ResetRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_err());
        let request: ResetRequest = serde_json::from_str(r#"{ "confirm": true }"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn finished_status_reports_summary() {
        let dto = ResetProgressDto::from(ResetStatus {
            progress: ResetProgress {
                current: 4,
                total: 4,
                succeeded: 3,
                failed: 1,
                elapsed_ms: 12,
            },
            summary: Some(BatchSummary {
                attempted: 4,
                succeeded: vec!["t1".into(), "t2".into(), "t4".into()],
                failed: vec!["t3".into()],
            }),
        });

        assert!(!dto.running);
        let summary = dto.summary.unwrap();
        assert_eq!(summary.outcome, BatchOutcomeDto::Partial);
        assert_eq!(summary.message, "3 of 4 succeeded");
    }
}
