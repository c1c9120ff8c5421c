use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scoring::promote::{StageStatus, promote};

/// Identifier of a team as issued by the record store.
pub type TeamId = String;

/// Score reserved for teams that did not take part in the stage.
pub const ABSENT_SCORE: f64 = -1.0;
/// Score of a team that has not been scored yet.
pub const UNSCORED: f64 = 0.0;
/// Highest score accepted by the engine.
pub const MAX_SCORE: f64 = 100.0;
/// Truthy value of the qualification flag.
pub const FLAG_TRUE: &str = "TRUE";
/// Medal marker meaning "compute the tier from the score".
pub const AUTO_MEDAL: &str = "auto";

/// Competition stage a screen operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Local round, ranked per cluster.
    Cluster,
    /// Aggregate round among cluster representatives.
    Area,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Cluster => "cluster",
            Scope::Area => "area",
        }
    }
}

/// Whether `score` is the "did not participate" sentinel.
pub fn is_absent(score: f64) -> bool {
    score == ABSENT_SCORE
}

/// Whether `score` lies in the accepted `[-1, 100]` domain.
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && (ABSENT_SCORE..=MAX_SCORE).contains(&score)
}

/// Scope-agnostic view of one stage result, as edited and displayed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageResult {
    pub score: f64,
    pub rank: String,
    /// Manual medal; empty or [`AUTO_MEDAL`] means automatic.
    pub medal: String,
    /// Qualification flag, [`FLAG_TRUE`] or empty. Always empty in area scope.
    pub flag: String,
}

impl StageResult {
    pub fn is_absent(&self) -> bool {
        is_absent(self.score)
    }
}

/// Cluster-stage fields carried by a team record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterResult {
    pub score: f64,
    pub rank: String,
    pub medal_override: String,
    pub flag: String,
    pub stage_status: StageStatus,
}

/// Area-stage result, stored by the record store as a serialized blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageInfo {
    pub score: f64,
    pub rank: String,
    pub medal: String,
}

/// A single write issued to the record store for one team.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultWrite {
    /// Write all five cluster fields together.
    Cluster(ClusterResult),
    /// Replace the area result blob.
    Area(StageInfo),
}

impl ResultWrite {
    /// Build the write persisting `resolved` in `scope`.
    ///
    /// An absent team is always written with an empty rank. Cluster writes carry the
    /// promotion decision derived from the written rank and flag.
    pub fn from_resolved(scope: Scope, resolved: &StageResult) -> Self {
        let rank = if resolved.is_absent() {
            String::new()
        } else {
            resolved.rank.clone()
        };

        match scope {
            Scope::Cluster => {
                let stage_status = promote(&rank, &resolved.flag);
                ResultWrite::Cluster(ClusterResult {
                    score: resolved.score,
                    rank,
                    medal_override: resolved.medal.clone(),
                    flag: resolved.flag.clone(),
                    stage_status,
                })
            }
            Scope::Area => ResultWrite::Area(StageInfo {
                score: resolved.score,
                rank,
                medal: resolved.medal.clone(),
            }),
        }
    }

    /// Blank result used by the reset sweep.
    pub fn blank(scope: Scope) -> Self {
        match scope {
            Scope::Cluster => ResultWrite::Cluster(ClusterResult::default()),
            Scope::Area => ResultWrite::Area(StageInfo::default()),
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            ResultWrite::Cluster(result) => result.score,
            ResultWrite::Area(info) => info.score,
        }
    }
}

/// Authoritative team record as loaded from the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub activity_id: String,
    pub school_id: String,
    pub name: String,
    /// Cluster derived from the school; `None` when it cannot be resolved.
    pub cluster_id: Option<String>,
    pub cluster: ClusterResult,
    pub area: StageInfo,
}

impl Team {
    /// Authoritative values of this team for `scope`.
    pub fn result(&self, scope: Scope) -> StageResult {
        match scope {
            Scope::Cluster => StageResult {
                score: self.cluster.score,
                rank: self.cluster.rank.clone(),
                medal: self.cluster.medal_override.clone(),
                flag: self.cluster.flag.clone(),
            },
            Scope::Area => StageResult {
                score: self.area.score,
                rank: self.area.rank.clone(),
                medal: self.area.medal.clone(),
                flag: String::new(),
            },
        }
    }

    /// Record a write that the store confirmed, touching only the written scope.
    pub fn apply_write(&mut self, write: &ResultWrite) {
        match write {
            ResultWrite::Cluster(result) => self.cluster = result.clone(),
            ResultWrite::Area(info) => self.area = info.clone(),
        }
    }

    pub fn is_area_eligible(&self) -> bool {
        self.cluster.stage_status == StageStatus::Area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team {
            id: "t1".into(),
            activity_id: "a1".into(),
            school_id: "s1".into(),
            name: "Robotics A".into(),
            cluster_id: Some("c1".into()),
            cluster: ClusterResult {
                score: 85.0,
                rank: "1".into(),
                medal_override: String::new(),
                flag: FLAG_TRUE.into(),
                stage_status: StageStatus::Area,
            },
            area: StageInfo {
                score: 72.5,
                rank: "3".into(),
                medal: String::new(),
            },
        }
    }

    #[test]
    fn result_reads_the_requested_scope() {
        let team = team();
        assert_eq!(team.result(Scope::Cluster).score, 85.0);
        assert_eq!(team.result(Scope::Cluster).flag, FLAG_TRUE);
        assert_eq!(team.result(Scope::Area).score, 72.5);
        assert!(team.result(Scope::Area).flag.is_empty());
    }

    #[test]
    fn area_write_leaves_cluster_fields_untouched() {
        let mut team = team();
        let before = team.cluster.clone();
        team.apply_write(&ResultWrite::Area(StageInfo {
            score: 91.0,
            rank: "1".into(),
            medal: String::new(),
        }));
        assert_eq!(team.cluster, before);
        assert_eq!(team.area.score, 91.0);
    }

    #[test]
    fn cluster_write_leaves_area_fields_untouched() {
        let mut team = team();
        let before = team.area.clone();
        team.apply_write(&ResultWrite::blank(Scope::Cluster));
        assert_eq!(team.area, before);
        assert_eq!(team.cluster, ClusterResult::default());
    }

    #[test]
    fn absent_results_are_written_without_rank() {
        let resolved = StageResult {
            score: ABSENT_SCORE,
            rank: "2".into(),
            medal: String::new(),
            flag: FLAG_TRUE.into(),
        };
        match ResultWrite::from_resolved(Scope::Cluster, &resolved) {
            ResultWrite::Cluster(result) => {
                assert!(result.rank.is_empty());
                assert_eq!(result.stage_status, StageStatus::None);
            }
            other => panic!("expected cluster write, got {other:?}"),
        }
    }

    #[test]
    fn score_domain_bounds() {
        assert!(is_valid_score(-1.0));
        assert!(is_valid_score(0.0));
        assert!(is_valid_score(100.0));
        assert!(is_valid_score(59.5));
        assert!(!is_valid_score(-1.5));
        assert!(!is_valid_score(100.1));
        assert!(!is_valid_score(f64::NAN));
    }
}
