//! Derived view of a scoring screen: resolved values, medals and rank suggestions.

use crate::scoring::{
    medal::{Medal, classify},
    overlay::EditOverlay,
    promote::{StageStatus, promote},
    rank::{Partition, RankCandidate, RankTarget, compute_ranks},
    snapshot::Competition,
    team::{Scope, StageResult, Team},
};

/// One row of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub team_id: String,
    pub team_name: String,
    pub school_name: String,
    pub cluster_id: Option<String>,
    pub cluster_name: Option<String>,
    /// Authoritative result with any pending edit applied.
    pub result: StageResult,
    pub medal: Medal,
    pub dirty: bool,
    /// Rank the auto-ranker would assign; `None` for unscored teams.
    pub computed_rank: Option<RankTarget>,
    /// Promotion a cluster save would record; always `None` in area scope.
    pub promotion: Option<StageStatus>,
}

/// Authoritative results of `teams` in `scope`, kept next to their team.
pub fn authoritative_results<'a>(
    teams: impl Iterator<Item = &'a Team>,
    scope: Scope,
) -> Vec<(&'a Team, StageResult)> {
    teams.map(|team| (team, team.result(scope))).collect()
}

/// Rank candidates borrowing from [`authoritative_results`].
pub fn rank_candidates<'a>(
    results: &'a [(&'a Team, StageResult)],
    scope: Scope,
) -> Vec<RankCandidate<'a>> {
    results
        .iter()
        .map(|(team, result)| RankCandidate {
            team_id: &team.id,
            partition: Partition::for_team(scope, team.cluster_id.as_deref()),
            authoritative: result,
        })
        .collect()
}

/// Build the board rows for every team of `competition`, in snapshot order.
pub fn build_board(competition: &Competition, scope: Scope, overlay: &EditOverlay) -> Vec<BoardRow> {
    let results = authoritative_results(competition.teams.values(), scope);
    let candidates = rank_candidates(&results, scope);
    let targets = compute_ranks(&candidates, overlay);

    results
        .iter()
        .map(|(team, authoritative)| {
            let result = overlay.resolve(&team.id, authoritative);
            let medal = classify(Some(result.score), &result.medal);
            let promotion = match scope {
                Scope::Cluster if result.is_absent() => Some(StageStatus::None),
                Scope::Cluster => Some(promote(&result.rank, &result.flag)),
                Scope::Area => None,
            };

            BoardRow {
                team_id: team.id.clone(),
                team_name: team.name.clone(),
                school_name: competition
                    .school_name(&team.school_id)
                    .unwrap_or_default()
                    .to_string(),
                cluster_name: team
                    .cluster_id
                    .as_deref()
                    .and_then(|cluster| competition.cluster_name(cluster))
                    .map(str::to_string),
                cluster_id: team.cluster_id.clone(),
                medal,
                dirty: overlay.is_dirty(&team.id),
                computed_rank: targets.get(&team.id).copied(),
                promotion,
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        overlay::FieldChange,
        team::{ClusterResult, FLAG_TRUE, StageInfo},
    };

    fn team(id: &str, cluster: &str, score: f64, rank: &str, flag: &str) -> Team {
        Team {
            id: id.into(),
            activity_id: "a1".into(),
            school_id: "s1".into(),
            name: format!("Team {id}"),
            cluster_id: Some(cluster.into()),
            cluster: ClusterResult {
                score,
                rank: rank.into(),
                flag: flag.into(),
                ..ClusterResult::default()
            },
            area: StageInfo::default(),
        }
    }

    fn competition() -> Competition {
        let mut competition = Competition::default();
        for team in [
            team("t1", "c1", 85.0, "1", FLAG_TRUE),
            team("t2", "c1", 72.0, "", ""),
            team("t3", "c1", -1.0, "", ""),
            team("t4", "c1", 0.0, "", ""),
        ] {
            competition.teams.insert(team.id.clone(), team);
        }
        competition
    }

    #[test]
    fn board_resolves_edits_and_derives_medals() {
        let competition = competition();
        let mut overlay = EditOverlay::new();
        let authoritative = competition.teams["t2"].result(Scope::Cluster);
        overlay.set("t2", FieldChange::Score(91.0), &authoritative);

        let rows = build_board(&competition, Scope::Cluster, &overlay);

        assert_eq!(rows[1].result.score, 91.0);
        assert_eq!(rows[1].medal, Medal::Gold);
        assert!(rows[1].dirty);
        assert_eq!(rows[1].computed_rank, Some(RankTarget::Ranked(1)));
        assert_eq!(rows[0].computed_rank, Some(RankTarget::Ranked(2)));
        assert_eq!(rows[2].medal, Medal::DidNotParticipate);
        assert_eq!(rows[2].computed_rank, Some(RankTarget::Cleared));
        assert_eq!(rows[3].medal, Medal::NotScored);
        assert_eq!(rows[3].computed_rank, None);
    }

    #[test]
    fn cluster_rows_preview_promotion() {
        let rows = build_board(&competition(), Scope::Cluster, &EditOverlay::new());
        assert_eq!(rows[0].promotion, Some(StageStatus::Area));
        assert_eq!(rows[1].promotion, Some(StageStatus::None));

        let area_rows = build_board(&competition(), Scope::Area, &EditOverlay::new());
        assert!(area_rows.iter().all(|row| row.promotion.is_none()));
    }
}
