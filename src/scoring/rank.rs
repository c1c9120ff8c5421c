//! Standard competition ranking of teams within their partition.
//!
//! Teams are partitioned per cluster in the cluster stage and as a single group in
//! the area stage. Unscored teams (`0`) are left alone, absent teams (`-1`) have
//! their rank cleared, and everyone else is ranked by descending score with ties
//! sharing a rank and the following score skipping ahead (`90, 90, 80` ranks
//! `1, 1, 3`).

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;

use crate::scoring::{
    overlay::{EditOverlay, FieldChange},
    team::{Scope, StageResult, TeamId, UNSCORED},
};

/// Group of teams ranked against each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    /// Every team of the area stage.
    Stage,
    /// Teams of one cluster.
    Cluster(String),
    /// Cluster-stage teams whose cluster could not be resolved.
    Unclustered,
}

impl Partition {
    pub fn for_team(scope: Scope, cluster_id: Option<&str>) -> Self {
        match (scope, cluster_id) {
            (Scope::Area, _) => Partition::Stage,
            (Scope::Cluster, Some(cluster)) if !cluster.trim().is_empty() => {
                Partition::Cluster(cluster.to_string())
            }
            (Scope::Cluster, _) => Partition::Unclustered,
        }
    }
}

/// Rank a team should hold after ranking its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTarget {
    Ranked(u32),
    /// Absent teams never hold a rank.
    Cleared,
}

impl fmt::Display for RankTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankTarget::Ranked(rank) => write!(f, "{rank}"),
            RankTarget::Cleared => Ok(()),
        }
    }
}

/// A team submitted for ranking.
#[derive(Debug, Clone)]
pub struct RankCandidate<'a> {
    pub team_id: &'a str,
    pub partition: Partition,
    pub authoritative: &'a StageResult,
}

/// Compute rank targets for every rankable candidate.
///
/// Unscored candidates have no entry in the result.
pub fn compute_ranks(
    candidates: &[RankCandidate<'_>],
    overlay: &EditOverlay,
) -> IndexMap<TeamId, RankTarget> {
    let mut partitions: BTreeMap<&Partition, Vec<(&str, f64)>> = BTreeMap::new();
    let mut targets = IndexMap::new();

    for candidate in candidates {
        let resolved = overlay.resolve(candidate.team_id, candidate.authoritative);
        if resolved.is_absent() {
            targets.insert(candidate.team_id.to_string(), RankTarget::Cleared);
        } else if resolved.score.is_finite() && resolved.score > UNSCORED {
            partitions
                .entry(&candidate.partition)
                .or_default()
                .push((candidate.team_id, resolved.score));
        }
    }

    for (_, mut scored) in partitions {
        scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        let mut previous: Option<(f64, u32)> = None;
        for (position, (team_id, score)) in scored.into_iter().enumerate() {
            let rank = match previous {
                Some((previous_score, previous_rank)) if previous_score == score => previous_rank,
                _ => position as u32 + 1,
            };
            previous = Some((score, rank));
            targets.insert(team_id.to_string(), RankTarget::Ranked(rank));
        }
    }

    targets
}

/// Write computed ranks into the overlay, returning how many edits were written.
///
/// A rank equal to the team's current rank (the pending edit's when there is one,
/// the stored one otherwise) is left alone, so running this twice without score
/// changes writes nothing the second time.
pub fn auto_rank(candidates: &[RankCandidate<'_>], overlay: &mut EditOverlay) -> usize {
    let targets = compute_ranks(candidates, overlay);
    let mut written = 0;

    for candidate in candidates {
        let Some(target) = targets.get(candidate.team_id) else {
            continue;
        };
        let rank = target.to_string();

        let current = overlay
            .get(candidate.team_id)
            .map_or(&candidate.authoritative.rank, |edit| &edit.rank);
        if *current == rank {
            continue;
        }

        overlay.set(
            candidate.team_id,
            FieldChange::Rank(rank),
            candidate.authoritative,
        );
        written += 1;
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(score: f64) -> StageResult {
        StageResult {
            score,
            ..StageResult::default()
        }
    }

    fn candidates<'a>(
        ids: &'a [&'a str],
        results: &'a [StageResult],
        partition: impl Fn(usize) -> Partition,
    ) -> Vec<RankCandidate<'a>> {
        ids.iter()
            .zip(results)
            .enumerate()
            .map(|(index, (id, result))| RankCandidate {
                team_id: *id,
                partition: partition(index),
                authoritative: result,
            })
            .collect()
    }

    #[test]
    fn ties_share_rank_and_skip_the_next() {
        let ids = ["a", "b", "c", "d"];
        let results = [stored(90.0), stored(90.0), stored(80.0), stored(70.0)];
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let ranks = compute_ranks(&input, &EditOverlay::new());
        let ranks: Vec<_> = ids.iter().map(|id| ranks[*id]).collect();
        assert_eq!(
            ranks,
            vec![
                RankTarget::Ranked(1),
                RankTarget::Ranked(1),
                RankTarget::Ranked(3),
                RankTarget::Ranked(4)
            ]
        );
    }

    #[test]
    fn absent_teams_are_cleared_and_not_ranked() {
        let ids = ["a", "b", "c", "d"];
        let results = [stored(-1.0), stored(0.0), stored(55.0), stored(0.0)];
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let ranks = compute_ranks(&input, &EditOverlay::new());
        assert_eq!(ranks.get("a"), Some(&RankTarget::Cleared));
        assert_eq!(ranks.get("b"), None);
        assert_eq!(ranks.get("c"), Some(&RankTarget::Ranked(1)));
        assert_eq!(ranks.get("d"), None);
    }

    #[test]
    fn clusters_are_ranked_independently() {
        let ids = ["a", "b", "c", "d", "e"];
        let results = [
            stored(50.0),
            stored(70.0),
            stored(90.0),
            stored(60.0),
            stored(99.0),
        ];
        let input = candidates(&ids, &results, |index| match index {
            0 | 1 => Partition::for_team(Scope::Cluster, Some("north")),
            2 | 3 => Partition::for_team(Scope::Cluster, Some("south")),
            _ => Partition::for_team(Scope::Cluster, None),
        });

        let ranks = compute_ranks(&input, &EditOverlay::new());
        assert_eq!(ranks["a"], RankTarget::Ranked(2));
        assert_eq!(ranks["b"], RankTarget::Ranked(1));
        assert_eq!(ranks["c"], RankTarget::Ranked(1));
        assert_eq!(ranks["d"], RankTarget::Ranked(2));
        assert_eq!(ranks["e"], RankTarget::Ranked(1));
    }

    #[test]
    fn area_scope_uses_a_single_partition() {
        assert_eq!(
            Partition::for_team(Scope::Area, Some("north")),
            Partition::Stage
        );
        assert_eq!(
            Partition::for_team(Scope::Cluster, Some(" ")),
            Partition::Unclustered
        );
    }

    #[test]
    fn edited_scores_take_precedence() {
        let ids = ["a", "b"];
        let results = [stored(90.0), stored(80.0)];
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let mut overlay = EditOverlay::new();
        overlay.set("b", FieldChange::Score(95.0), &results[1]);

        let ranks = compute_ranks(&input, &overlay);
        assert_eq!(ranks["a"], RankTarget::Ranked(2));
        assert_eq!(ranks["b"], RankTarget::Ranked(1));
    }

    #[test]
    fn auto_rank_is_idempotent() {
        let ids = ["a", "b", "c"];
        let results = [stored(70.0), stored(85.0), stored(-1.0)];
        let mut results = results.to_vec();
        results[2].rank = "3".into();
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let mut overlay = EditOverlay::new();
        assert_eq!(auto_rank(&input, &mut overlay), 3);
        assert_eq!(overlay.get("a").unwrap().rank, "2");
        assert_eq!(overlay.get("b").unwrap().rank, "1");
        assert_eq!(overlay.get("c").unwrap().rank, "");

        let dirty_before = overlay.dirty_ids();
        assert_eq!(auto_rank(&input, &mut overlay), 0);
        assert_eq!(overlay.dirty_ids(), dirty_before);
    }

    #[test]
    fn auto_rank_skips_ranks_already_stored() {
        let ids = ["a", "b"];
        let mut results = vec![stored(90.0), stored(80.0)];
        results[0].rank = "1".into();
        results[1].rank = "2".into();
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let mut overlay = EditOverlay::new();
        assert_eq!(auto_rank(&input, &mut overlay), 0);
        assert!(overlay.is_empty());
    }

    #[test]
    fn auto_rank_overwrites_stale_edit_rank() {
        let ids = ["a", "b"];
        let mut results = vec![stored(90.0), stored(80.0)];
        results[0].rank = "1".into();
        results[1].rank = "2".into();
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let mut overlay = EditOverlay::new();
        overlay.set("b", FieldChange::Score(95.0), &results[1]);

        assert_eq!(auto_rank(&input, &mut overlay), 2);
        assert_eq!(overlay.resolve("a", &results[0]).rank, "2");
        assert_eq!(overlay.resolve("b", &results[1]).rank, "1");
        assert_eq!(auto_rank(&input, &mut overlay), 0);
    }

    #[test]
    fn auto_rank_restores_stored_ranks_after_a_score_is_reverted() {
        let ids = ["a", "b"];
        let mut results = vec![stored(90.0), stored(80.0)];
        results[0].rank = "1".into();
        results[1].rank = "2".into();
        let input = candidates(&ids, &results, |_| Partition::Stage);

        let mut overlay = EditOverlay::new();
        overlay.set("b", FieldChange::Score(95.0), &results[1]);
        assert_eq!(auto_rank(&input, &mut overlay), 2);
        assert_eq!(overlay.resolve("a", &results[0]).rank, "2");
        assert_eq!(overlay.resolve("b", &results[1]).rank, "1");

        overlay.set("b", FieldChange::Score(70.0), &results[1]);
        assert_eq!(auto_rank(&input, &mut overlay), 2);
        assert_eq!(overlay.resolve("a", &results[0]).rank, "1");
        assert_eq!(overlay.resolve("b", &results[1]).rank, "2");
        assert_eq!(auto_rank(&input, &mut overlay), 0);
    }
}
