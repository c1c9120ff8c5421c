use indexmap::IndexMap;

use crate::scoring::team::{Scope, Team, TeamId};

/// Competition activity (a contest teams enter).
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub name: String,
}

/// School a team belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct School {
    pub id: String,
    pub name: String,
    pub cluster_id: Option<String>,
}

/// Cluster of schools competing together in the cluster stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: String,
    pub name: String,
}

/// In-memory read snapshot the engine operates on.
#[derive(Debug, Clone, Default)]
pub struct Competition {
    pub activities: IndexMap<String, Activity>,
    pub schools: IndexMap<String, School>,
    pub clusters: IndexMap<String, Cluster>,
    pub teams: IndexMap<TeamId, Team>,
}

impl Competition {
    pub fn activity_name(&self, activity_id: &str) -> Option<&str> {
        self.activities
            .get(activity_id)
            .map(|activity| activity.name.as_str())
    }

    pub fn school_name(&self, school_id: &str) -> Option<&str> {
        self.schools.get(school_id).map(|school| school.name.as_str())
    }

    pub fn cluster_name(&self, cluster_id: &str) -> Option<&str> {
        self.clusters
            .get(cluster_id)
            .map(|cluster| cluster.name.as_str())
    }

    /// Cluster of a school, `None` when the school or its cluster is unknown.
    pub fn cluster_of_school(&self, school_id: &str) -> Option<&str> {
        self.schools
            .get(school_id)
            .and_then(|school| school.cluster_id.as_deref())
            .filter(|cluster| !cluster.trim().is_empty())
    }

    /// Teams shown on a screen for the given activity, scope and optional cluster.
    ///
    /// Area screens only list teams promoted out of their cluster.
    pub fn visible_teams<'a>(
        &'a self,
        activity_id: &'a str,
        scope: Scope,
        cluster_filter: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Team> + 'a {
        self.teams.values().filter(move |team| {
            team.activity_id == activity_id
                && cluster_filter.is_none_or(|cluster| team.cluster_id.as_deref() == Some(cluster))
                && (scope == Scope::Cluster || team.is_area_eligible())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        promote::StageStatus,
        team::{ClusterResult, StageInfo},
    };

    fn team(id: &str, activity: &str, cluster: Option<&str>, promoted: bool) -> Team {
        Team {
            id: id.into(),
            activity_id: activity.into(),
            school_id: format!("school-{id}"),
            name: format!("Team {id}"),
            cluster_id: cluster.map(Into::into),
            cluster: ClusterResult {
                stage_status: if promoted {
                    StageStatus::Area
                } else {
                    StageStatus::None
                },
                ..ClusterResult::default()
            },
            area: StageInfo::default(),
        }
    }

    fn competition() -> Competition {
        let mut competition = Competition::default();
        for team in [
            team("t1", "robotics", Some("north"), true),
            team("t2", "robotics", Some("south"), false),
            team("t3", "robotics", None, false),
            team("t4", "spelling", Some("north"), true),
        ] {
            competition.teams.insert(team.id.clone(), team);
        }
        competition
    }

    fn ids<'a>(teams: impl Iterator<Item = &'a Team>) -> Vec<&'a str> {
        teams.map(|team| team.id.as_str()).collect()
    }

    #[test]
    fn cluster_scope_lists_activity_teams() {
        let competition = competition();
        assert_eq!(
            ids(competition.visible_teams("robotics", Scope::Cluster, None)),
            vec!["t1", "t2", "t3"]
        );
        assert_eq!(
            ids(competition.visible_teams("robotics", Scope::Cluster, Some("south"))),
            vec!["t2"]
        );
    }

    #[test]
    fn area_scope_lists_promoted_teams_only() {
        let competition = competition();
        assert_eq!(
            ids(competition.visible_teams("robotics", Scope::Area, None)),
            vec!["t1"]
        );
    }

    #[test]
    fn blank_school_cluster_is_unresolved() {
        let mut competition = competition();
        competition.schools.insert(
            "s1".into(),
            School {
                id: "s1".into(),
                name: "Hill School".into(),
                cluster_id: Some(String::new()),
            },
        );
        assert_eq!(competition.cluster_of_school("s1"), None);
        assert_eq!(competition.cluster_of_school("missing"), None);
        assert_eq!(competition.school_name("s1"), Some("Hill School"));
    }
}
