//! Record shapes exchanged with the record store.
//!
//! Stored documents are not always tidy: fields may be `null`, scores may be
//! numeric strings and the area result is a JSON blob inside a string. Everything
//! is normalised here so the engine only sees typed values.

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use tracing::warn;

use crate::scoring::{
    promote::StageStatus,
    snapshot::{Activity, Cluster, Competition, School},
    team::{ClusterResult, StageInfo, Team},
};

/// Activity record.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntity {
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
}

/// School record; `cluster_id` links it to its cluster.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchoolEntity {
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster_id: Option<String>,
}

/// Cluster record.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterEntity {
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
}

/// Team record with cluster-stage columns and the serialized area result.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamEntity {
    pub id: String,
    pub activity_id: String,
    pub school_id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub rank: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub medal_override: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub flag: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub stage_status: String,
    /// JSON blob holding `{score, rank, medal}` of the area stage.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub stage_info: String,
}

/// Fields written together by a cluster-stage update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterResultEntity {
    pub score: f64,
    pub rank: String,
    pub medal: String,
    pub flag: String,
    pub stage_status: String,
}

/// Area-stage result, serialized into [`TeamEntity::stage_info`].
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StageInfoEntity {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: f64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub rank: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub medal: String,
}

/// Full read snapshot returned by a record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotEntity {
    #[serde(default)]
    pub activities: Vec<ActivityEntity>,
    #[serde(default)]
    pub teams: Vec<TeamEntity>,
    #[serde(default)]
    pub schools: Vec<SchoolEntity>,
    #[serde(default)]
    pub clusters: Vec<ClusterEntity>,
}

impl TeamEntity {
    /// Overwrite the cluster-stage columns, leaving the area blob alone.
    pub fn apply_cluster_result(&mut self, result: &ClusterResultEntity) {
        self.score = result.score;
        self.rank = result.rank.clone();
        self.medal_override = result.medal.clone();
        self.flag = result.flag.clone();
        self.stage_status = result.stage_status.clone();
    }

    /// Replace the area blob, leaving the cluster-stage columns alone.
    pub fn apply_area_result(&mut self, result: &StageInfoEntity) -> serde_json::Result<()> {
        self.stage_info = serde_json::to_string(result)?;
        Ok(())
    }
}

/// Decode a stored area blob; blank or malformed content is an empty result.
pub fn parse_stage_info(team_id: &str, raw: &str) -> StageInfoEntity {
    if raw.trim().is_empty() {
        return StageInfoEntity::default();
    }

    match serde_json::from_str::<Option<StageInfoEntity>>(raw) {
        Ok(info) => info.unwrap_or_default(),
        Err(err) => {
            warn!(team_id, error = %err, "malformed stage info; treating as empty area result");
            StageInfoEntity::default()
        }
    }
}

/// Accept numbers, numeric strings, blanks and `null` for score columns.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f64),
        Text(String),
    }

    let raw = Option::<RawScore>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawScore::Number(value)) if value.is_finite() => value,
        Some(RawScore::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .unwrap_or_default(),
        _ => 0.0,
    })
}

impl From<StageInfoEntity> for StageInfo {
    fn from(value: StageInfoEntity) -> Self {
        Self {
            score: value.score,
            rank: value.rank,
            medal: value.medal,
        }
    }
}

impl From<StageInfo> for StageInfoEntity {
    fn from(value: StageInfo) -> Self {
        Self {
            score: value.score,
            rank: value.rank,
            medal: value.medal,
        }
    }
}

impl From<ClusterResult> for ClusterResultEntity {
    fn from(value: ClusterResult) -> Self {
        Self {
            score: value.score,
            rank: value.rank,
            medal: value.medal_override,
            flag: value.flag,
            stage_status: value.stage_status.as_str().to_string(),
        }
    }
}

impl From<ActivityEntity> for Activity {
    fn from(value: ActivityEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<SchoolEntity> for School {
    fn from(value: SchoolEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            cluster_id: value.cluster_id,
        }
    }
}

impl From<ClusterEntity> for Cluster {
    fn from(value: ClusterEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<SnapshotEntity> for Competition {
    fn from(value: SnapshotEntity) -> Self {
        let mut competition = Competition {
            activities: value
                .activities
                .into_iter()
                .map(|activity| (activity.id.clone(), activity.into()))
                .collect(),
            schools: value
                .schools
                .into_iter()
                .map(|school| (school.id.clone(), school.into()))
                .collect(),
            clusters: value
                .clusters
                .into_iter()
                .map(|cluster| (cluster.id.clone(), cluster.into()))
                .collect(),
            ..Competition::default()
        };

        for entity in value.teams {
            let cluster_id = competition
                .cluster_of_school(&entity.school_id)
                .map(str::to_string);
            let area = parse_stage_info(&entity.id, &entity.stage_info).into();
            let team = Team {
                cluster_id,
                cluster: ClusterResult {
                    score: entity.score,
                    rank: entity.rank,
                    medal_override: entity.medal_override,
                    flag: entity.flag,
                    stage_status: StageStatus::parse(&entity.stage_status),
                },
                area,
                id: entity.id,
                activity_id: entity.activity_id,
                school_id: entity.school_id,
                name: entity.name,
            };
            competition.teams.insert(team.id.clone(), team);
        }

        competition
    }
}
