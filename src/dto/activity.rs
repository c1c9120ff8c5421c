use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::format_timestamp,
    scoring::{activity::ActivityEntry, team::Scope},
};

/// Recent-activity entry describing one saved score.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityEntryDto {
    /// RFC 3339 timestamp of the save.
    pub logged_at: String,
    pub team_id: String,
    pub team_name: String,
    pub school_name: String,
    pub activity_name: String,
    pub scope: Scope,
    pub score: f64,
    /// Human readable summary line.
    pub message: String,
}

impl From<ActivityEntry> for ActivityEntryDto {
    fn from(value: ActivityEntry) -> Self {
        let message = format!(
            "{} ({}) scored {} in {} [{}]",
            value.team_name,
            value.school_name,
            value.score,
            value.activity_name,
            value.scope.as_str()
        );
        Self {
            logged_at: format_timestamp(value.logged_at),
            team_id: value.team_id,
            team_name: value.team_name,
            school_name: value.school_name,
            activity_name: value.activity_name,
            scope: value.scope,
            score: value.score,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    #[test]
    fn entry_carries_rfc3339_timestamp_and_summary() {
        let dto = ActivityEntryDto::from(ActivityEntry {
            logged_at: OffsetDateTime::UNIX_EPOCH,
            team_id: "t1".into(),
            team_name: "Robo Owls".into(),
            school_name: "Hill School".into(),
            activity_name: "Robotics".into(),
            scope: Scope::Area,
            score: 82.5,
        });

        assert_eq!(dto.logged_at, "1970-01-01T00:00:00Z");
        assert_eq!(dto.message, "Robo Owls (Hill School) scored 82.5 in Robotics [area]");
    }
}
