//! Promotion of cluster winners into the area stage.

use crate::scoring::team::FLAG_TRUE;

/// Rank a team must hold in its cluster to be promoted.
pub const PROMOTED_RANK: &str = "1";

/// Stage a team has been promoted to, as stored in `stageStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    /// Not promoted.
    #[default]
    None,
    /// Eligible for the area stage.
    Area,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::None => "",
            StageStatus::Area => "Area",
        }
    }

    /// Parse a stored value; anything other than `Area` means not promoted.
    pub fn parse(value: &str) -> Self {
        if value.trim() == StageStatus::Area.as_str() {
            StageStatus::Area
        } else {
            StageStatus::None
        }
    }
}

/// Decide the stage status written alongside a cluster result.
pub fn promote(rank: &str, flag: &str) -> StageStatus {
    if rank == PROMOTED_RANK && flag == FLAG_TRUE {
        StageStatus::Area
    } else {
        StageStatus::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_with_flag_is_promoted() {
        assert_eq!(promote("1", "TRUE"), StageStatus::Area);
        assert_eq!(promote("1", "TRUE").as_str(), "Area");
    }

    #[test]
    fn every_other_combination_is_not_promoted() {
        for (rank, flag) in [
            ("1", ""),
            ("2", "TRUE"),
            ("", "TRUE"),
            ("", ""),
            ("1", "true"),
            ("01", "TRUE"),
            ("10", "TRUE"),
        ] {
            assert_eq!(promote(rank, flag), StageStatus::None, "{rank:?}/{flag:?}");
            assert_eq!(promote(rank, flag).as_str(), "");
        }
    }

    #[test]
    fn parse_recognises_area_only() {
        assert_eq!(StageStatus::parse("Area"), StageStatus::Area);
        assert_eq!(StageStatus::parse(" Area "), StageStatus::Area);
        assert_eq!(StageStatus::parse(""), StageStatus::None);
        assert_eq!(StageStatus::parse("Cluster"), StageStatus::None);
    }
}
