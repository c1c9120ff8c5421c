use mongodb::bson::{Document, doc};

use crate::dao::models::ClusterResultEntity;

pub const ACTIVITY_COLLECTION_NAME: &str = "activities";
pub const SCHOOL_COLLECTION_NAME: &str = "schools";
pub const CLUSTER_COLLECTION_NAME: &str = "clusters";
pub const TEAM_COLLECTION_NAME: &str = "teams";

/// Records are addressed by their own `id` field, not the driver's `_id`.
pub fn record_id(id: &str) -> Document {
    doc! { "id": id }
}

pub fn cluster_result_update(result: &ClusterResultEntity) -> Document {
    doc! {
        "$set": {
            "score": result.score,
            "rank": &result.rank,
            "medal_override": &result.medal,
            "flag": &result.flag,
            "stage_status": &result.stage_status,
        }
    }
}

pub fn stage_info_update(blob: &str) -> Document {
    doc! { "$set": { "stage_info": blob } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_update_never_touches_stage_info() {
        let update = cluster_result_update(&ClusterResultEntity {
            score: 64.5,
            rank: "3".into(),
            medal: String::new(),
            flag: "TRUE".into(),
            stage_status: String::new(),
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_f64("score").unwrap(), 64.5);
        assert_eq!(set.get_str("medal_override").unwrap(), "");
        assert!(!set.contains_key("stage_info"));
    }

    #[test]
    fn area_update_only_sets_the_blob() {
        let update = stage_info_update("{}");
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("stage_info").unwrap(), "{}");
    }
}
