use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ACTIVITY_PREFIX: &str = "activity::";
pub const SCHOOL_PREFIX: &str = "school::";
pub const CLUSTER_PREFIX: &str = "cluster::";
pub const TEAM_PREFIX: &str = "team::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A CouchDB document wrapping one record body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

pub fn team_doc_id(team_id: &str) -> String {
    format!("{TEAM_PREFIX}{team_id}")
}
