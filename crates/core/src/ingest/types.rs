use crate::domain::ranking::Movement;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A ranking document as persisted: `data` is either a bare entry array, `{rankings: [...]}`
/// or `{period, rankings: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRanking {
    pub period: String,
    #[serde(default)]
    pub algorithm_version: Option<String>,
    pub data: Value,
}

/// Entry as found in stored documents, before legacy fields are reconciled.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRankingEntry {
    #[serde(default)]
    pub tool_id: Option<Value>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_slug: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub rank: Option<i32>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub movement: Option<Movement>,
}
