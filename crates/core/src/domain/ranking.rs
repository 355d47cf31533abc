use serde::{Deserialize, Serialize};

/// One reporting period's complete ranking snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPeriod {
    pub period: String,
    pub rankings: Vec<RankingEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub tool_id: String,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
}

impl RankingEntry {
    /// Effective position: `position`, then `rank`, then 0 (unranked this period).
    pub fn resolved_position(&self) -> i32 {
        self.position
            .filter(|p| *p != 0)
            .or(self.rank.filter(|r| *r != 0))
            .unwrap_or(0)
    }
}

pub fn is_top10(position: i32) -> bool {
    (1..=10).contains(&position)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<MovementDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    Up,
    Down,
    Stable,
    New,
}
