use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tool rollup across every analyzed period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTool {
    pub tool_id: String,
    pub tool_name: String,
    pub periods_in_top10: u32,
    pub first_appearance: String,
    pub last_appearance: String,
    pub best_position: i32,
    pub worst_position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<i32>,
}

/// One chart row. Serialized flat: `{"period": .., "date": .., "<tool_id>": <position|null>, ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingDataPoint {
    pub period: String,
    pub date: String,
    #[serde(flatten)]
    pub positions: BTreeMap<String, Option<i32>>,
}

impl TrendingDataPoint {
    pub fn new(period: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            date: date.into(),
            positions: BTreeMap::new(),
        }
    }

    /// `None` when the tool has no key at all, `Some(None)` for an explicit gap.
    pub fn position(&self, tool_id: &str) -> Option<Option<i32>> {
        self.positions.get(tool_id).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingMetadata {
    pub total_periods: usize,
    pub date_range: DateRange,
    pub top_tools_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendingAnalysisResult {
    pub periods: Vec<String>,
    pub tools: Vec<TrendingTool>,
    pub chart_data: Vec<TrendingDataPoint>,
    pub metadata: TrendingMetadata,
}

impl TrendingAnalysisResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
