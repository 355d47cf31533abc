//! Reshapes a history of ranking snapshots into chart-ready series.
//!
//! Every tool in the latest period's top 10 is followed through its whole history, including
//! periods where it ranked below 10th, so its rise can be drawn as a connected line. Other tools
//! only contribute the periods in which they were top 10.

mod filter;

pub use filter::{filter_trending_data_by_time_range, TimeRange};

use crate::domain::ranking::{is_top10, RankingEntry, RankingPeriod};
use crate::domain::trending::{
    DateRange, TrendingAnalysisResult, TrendingDataPoint, TrendingMetadata, TrendingTool,
};
use crate::time::period::{format_period_date, parse_period_date};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

const TOP_N: usize = 10;

pub fn analyze_trending_data(periods: &[RankingPeriod]) -> TrendingAnalysisResult {
    if periods.is_empty() {
        return TrendingAnalysisResult::empty();
    }

    let sorted = sort_chronologically(periods);
    let last_idx = sorted.len() - 1;
    let current_top = current_top_ids(sorted[last_idx]);

    let mut tracker = ToolTracker::default();
    let mut chart_data = Vec::with_capacity(sorted.len());

    for (idx, period) in sorted.iter().enumerate() {
        let is_latest = idx == last_idx;
        let mut point =
            TrendingDataPoint::new(period.period.as_str(), format_period_date(&period.period));

        for (entry, position) in relevant_entries(period, &current_top) {
            point.positions.insert(entry.tool_id.clone(), Some(position));
            tracker.record(entry, position, &period.period, is_latest);
        }

        chart_data.push(point);
    }

    let tools = tracker.into_sorted();

    for point in &mut chart_data {
        for tool in &tools {
            point.positions.entry(tool.tool_id.clone()).or_insert(None);
        }
    }

    let date_range = DateRange {
        start: sorted[0].period.clone(),
        end: sorted[last_idx].period.clone(),
    };

    TrendingAnalysisResult {
        periods: sorted.iter().map(|p| p.period.clone()).collect(),
        metadata: TrendingMetadata {
            total_periods: periods.len(),
            date_range,
            top_tools_count: tools.len(),
        },
        tools,
        chart_data,
    }
}

/// Stable ascending sort by parsed period date. Unparsable periods go last, in input order.
fn sort_chronologically(periods: &[RankingPeriod]) -> Vec<&RankingPeriod> {
    let mut keyed: Vec<_> = periods
        .iter()
        .map(|p| (parse_period_date(&p.period), p))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, p)| p).collect()
}

fn top10_sorted(period: &RankingPeriod) -> Vec<(&RankingEntry, i32)> {
    let mut out: Vec<_> = period
        .rankings
        .iter()
        .map(|e| (e, e.resolved_position()))
        .filter(|(_, pos)| is_top10(*pos))
        .collect();
    out.sort_by_key(|(_, pos)| *pos);
    out
}

fn current_top_ids(latest: &RankingPeriod) -> HashSet<&str> {
    top10_sorted(latest)
        .into_iter()
        .take(TOP_N)
        .map(|(e, _)| e.tool_id.as_str())
        .collect()
}

/// Entries charted for one period: that period's top 10 plus every entry of a tool in the
/// current top-10 set, whatever its position there, ordered by position.
fn relevant_entries<'a>(
    period: &'a RankingPeriod,
    current_top: &HashSet<&str>,
) -> Vec<(&'a RankingEntry, i32)> {
    let mut out: Vec<_> = period
        .rankings
        .iter()
        .map(|e| (e, e.resolved_position()))
        .filter(|(e, pos)| is_top10(*pos) || current_top.contains(e.tool_id.as_str()))
        .collect();
    out.sort_by_key(|(_, pos)| *pos);
    out
}

/// Running per-tool aggregates, kept in first-sighting order.
#[derive(Debug, Default)]
struct ToolTracker {
    tools: Vec<TrendingTool>,
    index: HashMap<String, usize>,
}

impl ToolTracker {
    fn record(&mut self, entry: &RankingEntry, position: i32, period: &str, is_latest: bool) {
        let idx = match self.index.get(&entry.tool_id) {
            Some(&idx) => idx,
            None => {
                self.tools.push(TrendingTool {
                    tool_id: entry.tool_id.clone(),
                    tool_name: entry.tool_name.clone(),
                    periods_in_top10: 0,
                    first_appearance: period.to_string(),
                    last_appearance: period.to_string(),
                    best_position: position,
                    worst_position: position,
                    current_position: None,
                });
                self.index.insert(entry.tool_id.clone(), self.tools.len() - 1);
                self.tools.len() - 1
            }
        };

        let tool = &mut self.tools[idx];
        if is_top10(position) {
            tool.periods_in_top10 += 1;
        }
        tool.last_appearance = period.to_string();
        tool.best_position = tool.best_position.min(position);
        tool.worst_position = tool.worst_position.max(position);
        if is_latest {
            tool.current_position = Some(position);
        }
    }

    /// Currently ranked tools first by current position, then the rest by best position and
    /// descending top-10 count.
    fn into_sorted(self) -> Vec<TrendingTool> {
        let mut tools = self.tools;
        tools.sort_by(|a, b| match (a.current_position, b.current_position) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a
                .best_position
                .cmp(&b.best_position)
                .then_with(|| b.periods_in_top10.cmp(&a.periods_in_top10)),
        });
        tools
    }
}
