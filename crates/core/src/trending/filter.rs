use crate::domain::trending::{DateRange, TrendingAnalysisResult, TrendingMetadata};
use crate::time::period::parse_period_date;
use chrono::{Months, NaiveDate};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    All,
    Months(u32),
}

impl TimeRange {
    /// Lenient query parsing: anything other than a positive integer means `All`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(s) if s != "all" => match s.parse::<u32>() {
                Ok(n) if n > 0 => TimeRange::Months(n),
                _ => TimeRange::All,
            },
            _ => TimeRange::All,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::All => f.write_str("all"),
            TimeRange::Months(n) => write!(f, "{n}"),
        }
    }
}

/// Keeps the chart points whose period falls within `range` months before `reference_date`,
/// and the tools that still have at least one value among them.
pub fn filter_trending_data_by_time_range(
    data: &TrendingAnalysisResult,
    range: TimeRange,
    reference_date: NaiveDate,
) -> TrendingAnalysisResult {
    let months = match range {
        TimeRange::All => return data.clone(),
        TimeRange::Months(n) => n,
    };

    let cutoff = reference_date
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN);

    let chart_data: Vec<_> = data
        .chart_data
        .iter()
        .filter(|point| parse_period_date(&point.period).is_some_and(|d| d >= cutoff))
        .cloned()
        .collect();

    let present: HashSet<&str> = chart_data
        .iter()
        .flat_map(|point| {
            point
                .positions
                .iter()
                .filter(|(_, pos)| pos.is_some())
                .map(|(id, _)| id.as_str())
        })
        .collect();

    let tools: Vec<_> = data
        .tools
        .iter()
        .filter(|t| present.contains(t.tool_id.as_str()))
        .cloned()
        .collect();

    let date_range = DateRange {
        start: chart_data.first().map(|p| p.period.clone()).unwrap_or_default(),
        end: chart_data.last().map(|p| p.period.clone()).unwrap_or_default(),
    };

    TrendingAnalysisResult {
        periods: chart_data.iter().map(|p| p.period.clone()).collect(),
        metadata: TrendingMetadata {
            total_periods: chart_data.len(),
            date_range,
            top_tools_count: tools.len(),
        },
        tools,
        chart_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::{RankingEntry, RankingPeriod};
    use crate::trending::analyze_trending_data;

    fn period(id: &str, ranked: &[(&str, i32)]) -> RankingPeriod {
        RankingPeriod {
            period: id.to_string(),
            rankings: ranked
                .iter()
                .map(|(tool_id, position)| RankingEntry {
                    tool_id: tool_id.to_string(),
                    tool_name: tool_id.to_string(),
                    position: Some(*position),
                    rank: None,
                    score: 1.0,
                    movement: None,
                })
                .collect(),
            algorithm_version: Some("v7.3".to_string()),
        }
    }

    fn sample() -> Vec<RankingPeriod> {
        vec![
            period("2025-01", &[("gone", 1), ("a", 2)]),
            period("2025-04", &[("a", 1), ("b", 2)]),
            period("2025-06", &[("a", 1), ("b", 3)]),
        ]
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    #[test]
    fn all_is_identity() {
        let full = analyze_trending_data(&sample());
        let filtered = filter_trending_data_by_time_range(&full, TimeRange::All, reference());
        assert_eq!(filtered, full);
    }

    #[test]
    fn keeps_recent_points_and_recomputes_metadata() {
        let full = analyze_trending_data(&sample());
        let filtered =
            filter_trending_data_by_time_range(&full, TimeRange::Months(3), reference());

        assert_eq!(filtered.periods, vec!["2025-04", "2025-06"]);
        assert_eq!(filtered.metadata.total_periods, 2);
        assert_eq!(filtered.metadata.date_range.start, "2025-04");
        assert_eq!(filtered.metadata.date_range.end, "2025-06");

        let ids: Vec<_> = filtered.tools.iter().map(|t| t.tool_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(filtered.metadata.top_tools_count, 2);
        // Summaries are carried over, not recomputed for the window.
        assert_eq!(filtered.tools[0].first_appearance, "2025-01");
    }

    #[test]
    fn cutoff_day_is_inclusive() {
        let full = analyze_trending_data(&sample());
        let on_boundary = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let filtered = filter_trending_data_by_time_range(&full, TimeRange::Months(3), on_boundary);
        assert_eq!(filtered.periods, vec!["2025-04", "2025-06"]);
    }

    #[test]
    fn window_before_all_data_is_empty() {
        let full = analyze_trending_data(&sample());
        let later = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let filtered = filter_trending_data_by_time_range(&full, TimeRange::Months(1), later);
        assert!(filtered.periods.is_empty());
        assert!(filtered.tools.is_empty());
        assert_eq!(filtered.metadata, TrendingMetadata::default());
    }

    #[test]
    fn parses_query_values() {
        assert_eq!(TimeRange::from_query(None), TimeRange::All);
        assert_eq!(TimeRange::from_query(Some("all")), TimeRange::All);
        assert_eq!(TimeRange::from_query(Some("6")), TimeRange::Months(6));
        assert_eq!(TimeRange::from_query(Some("0")), TimeRange::All);
        assert_eq!(TimeRange::from_query(Some("-2")), TimeRange::All);
        assert_eq!(TimeRange::from_query(Some("soon")), TimeRange::All);
        assert_eq!(TimeRange::Months(12).to_string(), "12");
        assert_eq!(TimeRange::All.to_string(), "all");
    }
}
