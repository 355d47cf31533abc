use crate::domain::ranking::{RankingEntry, RankingPeriod};
use crate::ingest::types::{RawRankingEntry, StoredRanking};
use crate::time::period::parse_period_date;
use serde_json::Value;
use std::collections::HashSet;

// Chart rows use these as fixed keys next to the per-tool ones.
const RESERVED_TOOL_IDS: [&str; 2] = ["period", "date"];

/// Converts one stored document into a `RankingPeriod`. Returns `None` (and logs why) for
/// documents that cannot be charted.
pub fn normalize_stored_ranking(stored: StoredRanking) -> Option<RankingPeriod> {
    let period = stored.period.trim().to_string();
    if parse_period_date(&period).is_none() {
        tracing::warn!(period = %stored.period, "skipping ranking document: period is not a date");
        return None;
    }

    let Some(raw_entries) = extract_rankings(stored.data) else {
        tracing::warn!(%period, "skipping ranking document: invalid data structure");
        return None;
    };

    if raw_entries.is_empty() {
        tracing::warn!(%period, "skipping ranking document: no rankings array found");
        return None;
    }

    let mut seen = HashSet::new();
    let mut rankings = Vec::with_capacity(raw_entries.len());
    for (idx, raw) in raw_entries.into_iter().enumerate() {
        let Some(entry) = normalize_entry(&period, idx, raw) else {
            continue;
        };
        if !seen.insert(entry.tool_id.clone()) {
            tracing::warn!(%period, tool_id = %entry.tool_id, "skipping duplicate tool entry");
            continue;
        }
        rankings.push(entry);
    }

    if rankings.is_empty() {
        tracing::warn!(%period, "skipping ranking document: no usable entries");
        return None;
    }

    Some(RankingPeriod {
        period,
        rankings,
        algorithm_version: stored.algorithm_version,
    })
}

/// Normalizes a batch; bad documents are dropped, never fatal.
pub fn normalize_all(stored: Vec<StoredRanking>) -> Vec<RankingPeriod> {
    let total = stored.len();
    let out: Vec<_> = stored
        .into_iter()
        .filter_map(normalize_stored_ranking)
        .collect();
    if out.len() != total {
        tracing::info!(total, kept = out.len(), "normalized ranking documents");
    }
    out
}

fn extract_rankings(data: Value) -> Option<Vec<Value>> {
    match data {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("rankings") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn normalize_entry(period: &str, idx: usize, value: Value) -> Option<RankingEntry> {
    let raw = match serde_json::from_value::<RawRankingEntry>(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(%period, idx, error = %e, "skipping malformed ranking entry");
            return None;
        }
    };

    let Some(tool_id) = raw.tool_id.as_ref().and_then(tool_id_string) else {
        tracing::warn!(%period, idx, "skipping ranking entry without tool_id");
        return None;
    };

    if RESERVED_TOOL_IDS.contains(&tool_id.as_str()) {
        tracing::warn!(%period, %tool_id, "skipping ranking entry with reserved tool_id");
        return None;
    }

    let tool_name = [raw.tool_name, raw.tool_slug]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| tool_id.clone());

    let position = raw
        .position
        .filter(|p| *p != 0)
        .or(raw.rank.filter(|r| *r != 0));

    Some(RankingEntry {
        tool_id,
        tool_name,
        position,
        rank: raw.rank,
        score: raw.score.unwrap_or(0.0),
        movement: raw.movement,
    })
}

fn tool_id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::MovementDirection;
    use serde_json::json;

    fn stored(period: &str, data: Value) -> StoredRanking {
        StoredRanking {
            period: period.to_string(),
            algorithm_version: Some("v7.3".to_string()),
            data,
        }
    }

    #[test]
    fn accepts_all_three_document_shapes() {
        let entries = json!([{"tool_id": "a", "tool_name": "Alpha", "position": 1, "score": 9.5}]);

        let bare = normalize_stored_ranking(stored("2025-01", entries.clone())).unwrap();
        let nested =
            normalize_stored_ranking(stored("2025-01", json!({"rankings": entries.clone()})))
                .unwrap();
        let full = normalize_stored_ranking(stored(
            "2025-01",
            json!({"period": "2025-01", "rankings": entries}),
        ))
        .unwrap();

        assert_eq!(bare, nested);
        assert_eq!(nested, full);
        assert_eq!(bare.rankings[0].resolved_position(), 1);
        assert_eq!(bare.algorithm_version.as_deref(), Some("v7.3"));
    }

    #[test]
    fn rejects_unknown_shapes_and_empty_rankings() {
        assert!(normalize_stored_ranking(stored("2025-01", json!({"items": []}))).is_none());
        assert!(normalize_stored_ranking(stored("2025-01", json!("nope"))).is_none());
        assert!(normalize_stored_ranking(stored("2025-01", json!(null))).is_none());
        assert!(normalize_stored_ranking(stored("2025-01", json!([]))).is_none());
    }

    #[test]
    fn rejects_non_date_period_ids() {
        let data = json!([{"tool_id": "a", "position": 1}]);
        assert!(normalize_stored_ranking(stored("latest", data)).is_none());
    }

    #[test]
    fn reconciles_legacy_fields() {
        let data = json!([
            {"tool_id": 42, "tool_slug": "claude-code", "rank": 2, "score": 88},
            {"tool_id": "b", "position": 0, "rank": 5},
            {"tool_id": "c"}
        ]);
        let period = normalize_stored_ranking(stored("2025-09", data)).unwrap();

        let first = &period.rankings[0];
        assert_eq!(first.tool_id, "42");
        assert_eq!(first.tool_name, "claude-code");
        assert_eq!(first.position, Some(2));
        assert_eq!(first.score, 88.0);

        assert_eq!(period.rankings[1].position, Some(5));
        assert_eq!(period.rankings[1].tool_name, "b");

        let unranked = &period.rankings[2];
        assert_eq!(unranked.resolved_position(), 0);
        assert_eq!(unranked.score, 0.0);
    }

    #[test]
    fn skips_bad_and_duplicate_entries_but_keeps_document() {
        let data = json!({"rankings": [
            {"tool_id": "a", "position": 1},
            {"tool_id": "a", "position": 2},
            {"tool_name": "no id", "position": 3},
            {"tool_id": "date", "position": 4},
            {"tool_id": "x", "position": "first"},
            {"tool_id": "b", "position": 5, "movement": {"previous_position": 7, "change": 2, "direction": "up"}}
        ]});
        let period = normalize_stored_ranking(stored("2025-09-01", data)).unwrap();

        let ids: Vec<_> = period.rankings.iter().map(|e| e.tool_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(period.rankings[0].position, Some(1));
        let movement = period.rankings[1].movement.as_ref().unwrap();
        assert_eq!(movement.direction, Some(MovementDirection::Up));
        assert_eq!(movement.previous_position, Some(7));
    }

    #[test]
    fn batch_normalization_drops_bad_documents() {
        let docs = vec![
            stored("2025-01", json!([{"tool_id": "a", "position": 1}])),
            stored("2025-02", json!({"oops": true})),
            stored("2025-03", json!([{"tool_id": "a", "position": 2}])),
        ];
        let periods = normalize_all(docs);
        let ids: Vec<_> = periods.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(ids, vec!["2025-01", "2025-03"]);
    }
}
