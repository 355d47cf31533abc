use anyhow::Context;
use rankings_core::domain::ranking::RankingPeriod;
use rankings_core::ingest::normalize_stored_ranking;
use rankings_core::ingest::types::StoredRanking;
use serde_json::Value;
use std::path::Path;

const DEFAULT_ALGORITHM_VERSION: &str = "v1.0";

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub period: Option<String>,
    pub algorithm_version: Option<String>,
}

pub fn read_document(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Validates a ranking document through the same normalizer the API reads with.
pub fn prepare_period(doc: Value, opts: &ImportOptions) -> anyhow::Result<RankingPeriod> {
    let doc_period = doc.get("period").and_then(Value::as_str).map(str::to_string);
    let doc_version = doc
        .get("algorithm_version")
        .and_then(Value::as_str)
        .map(str::to_string);

    let period = opts
        .period
        .clone()
        .or(doc_period)
        .context("ranking document has no period; pass --period")?;

    let algorithm_version = opts
        .algorithm_version
        .clone()
        .or(doc_version)
        .unwrap_or_else(|| DEFAULT_ALGORITHM_VERSION.to_string());

    let stored = StoredRanking {
        period: period.clone(),
        algorithm_version: Some(algorithm_version),
        data: doc,
    };

    normalize_stored_ranking(stored)
        .with_context(|| format!("ranking document for period={period} has no usable rankings"))
}

pub async fn import_period(
    pool: &sqlx::PgPool,
    period: &RankingPeriod,
    make_current: bool,
) -> anyhow::Result<uuid::Uuid> {
    let data = serde_json::to_value(period).context("serialize ranking period failed")?;
    let version = period
        .algorithm_version
        .as_deref()
        .unwrap_or(DEFAULT_ALGORITHM_VERSION);
    rankings_core::storage::rankings::upsert_period(
        pool,
        &period.period,
        version,
        data,
        make_current,
    )
    .await
}
